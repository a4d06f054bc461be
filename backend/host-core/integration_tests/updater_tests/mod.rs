mod updater;
