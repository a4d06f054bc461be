mod deeplink;
mod environment;
mod modstate;
mod protocol;
mod store;
mod updater;
