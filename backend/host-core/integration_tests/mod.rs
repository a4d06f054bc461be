mod bridge_tests;
mod store_tests;
mod updater_tests;
