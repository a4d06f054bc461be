mod bridge_access;
mod error;
mod logger;
