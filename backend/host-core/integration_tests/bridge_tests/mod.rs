mod bridge;
mod events;
mod helpers;
