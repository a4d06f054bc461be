//! Shared leaf types for rivulet.
//!
//! This crate contains the handful of pure data types that every layer of the
//! workspace agrees on. Nothing in here carries business logic - it is data
//! that can be passed between layers without pulling in their dependencies.
//!
//! ## Architecture
//!
//! - **common** (this crate): shared leaf types
//! - **host-core**: the privileged-side core (bridge, store, updater)
//! - **rivulet**: the application shell wiring everything together
//!
//! This layered architecture keeps concerns separated and makes testing easier.

pub mod error;

pub use error::error_location::ErrorLocation;
