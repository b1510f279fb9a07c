//! Property listing browser: client-side filtering, favorites and saved
//! searches over a catalog of listings held in a mock or remote store.

pub mod browse;
pub mod config;
pub mod error;
pub mod models;
pub mod session;
pub mod store;

pub use error::{CoreError, Result};
