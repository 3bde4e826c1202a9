// rbwatch-api: Async Rust client for the RouterOS REST API.

pub mod client;
pub mod error;
pub mod record;
pub mod rest;
pub mod transport;

pub use client::RouterClient;
pub use error::Error;
pub use record::{Params, Record};
pub use rest::RestClient;
