// Game server listing web client library

pub mod api;
pub mod cache;
pub mod calendar;
pub mod clock;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod request_coalescing;
pub mod server;
pub mod service;
pub mod version;

pub use error::{Result, WebclientError};
pub use service::{ServerDirectoryService, ServerEntry, ServerListing};
