//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! This crate provides production-ready implementations of the bridge traits
//! the recitation core needs on desktop:
//! - `HttpClient` using `reqwest`
//! - `ResourceBackend` using a SQLite database (the durable offline cache)
//! - `SettingsStore` using a SQLite-backed key-value store
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{default_data_dir, ReqwestHttpClient, SqliteResourceBackend};
//!
//! #[tokio::main]
//! async fn main() -> bridge_traits::error::Result<()> {
//!     let http_client = ReqwestHttpClient::new()?;
//!     let cache = SqliteResourceBackend::new(default_data_dir().join("cache.db")).await?;
//!
//!     // Use in core configuration
//!     Ok(())
//! }
//! ```

mod http;
mod paths;
mod resource_store;
mod settings;

pub use http::ReqwestHttpClient;
pub use paths::default_data_dir;
pub use resource_store::SqliteResourceBackend;
pub use settings::SqliteSettingsStore;
