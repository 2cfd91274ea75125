//! # assoc-client
//!
//! REST backend client for assoc-console.
//!
//! This crate provides:
//! - [`HttpConsoleApi`], a reqwest implementation of [`assoc_core::ConsoleApi`]
//! - Bearer token storage (file-backed and in-memory)
//! - HTTP status classification into console errors
//!
//! # Example
//!
//! ```rust,no_run
//! use assoc_client::HttpConsoleApi;
//! use assoc_core::ConsoleApi;
//!
//! #[tokio::main]
//! async fn main() {
//!     let api = HttpConsoleApi::from_env().unwrap();
//!     let profile = api.fetch_profile().await.unwrap();
//!     println!("{:?}", profile.role_name());
//! }
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod token;

pub use config::ClientConfig;
pub use error::{to_console_error, ApiErrorCode};
pub use http::HttpConsoleApi;
pub use token::{token_store_from_config, FileTokenStore, MemoryTokenStore};
