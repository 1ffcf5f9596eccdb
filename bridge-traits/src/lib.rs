//! # Host Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host platform.
//!
//! ## Overview
//!
//! This crate defines the contract between the core library and platform-specific
//! implementations. Each trait represents a capability that the core requires but
//! that must be implemented differently per platform (desktop, iOS, Android, web).
//!
//! ## Traits
//!
//! ### Networking
//! - [`HttpClient`](http::HttpClient) - Async HTTP operations with retry and cancellation
//! - [`Browser`](browser::Browser) - Opens a URL in the user's default browser
//!
//! ### Security & Storage
//! - [`SecureStore`](storage::SecureStore) - Credential persistence (Keychain/Keystore)
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//! - [`LoggerSink`](time::LoggerSink) - Forward structured logs to host logging
//!
//! ## Platform Requirements
//!
//! Each supported platform must ship concrete adapters for every required bridge trait.
//! Secret-store backends (OS keychains, encrypted files), the JSON codec, the HTTP
//! transport, and the browser launcher are all external collaborators from the core's
//! point of view — this crate only pins down the shape of the seam.
//!
//! ## Fail-Fast Strategy
//!
//! The core should fail fast with descriptive errors when a required capability is missing:
//!
//! ```ignore
//! use core_runtime::error::Error;
//!
//! pub fn new(config: AuthConfig) -> Result<Self> {
//!     let http_client = config.http_client
//!         .ok_or_else(|| Error::CapabilityMissing {
//!             capability: "HttpClient".to_string(),
//!             message: "No HTTP client implementation provided.".to_string(),
//!         })?;
//!     // ...
//! }
//! ```
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type for consistent
//! error handling. Platform implementations should:
//!
//! - Convert platform-specific errors to `BridgeError`
//! - Provide actionable error messages
//! - Never log or surface secret material (tokens, client secrets, code verifiers)
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` on native targets (relaxed on `wasm32`,
//! see [`platform`]) to support safe concurrent usage across async tasks.

pub mod browser;
pub mod error;
pub mod http;
pub mod platform;
pub mod storage;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use browser::{Browser, NoopBrowser};
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
pub use storage::SecureStore;
pub use time::{Clock, LogEntry, LogLevel, LoggerSink, SystemClock};
