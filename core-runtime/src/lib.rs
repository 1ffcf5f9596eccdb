//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure shared by the OAuth client:
//! - Logging and tracing infrastructure
//! - Configuration management
//!
//! ## Overview
//!
//! This crate contains the core runtime utilities that other crates in this
//! workspace depend on. It establishes the async runtime patterns and logging
//! conventions used throughout the system; `core-auth` builds its flow
//! engines and token store on top of it and `bridge-traits`.

pub mod config;
pub mod error;
pub mod logging;

pub use error::{Error, Result};
