//! # OAuth Client
//!
//! A cross-platform OAuth 2.0 client for native applications: Authorization
//! Code with PKCE via a loopback redirect, the RFC 8628 Device Authorization
//! Grant, RFC 7591/7592 Dynamic Client Registration, and a declarative
//! "formula → script" layer that lets a caller describe a provider once and
//! execute any supported flow against it.
//!
//! ## What this crate provides
//!
//! - [`client::Client`]: binds a [`types::ProviderConfig`] to an HTTP
//!   transport, an optional browser launcher, and a [`token_store::TokenStore`]
//!   handle; drives the PKCE and device flows and refreshes tokens.
//! - [`registration::RegistrationClient`]: dynamic client registration CRUD.
//! - [`formula`]: binds a declarative provider descriptor to a concrete,
//!   executable script.
//!
//! ## What this crate does not do
//!
//! Platform-specific secret store backends, the HTTP transport, the
//! browser-launch helper, and logging are external collaborators reached
//! through the `bridge-traits` seam — this crate never assumes a concrete
//! implementation of any of them. It does not act as an authorization
//! server, does not support the Resource Owner Password Credentials or
//! Implicit grants, and does not validate ID token / OIDC semantics beyond
//! passing them through opaquely.

pub mod callback_server;
pub mod client;
pub mod crypto;
pub mod device;
pub mod error;
pub mod formula;
pub mod pkce;
pub mod refresh;
pub mod registration;
pub mod token_store;
pub mod types;

pub use client::{Client, ClientTimeouts};
pub use error::{AuthError, Result};
pub use registration::{ClientMetadata, RegistrationClient};
pub use token_store::TokenStore;
pub use types::{
    DeviceSession, FormulaDoc, FormulaEndpoints, FormulaMethod, PkceSession, ProviderConfig,
    RegistrationResponse, ResolvedScript, StorageKey, TokenRecord,
};
