//! oVirt Engine Adapter
//!
//! Implements the inventory source port over the engine's REST API:
//! - SSO password-grant authentication
//! - TLS trust anchors loaded from a PEM directory
//! - Versioned DTOs for the engine's JSON schema

pub mod auth;
pub mod client;
pub mod dto;
pub mod tls;

pub use auth::AccessToken;
pub use client::{build_http_client, OvirtClient};
pub use tls::TrustAnchors;
