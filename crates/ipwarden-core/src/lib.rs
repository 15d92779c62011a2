//! Core types and errors for ipwarden.
//!
//! This crate provides the foundational pieces shared by the client and the
//! sync service:
//!
//! - **Types**: Serde models of a Linode firewall rule set and the update payload
//! - **Errors**: The [`WardenError`] taxonomy and its [`ErrorKind`] classification
//!
//! # Example
//!
//! ```rust
//! use ipwarden_core::{FirewallRule, NetworkAddresses};
//!
//! let mut rule = FirewallRule::new("vpn-admin");
//! rule.addresses = NetworkAddresses::ipv4_only(["203.0.113.1/32"]);
//! assert!(rule.label_starts_with("vpn-"));
//! ```

mod error;
pub mod types;

pub use error::{ErrorKind, Result, WardenError};
pub use types::*;
