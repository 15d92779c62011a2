//! HTTP clients for ipwarden's two remote collaborators.
//!
//! - [`LinodeClient`] talks to the Linode v4 firewall rules API
//! - [`IpLookup`] asks an "echo my IP" endpoint for the caller's public address

mod client;
mod config;
mod lookup;
pub mod api;

pub use client::{LinodeClient, LinodeClientBuilder};
pub use config::*;
pub use ipwarden_core::{Result, WardenError};
pub use lookup::{IpLookup, IpLookupBuilder};
