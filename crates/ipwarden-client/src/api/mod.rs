//! API endpoint modules.

mod firewall;

pub use firewall::FirewallApi;
