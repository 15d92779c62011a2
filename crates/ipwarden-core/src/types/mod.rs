mod address;
mod firewall;

pub use address::*;
pub use firewall::*;
