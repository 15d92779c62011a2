//! # ipwarden
//!
//! Keeps Linode firewall allow-list rules pinned to the operator's current
//! public IP address.
//!
//! ## Pieces
//!
//! - [`settings`]: per-pass configuration from `.env` and the environment
//! - [`provider`]: the address-discovery and firewall-provider seams
//! - [`reconcile`]: one discover → fetch → rewrite → push pass
//! - [`scheduler`]: a minimal recurring-task runner driving the pass

pub mod provider;
pub mod reconcile;
pub mod scheduler;
pub mod settings;

pub use ipwarden_core::{ErrorKind, Result, WardenError};
pub use reconcile::{PassOutcome, PassReport, Reconciler};
pub use scheduler::{RunningScheduler, ScheduledTask, Scheduler, TaskStatus, MAX_INTERVAL};
pub use settings::{ConfigSource, EnvSource, Settings};
