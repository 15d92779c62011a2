//! The IP-to-firewall reconciliation pass.
//!
//! A pass discovers the public address, fetches the firewall's rule set,
//! pins every inbound rule whose label starts with the configured prefix to
//! `<ip>/32`, and pushes the rule set back. Every failure is soft: it is
//! logged and the pass ends without touching remote state, leaving the next
//! scheduled tick to try again.

use crate::provider::{AddressSource, FirewallProvider};
use crate::scheduler::ScheduledTask;
use crate::settings::{ConfigSource, Settings};
use ipwarden_client::{IpLookup, LinodeClient};
use ipwarden_core::{ErrorKind, PublicIp, Result, WardenError};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Which firewall to rewrite, and which of its inbound rules
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncTarget {
    /// Target firewall
    pub firewall_id: u64,
    /// Inbound rules whose label starts with this are rewritten
    pub label_prefix: String,
}

impl From<&Settings> for SyncTarget {
    fn from(settings: &Settings) -> Self {
        Self {
            firewall_id: settings.firewall_id,
            label_prefix: settings.label_prefix.clone(),
        }
    }
}

/// A matching rule whose update call failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleFailure {
    /// Label of the rule
    pub label: String,
    /// Error reported by the provider
    pub message: String,
}

/// What one completed pass did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassReport {
    /// Address the matching rules were pinned to
    pub ip: PublicIp,
    /// Labels of inbound rules that matched the prefix, in rule order
    pub matched: Vec<String>,
    /// Labels whose update call succeeded
    pub updated: Vec<String>,
    /// Rules whose update call failed
    pub failed: Vec<RuleFailure>,
}

impl PassReport {
    fn new(ip: PublicIp) -> Self {
        Self {
            ip,
            matched: Vec::new(),
            updated: Vec::new(),
            failed: Vec::new(),
        }
    }

    /// True when every matching rule was updated
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Result of [`Reconciler::run_pass`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassOutcome {
    /// The pass ran to the end (individual rule updates may still have failed)
    Completed(PassReport),
    /// The pass stopped before any remote mutation
    Aborted {
        /// Classification of the error that stopped the pass
        kind: ErrorKind,
        /// Rendered error
        message: String,
    },
}

impl PassOutcome {
    /// Report of a completed pass
    #[must_use]
    pub const fn report(&self) -> Option<&PassReport> {
        match self {
            Self::Completed(report) => Some(report),
            Self::Aborted { .. } => None,
        }
    }

    /// Returns true if the pass ran to the end
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    /// Treat an aborted pass, or any failed rule update, as an error
    pub fn into_result(self) -> Result<PassReport> {
        match self {
            Self::Completed(report) if report.is_clean() => Ok(report),
            Self::Completed(report) => Err(WardenError::PartialUpdate {
                failed: report.failed.len(),
                matched: report.matched.len(),
            }),
            Self::Aborted { kind, message } => Err(WardenError::PassAborted { kind, message }),
        }
    }
}

/// Runs reconciliation passes against the real collaborators.
///
/// Settings are re-read from the [`ConfigSource`] on every pass.
#[derive(Debug)]
pub struct Reconciler<C> {
    config: C,
}

impl<C: ConfigSource> Reconciler<C> {
    /// Bind a reconciler to a configuration source
    pub const fn new(config: C) -> Self {
        Self { config }
    }

    /// Run one pass. Never fails; errors are logged and folded into the outcome.
    pub async fn run_pass(&self) -> PassOutcome {
        info!("starting reconciliation pass");

        match self.try_pass().await {
            Ok(report) => {
                info!(
                    ip = %report.ip,
                    matched = report.matched.len(),
                    updated = report.updated.len(),
                    failed = report.failed.len(),
                    "reconciliation pass complete"
                );
                PassOutcome::Completed(report)
            }
            Err(e) => {
                error!(kind = %e.kind(), error = %e, "reconciliation pass aborted");
                PassOutcome::Aborted {
                    kind: e.kind(),
                    message: e.to_string(),
                }
            }
        }
    }

    /// Run one pass, reporting an aborted or partial pass as an error
    pub async fn run_tick(&self) -> Result<()> {
        self.run_pass().await.into_result().map(|_| ())
    }

    async fn try_pass(&self) -> Result<PassReport> {
        let settings = Settings::load(&self.config)?;

        let lookup = IpLookup::builder()
            .url(&settings.lookup_url)
            .timeout(settings.request_timeout)
            .build()?;
        let client = LinodeClient::builder(settings.token.as_str())
            .base_url(&settings.api_url)
            .timeout(settings.request_timeout)
            .build()?;

        sync_rules(&SyncTarget::from(&settings), &lookup, &client).await
    }
}

impl<C: ConfigSource + 'static> Reconciler<C> {
    /// Recurring task running [`Reconciler::run_tick`] every `interval`
    pub fn into_task(self: Arc<Self>, name: impl Into<String>, interval: Duration) -> ScheduledTask {
        ScheduledTask::new(name, interval, move || {
            let reconciler = Arc::clone(&self);
            async move { reconciler.run_tick().await }
        })
    }
}

/// Discover the address, then pin and push every matching inbound rule.
///
/// One update call is made per matching rule, each carrying the full rule set
/// with all rewrites so far. A failed update is recorded and the remaining
/// rules are still attempted. No matching rules means no update calls.
pub async fn sync_rules(
    target: &SyncTarget,
    addresses: &dyn AddressSource,
    firewall: &dyn FirewallProvider,
) -> Result<PassReport> {
    let ip = addresses.current_ip().await?;
    info!(ip = %ip, "discovered public IP");

    let mut rules = firewall.rules(target.firewall_id).await?;
    let matching = rules.matching_inbound(&target.label_prefix);
    let mut report = PassReport::new(ip);

    if matching.is_empty() {
        info!(
            firewall = target.firewall_id,
            prefix = %target.label_prefix,
            "no inbound rules match label prefix"
        );
    }

    for index in matching {
        let Some(label) = rules.pin_inbound(index, &report.ip).map(str::to_owned) else {
            continue;
        };
        info!(rule = %label, "updating firewall rule");
        report.matched.push(label.clone());

        match firewall
            .update_rules(target.firewall_id, &rules.to_update())
            .await
        {
            Ok(_) => {
                info!(rule = %label, cidr = %report.ip.host_cidr(), "firewall rule updated");
                report.updated.push(label);
            }
            Err(e) => {
                warn!(rule = %label, error = %e, "failed to update firewall rule");
                report.failed.push(RuleFailure {
                    label,
                    message: e.to_string(),
                });
            }
        }
    }

    Ok(report)
}
