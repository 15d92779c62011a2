//! Seams between the reconciliation algorithm and the outside world.
//!
//! The production implementations wrap [`IpLookup`] and [`LinodeClient`];
//! tests substitute in-memory fakes.

use async_trait::async_trait;
use ipwarden_client::{IpLookup, LinodeClient};
use ipwarden_core::{FirewallRuleSet, FirewallRuleSetUpdate, PublicIp, Result};

/// Reports the caller's current public address
#[async_trait]
pub trait AddressSource: Send + Sync {
    /// Discover the public IP
    async fn current_ip(&self) -> Result<PublicIp>;
}

/// Reads and replaces a firewall's rule set
#[async_trait]
pub trait FirewallProvider: Send + Sync {
    /// Fetch the full rule set of a firewall
    async fn rules(&self, firewall_id: u64) -> Result<FirewallRuleSet>;

    /// Replace the full rule set of a firewall
    async fn update_rules(
        &self,
        firewall_id: u64,
        rules: &FirewallRuleSetUpdate,
    ) -> Result<FirewallRuleSet>;
}

#[async_trait]
impl AddressSource for IpLookup {
    async fn current_ip(&self) -> Result<PublicIp> {
        IpLookup::current_ip(self).await
    }
}

#[async_trait]
impl FirewallProvider for LinodeClient {
    async fn rules(&self, firewall_id: u64) -> Result<FirewallRuleSet> {
        self.firewalls().rules(firewall_id).await
    }

    async fn update_rules(
        &self,
        firewall_id: u64,
        rules: &FirewallRuleSetUpdate,
    ) -> Result<FirewallRuleSet> {
        self.firewalls().update_rules(firewall_id, rules).await
    }
}
