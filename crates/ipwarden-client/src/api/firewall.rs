//! Firewall API endpoints.

use crate::LinodeClient;
use ipwarden_core::{FirewallRuleSet, FirewallRuleSetUpdate, Result};

/// Cloud firewall endpoints
pub struct FirewallApi<'a> {
    client: &'a LinodeClient,
}

impl<'a> FirewallApi<'a> {
    pub(crate) fn new(client: &'a LinodeClient) -> Self {
        Self { client }
    }

    /// Get the full inbound/outbound rule set of a firewall
    pub async fn rules(&self, firewall_id: u64) -> Result<FirewallRuleSet> {
        self.client
            .get(&format!("/networking/firewalls/{firewall_id}/rules"))
            .await
    }

    /// Replace a firewall's rule set.
    ///
    /// Returns the rule set as stored by the provider.
    pub async fn update_rules(
        &self,
        firewall_id: u64,
        rules: &FirewallRuleSetUpdate,
    ) -> Result<FirewallRuleSet> {
        self.client
            .put(&format!("/networking/firewalls/{firewall_id}/rules"), rules)
            .await
    }
}
