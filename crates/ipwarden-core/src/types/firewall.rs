use serde::{Deserialize, Serialize};

use super::{NetworkAddresses, PublicIp};

/// What a rule (or a default policy) does with matching traffic
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RuleAction {
    /// Let the traffic through
    #[default]
    Accept,
    /// Silently discard the traffic
    Drop,
}

impl std::fmt::Display for RuleAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Accept => write!(f, "ACCEPT"),
            Self::Drop => write!(f, "DROP"),
        }
    }
}

/// Network protocol a rule applies to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Protocol {
    /// TCP protocol
    #[default]
    Tcp,
    /// UDP protocol
    Udp,
    /// ICMP protocol
    Icmp,
    /// IP-in-IP encapsulation
    Ipencap,
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tcp => write!(f, "TCP"),
            Self::Udp => write!(f, "UDP"),
            Self::Icmp => write!(f, "ICMP"),
            Self::Ipencap => write!(f, "IPENCAP"),
        }
    }
}

/// A single inbound or outbound firewall rule
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirewallRule {
    /// Rule name; used for prefix matching. Linode allows it to be null.
    #[serde(default)]
    pub label: Option<String>,

    /// Action taken on matching traffic
    #[serde(default)]
    pub action: RuleAction,

    /// Protocol the rule applies to
    #[serde(default)]
    pub protocol: Protocol,

    /// Port or port range list (e.g. `"22"`, `"80,443"`, `"1000-2000"`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ports: Option<String>,

    /// Free-form description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Addresses the rule applies to
    #[serde(default)]
    pub addresses: NetworkAddresses,
}

impl FirewallRule {
    /// Create an accepting TCP rule with the given label and no addresses
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            ..Self::default()
        }
    }

    /// Rule name, empty when the rule is unlabeled
    #[must_use]
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or_default()
    }

    /// Ordinal, case-sensitive prefix match on the label
    #[must_use]
    pub fn label_starts_with(&self, prefix: &str) -> bool {
        self.label().starts_with(prefix)
    }
}

/// Full rule set of a firewall as returned by `GET .../rules`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirewallRuleSet {
    /// Inbound rules, in evaluation order
    #[serde(default)]
    pub inbound: Vec<FirewallRule>,

    /// Default action for inbound traffic no rule matched
    #[serde(default)]
    pub inbound_policy: RuleAction,

    /// Outbound rules, in evaluation order
    #[serde(default)]
    pub outbound: Vec<FirewallRule>,

    /// Default action for outbound traffic no rule matched
    #[serde(default)]
    pub outbound_policy: RuleAction,

    /// Content fingerprint (read-only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,

    /// Rule set version (read-only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
}

impl FirewallRuleSet {
    /// Indices of inbound rules whose label starts with `prefix`
    #[must_use]
    pub fn matching_inbound(&self, prefix: &str) -> Vec<usize> {
        self.inbound
            .iter()
            .enumerate()
            .filter(|(_, rule)| rule.label_starts_with(prefix))
            .map(|(i, _)| i)
            .collect()
    }

    /// Pin the IPv4 list of the inbound rule at `index` to `ip/32`.
    ///
    /// Returns the rule's label, or `None` if the index is out of range.
    pub fn pin_inbound(&mut self, index: usize, ip: &PublicIp) -> Option<&str> {
        let rule = self.inbound.get_mut(index)?;
        rule.addresses.pin_ipv4(ip);
        Some(rule.label())
    }

    /// Build the write payload for this rule set with both policies forced to
    /// [`RuleAction::Accept`]
    #[must_use]
    pub fn to_update(&self) -> FirewallRuleSetUpdate {
        FirewallRuleSetUpdate {
            inbound: self.inbound.clone(),
            outbound: self.outbound.clone(),
            inbound_policy: RuleAction::Accept,
            outbound_policy: RuleAction::Accept,
        }
    }
}

/// Request body for `PUT .../rules`.
///
/// The provider replaces the whole rule set, so both directions must always be
/// sent together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirewallRuleSetUpdate {
    /// Inbound rules
    pub inbound: Vec<FirewallRule>,
    /// Outbound rules
    pub outbound: Vec<FirewallRule>,
    /// Default inbound action
    pub inbound_policy: RuleAction,
    /// Default outbound action
    pub outbound_policy: RuleAction,
}
