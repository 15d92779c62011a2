use serde::{Deserialize, Serialize};

/// Source or destination addresses of a firewall rule, partitioned by family.
///
/// Each list holds CIDR strings. A `None` list is omitted on the wire, which
/// Linode treats as "no addresses of that family".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkAddresses {
    /// IPv4 CIDRs (e.g. `"203.0.113.7/32"`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv4: Option<Vec<String>>,

    /// IPv6 CIDRs (e.g. `"2001:db8::/64"`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv6: Option<Vec<String>>,
}

impl NetworkAddresses {
    /// Addresses with only an IPv4 list
    #[must_use]
    pub fn ipv4_only<I, S>(cidrs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ipv4: Some(cidrs.into_iter().map(Into::into).collect()),
            ipv6: None,
        }
    }

    /// IPv4 CIDRs, empty when the list is absent
    #[must_use]
    pub fn ipv4(&self) -> &[String] {
        self.ipv4.as_deref().unwrap_or_default()
    }

    /// IPv6 CIDRs, empty when the list is absent
    #[must_use]
    pub fn ipv6(&self) -> &[String] {
        self.ipv6.as_deref().unwrap_or_default()
    }

    /// Replace the IPv4 list with a single host entry, leaving IPv6 untouched
    pub fn pin_ipv4(&mut self, ip: &PublicIp) {
        self.ipv4 = Some(vec![ip.host_cidr()]);
    }
}

/// Public address as reported by the lookup endpoint.
///
/// The value is kept verbatim (after trimming); it is not validated as an
/// IP literal before being embedded in a CIDR.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PublicIp(pub String);

impl PublicIp {
    /// Build from a raw response body, trimming surrounding whitespace
    #[must_use]
    pub fn from_body(body: &str) -> Self {
        Self(body.trim().to_string())
    }

    /// Get the address as a string
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Single-host CIDR for this address (`<ip>/32`)
    #[must_use]
    pub fn host_cidr(&self) -> String {
        format!("{}/32", self.0)
    }
}

impl std::fmt::Display for PublicIp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PublicIp {
    fn from(s: &str) -> Self {
        Self::from_body(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_body_trims_newline() {
        let ip = PublicIp::from_body("198.51.100.9\n");
        assert_eq!(ip.as_str(), "198.51.100.9");
        assert_eq!(ip.host_cidr(), "198.51.100.9/32");
    }

    #[test]
    fn test_malformed_ip_is_kept_verbatim() {
        let ip = PublicIp::from_body("<html>oops</html>");
        assert_eq!(ip.as_str(), "<html>oops</html>");
        assert_eq!(ip.host_cidr(), "<html>oops</html>/32");
    }

    #[test]
    fn test_pin_ipv4_keeps_ipv6() {
        let mut addrs = NetworkAddresses {
            ipv4: Some(vec!["10.0.0.0/8".into(), "192.0.2.1/32".into()]),
            ipv6: Some(vec!["2001:db8::/64".into()]),
        };
        addrs.pin_ipv4(&PublicIp::from("203.0.113.7"));
        assert_eq!(addrs.ipv4(), ["203.0.113.7/32"]);
        assert_eq!(addrs.ipv6(), ["2001:db8::/64"]);
    }

    #[test]
    fn test_absent_lists_are_omitted() {
        let json = serde_json::to_value(NetworkAddresses::ipv4_only(["192.0.2.1/32"])).unwrap();
        assert_eq!(json, serde_json::json!({ "ipv4": ["192.0.2.1/32"] }));
    }
}
