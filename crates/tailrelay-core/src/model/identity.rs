use serde::Serialize;

/// The backend's MagicDNS name, possibly empty while Tailscale is down.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TailnetIdentity(String);

impl TailnetIdentity {
    pub fn new(fqdn: impl Into<String>) -> Self {
        Self(fqdn.into())
    }

    /// The FQDN exactly as reported.
    pub fn fqdn(&self) -> &str {
        &self.0
    }

    /// FQDN without the trailing root dot, as used in proxy hostnames.
    pub fn hostname(&self) -> &str {
        self.0.strip_suffix('.').unwrap_or(&self.0)
    }

    pub fn is_resolved(&self) -> bool {
        !self.hostname().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hostname_strips_one_trailing_dot() {
        assert_eq!(TailnetIdentity::new("box.tailnet.ts.net.").hostname(), "box.tailnet.ts.net");
        assert_eq!(TailnetIdentity::new("box.tailnet.ts.net").hostname(), "box.tailnet.ts.net");
        assert!(!TailnetIdentity::new(".").is_resolved());
        assert!(!TailnetIdentity::default().is_resolved());
    }
}
