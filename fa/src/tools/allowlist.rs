//! Domain allow-list for trust-gated fetching

use std::fmt;

use tracing::{debug, warn};
use url::Url;

use super::ToolError;
use crate::config::DEFAULT_ALLOWED_DOMAINS;

/// Trusted domain suffixes
///
/// A host is admitted when it equals an entry or ends with `"." + entry`, so
/// subdomains pass while look-alikes such as `notfao.org` do not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainAllowList {
    domains: Vec<String>,
    allow_any: bool,
}

impl DomainAllowList {
    /// Build from entries; case, surrounding whitespace and leading dots are ignored
    ///
    /// A list with no usable entry falls back to `DEFAULT_ALLOWED_DOMAINS`;
    /// only `allow_any` admits every host.
    pub fn new<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized = normalize_all(domains);
        if normalized.is_empty() {
            warn!("Domain allow-list is empty, using the default trusted domains");
            normalized = normalize_all(DEFAULT_ALLOWED_DOMAINS);
        }
        debug!(domains = ?normalized, "DomainAllowList::new: called");
        Self {
            domains: normalized,
            allow_any: false,
        }
    }

    /// Admit every host; for callers that filter upstream
    pub fn allow_any() -> Self {
        Self {
            domains: Vec::new(),
            allow_any: true,
        }
    }

    pub fn is_allow_any(&self) -> bool {
        self.allow_any
    }

    pub fn domains(&self) -> &[String] {
        &self.domains
    }

    /// Check a bare host name
    pub fn is_allowed_host(&self, host: &str) -> bool {
        if self.allow_any {
            return true;
        }
        let host = normalize(host);
        if host.is_empty() {
            return false;
        }
        self.domains.iter().any(|entry| {
            host == *entry
                || (host.len() > entry.len()
                    && host.ends_with(entry.as_str())
                    && host.as_bytes()[host.len() - entry.len() - 1] == b'.')
        })
    }

    /// Parse `raw` and admit it only if it is http(s) on an allowed host
    pub fn check_url(&self, raw: &str) -> Result<Url, ToolError> {
        debug!(url = %raw, allow_any = self.allow_any, "check_url: called");
        let url = Url::parse(raw.trim()).map_err(|e| ToolError::InvalidUrl {
            url: raw.to_string(),
            reason: e.to_string(),
        })?;

        match url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(ToolError::UnsupportedScheme {
                    scheme: other.to_string(),
                });
            }
        }

        let host = url
            .host_str()
            .ok_or_else(|| ToolError::InvalidUrl {
                url: raw.to_string(),
                reason: "missing host".to_string(),
            })?
            .to_lowercase();

        if !self.is_allowed_host(&host) {
            debug!(%host, "check_url: refused");
            return Err(ToolError::DomainNotAllowed {
                domain: host,
                allowed: self.to_string(),
            });
        }

        Ok(url)
    }

    /// `(site:a OR site:b ...)` for restricting a web search, or `None` if unrestricted
    pub fn site_operators(&self) -> Option<String> {
        if self.allow_any || self.domains.is_empty() {
            return None;
        }
        let ops: Vec<String> = self.domains.iter().map(|d| format!("site:{}", d)).collect();
        Some(format!("({})", ops.join(" OR ")))
    }
}

impl Default for DomainAllowList {
    fn default() -> Self {
        Self::new(DEFAULT_ALLOWED_DOMAINS)
    }
}

impl fmt::Display for DomainAllowList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.allow_any {
            write!(f, "*")
        } else {
            write!(f, "{}", self.domains.join(", "))
        }
    }
}

fn normalize_all<I, S>(domains: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut normalized: Vec<String> = Vec::new();
    for entry in domains {
        let entry = normalize(entry.as_ref());
        if !entry.is_empty() && !normalized.contains(&entry) {
            normalized.push(entry);
        }
    }
    normalized
}

fn normalize(entry: &str) -> String {
    entry.trim().trim_start_matches('.').trim_end_matches('.').to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn fao_only() -> DomainAllowList {
        DomainAllowList::new(["fao.org"])
    }

    #[test]
    fn test_suffix_matching() {
        let list = fao_only();
        assert!(list.check_url("https://www.fao.org/x").is_ok());
        assert!(list.check_url("https://fao.org/x").is_ok());
        assert!(list.check_url("https://notfao.org/x").is_err());
        assert!(list.check_url("https://evilfao.org.attacker.com/x").is_err());
    }

    #[test]
    fn test_host_case_and_port_ignored() {
        let list = fao_only();
        assert!(list.check_url("HTTPS://WWW.FAO.ORG:8443/Path").is_ok());
    }

    #[test]
    fn test_leading_dot_entries() {
        let list = DomainAllowList::default();
        assert!(list.is_allowed_host("extension.cornell.edu"));
        assert!(list.is_allowed_host("www.ox.ac.uk"));
        assert!(!list.is_allowed_host("example.com"));
        assert!(!list.is_allowed_host("education.com"));
    }

    #[test]
    fn test_refusal_names_domain_and_list() {
        let err = DomainAllowList::new(["fao.org", "usda.gov"])
            .check_url("https://example.com/page")
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("'example.com'"));
        assert!(msg.contains("fao.org, usda.gov"));
    }

    #[test]
    fn test_rejects_non_http_schemes() {
        let list = DomainAllowList::allow_any();
        assert!(matches!(
            list.check_url("file:///etc/passwd"),
            Err(ToolError::UnsupportedScheme { .. })
        ));
        assert!(matches!(list.check_url("not a url"), Err(ToolError::InvalidUrl { .. })));
    }

    #[test]
    fn test_allow_any_admits_everything() {
        let list = DomainAllowList::allow_any();
        assert!(list.check_url("https://anything.example/x").is_ok());
        assert!(list.site_operators().is_none());
        assert_eq!(list.to_string(), "*");
    }

    #[test]
    fn test_entries_normalized_and_deduplicated() {
        let list = DomainAllowList::new([" FAO.org ", "fao.org", ".edu", ""]);
        assert_eq!(list.domains(), &["fao.org".to_string(), "edu".to_string()]);
    }

    #[test]
    fn test_empty_list_falls_back_to_defaults() {
        let defaults = DomainAllowList::default();
        assert!(!defaults.domains().is_empty());

        assert_eq!(DomainAllowList::new(Vec::<String>::new()), defaults);
        assert_eq!(DomainAllowList::new([".", " ", ""]), defaults);
        assert!(DomainAllowList::new(["."]).site_operators().is_some());
        assert!(!DomainAllowList::new(["."]).is_allowed_host("attacker.example"));
    }

    #[test]
    fn test_site_operators() {
        let list = DomainAllowList::new(["fao.org", ".edu"]);
        assert_eq!(list.site_operators().as_deref(), Some("(site:fao.org OR site:edu)"));
    }

    proptest! {
        #[test]
        fn prop_subdomains_of_allowed_entries_pass(sub in "[a-z][a-z0-9-]{0,10}(\\.[a-z][a-z0-9-]{0,10}){0,2}") {
            let list = DomainAllowList::new(["fao.org", "usda.gov"]);
            let host = format!("{}.fao.org", sub);
            prop_assert!(list.is_allowed_host(&host));
        }

        #[test]
        fn prop_lookalikes_rejected(prefix in "[a-z0-9]{1,10}", tail in "[a-z]{2,10}\\.(com|net|io)") {
            let list = DomainAllowList::new(["fao.org", "usda.gov"]);
            let glued = format!("{}fao.org", prefix);
            let nested = format!("{}.fao.org.{}", prefix, tail);
            prop_assert!(!list.is_allowed_host(&glued));
            prop_assert!(!list.is_allowed_host(&nested));
        }
    }
}
