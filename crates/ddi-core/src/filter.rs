//! Domain filters
//!
//! A filter is either a literal allow/deny list of zone names or a pair of
//! regular expressions. Only the literal style yields candidate zones for
//! the zone cache; both styles can test individual names.

use regex::Regex;
use serde::{Serialize, Serializer};

use crate::error::{Error, Result};

/// Which names (and zones) the provider is responsible for
#[derive(Debug, Clone)]
pub enum DomainFilter {
    /// Explicit zone lists
    Literal {
        include: Vec<String>,
        exclude: Vec<String>,
    },
    /// Regular expressions matched against the whole name
    Regex {
        include: Regex,
        exclude: Option<Regex>,
    },
}

impl Default for DomainFilter {
    fn default() -> Self {
        Self::literal(Vec::<String>::new(), Vec::<String>::new())
    }
}

impl DomainFilter {
    /// Build a literal filter; entries are trimmed, lowercased and lose
    /// their trailing dot, empty entries are dropped
    pub fn literal(
        include: impl IntoIterator<Item = impl Into<String>>,
        exclude: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self::Literal {
            include: normalize_entries(include),
            exclude: normalize_entries(exclude),
        }
    }

    /// Build a regex filter
    pub fn regex(include: &str, exclude: Option<&str>) -> Result<Self> {
        let include = Regex::new(include)
            .map_err(|e| Error::config(format!("Invalid domain filter regex: {}", e)))?;
        let exclude = match exclude {
            Some(pattern) if !pattern.is_empty() => Some(Regex::new(pattern).map_err(|e| {
                Error::config(format!("Invalid domain exclusion regex: {}", e))
            })?),
            _ => None,
        };
        Ok(Self::Regex { include, exclude })
    }

    /// Whether the filter accepts `name`
    pub fn matches(&self, name: &str) -> bool {
        let name = name.trim().trim_end_matches('.');
        match self {
            Self::Literal { include, exclude } => {
                (include.is_empty() || include.iter().any(|f| literal_match(name, f)))
                    && !exclude.iter().any(|f| literal_match(name, f))
            }
            Self::Regex { include, exclude } => {
                include.is_match(name) && !exclude.as_ref().is_some_and(|re| re.is_match(name))
            }
        }
    }

    /// Zones worth checking for existence, in configuration order
    ///
    /// Excluded and duplicate entries are skipped. A regex filter has no
    /// literal zones and yields nothing.
    pub fn candidate_zones(&self) -> Vec<String> {
        let Self::Literal { include, exclude } = self else {
            return Vec::new();
        };

        let mut zones: Vec<String> = Vec::with_capacity(include.len());
        for zone in include {
            if zone.starts_with('.') || exclude.iter().any(|f| literal_match(zone, f)) {
                continue;
            }
            if zones.contains(zone) {
                continue;
            }
            zones.push(zone.clone());
        }
        zones
    }

    /// Short description for startup logs
    pub fn describe(&self) -> String {
        match self {
            Self::Literal { include, exclude } if include.is_empty() && exclude.is_empty() => {
                "no kind of domain filters".to_string()
            }
            Self::Literal { include, exclude } => {
                let mut parts = Vec::new();
                if !include.is_empty() {
                    parts.push(format!("domain filter: '{}'", include.join(",")));
                }
                if !exclude.is_empty() {
                    parts.push(format!("exclude domain filter: '{}'", exclude.join(",")));
                }
                parts.join(", ")
            }
            Self::Regex { include, exclude } => match exclude {
                Some(exclude) => format!(
                    "regexp domain filter: '{}', with exclusion: '{}'",
                    include, exclude
                ),
                None => format!("regexp domain filter: '{}'", include),
            },
        }
    }
}

fn normalize_entries(entries: impl IntoIterator<Item = impl Into<String>>) -> Vec<String> {
    entries
        .into_iter()
        .map(Into::into)
        .map(|e| e.trim().trim_end_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

// A leading dot restricts the entry to strict subdomains.
fn literal_match(name: &str, filter: &str) -> bool {
    let name = name.to_ascii_lowercase();
    if filter.starts_with('.') {
        return name.ends_with(filter);
    }
    name == filter || name.ends_with(&format!(".{filter}"))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DomainFilterWire<'a> {
    #[serde(skip_serializing_if = "is_empty_slice")]
    include: &'a [String],
    #[serde(skip_serializing_if = "is_empty_slice")]
    exclude: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    regex_include: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    regex_exclude: Option<&'a str>,
}

fn is_empty_slice(entries: &&[String]) -> bool {
    entries.is_empty()
}

/// Serializes to the external-dns negotiation form
impl Serialize for DomainFilter {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let wire = match self {
            Self::Literal { include, exclude } => DomainFilterWire {
                include,
                exclude,
                regex_include: None,
                regex_exclude: None,
            },
            Self::Regex { include, exclude } => DomainFilterWire {
                include: &[],
                exclude: &[],
                regex_include: Some(include.as_str()),
                regex_exclude: exclude.as_ref().map(Regex::as_str),
            },
        };
        wire.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_matches_zone_and_subdomains() {
        let filter = DomainFilter::literal(["test.com."], Vec::<String>::new());
        assert!(filter.matches("test.com"));
        assert!(filter.matches("www.TEST.com."));
        assert!(!filter.matches("xtest.com"));
        assert!(!filter.matches("www.other.org"));
    }

    #[test]
    fn test_literal_exclusion() {
        let filter = DomainFilter::literal(["test.com"], ["internal.test.com"]);
        assert!(filter.matches("www.test.com"));
        assert!(!filter.matches("db.internal.test.com"));
    }

    #[test]
    fn test_empty_literal_matches_everything() {
        let filter = DomainFilter::default();
        assert!(filter.matches("anything.example"));
        assert!(filter.candidate_zones().is_empty());
        assert_eq!(filter.describe(), "no kind of domain filters");
    }

    #[test]
    fn test_leading_dot_matches_subdomains_only() {
        let filter = DomainFilter::literal([".test.com"], Vec::<String>::new());
        assert!(filter.matches("www.test.com"));
        assert!(!filter.matches("test.com"));
    }

    #[test]
    fn test_candidate_zones_dedup_and_exclude() {
        let filter = DomainFilter::literal(
            [" test.com ", "TEST.com.", "abc.com", "skip.org", ""],
            ["skip.org"],
        );
        assert_eq!(filter.candidate_zones(), vec!["test.com", "abc.com"]);
    }

    #[test]
    fn test_literal_entries_are_lowercased() {
        let filter = DomainFilter::literal(["Test.COM."], ["Internal.Test.com"]);
        assert_eq!(filter.candidate_zones(), vec!["test.com"]);
        assert!(filter.matches("www.test.com"));
        assert!(!filter.matches("db.INTERNAL.test.com"));
        assert_eq!(
            serde_json::to_value(&filter).unwrap(),
            serde_json::json!({ "include": ["test.com"], "exclude": ["internal.test.com"] })
        );
    }

    #[test]
    fn test_regex_filter() {
        let filter = DomainFilter::regex(r"(^|\.)test\.com$", Some(r"^internal\.")).unwrap();
        assert!(filter.matches("www.test.com."));
        assert!(!filter.matches("internal.test.com"));
        assert!(!filter.matches("www.other.org"));
        assert!(filter.candidate_zones().is_empty());
    }

    #[test]
    fn test_invalid_regex_is_config_error() {
        let err = DomainFilter::regex("(unclosed", None).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_negotiation_json() {
        let literal = DomainFilter::literal(["test.com"], ["a.test.com"]);
        assert_eq!(
            serde_json::to_value(&literal).unwrap(),
            serde_json::json!({"include": ["test.com"], "exclude": ["a.test.com"]})
        );

        let regex = DomainFilter::regex(r"\.test\.com$", None).unwrap();
        assert_eq!(
            serde_json::to_value(&regex).unwrap(),
            serde_json::json!({"regexInclude": r"\.test\.com$"})
        );
    }
}
