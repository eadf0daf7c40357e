//! Domain name helpers
//!
//! Pure functions used to decide which configured zone owns a name:
//!
//! - [`to_fqdn`] / [`trim_fqdn`]: switch between absolute and relative form
//! - [`to_unicode`]: decode punycode labels so that `xn--` and native
//!   spellings of the same label compare equal
//! - [`has_suffix`]: case-insensitive, label-aligned suffix test
//! - [`split_longest_suffix`]: pick the longest matching zone and return
//!   the host label relative to it
//! - [`join_host_and_zone`]: the inverse of the split
//!
//! Comparisons always happen on the unicode, fully-qualified form of both
//! inputs. The root zone is spelled `"."` and owns every non-empty name.

/// Canonical spelling of the root zone
pub const ROOT_ZONE: &str = ".";

const ACE_PREFIX: &str = "xn--";

/// Append a trailing dot if the name does not already carry one.
pub fn to_fqdn(name: &str) -> String {
    if name.ends_with('.') {
        name.to_string()
    } else {
        format!("{name}.")
    }
}

/// Remove a single trailing dot, if present.
pub fn trim_fqdn(name: &str) -> &str {
    name.strip_suffix('.').unwrap_or(name)
}

/// Convert every punycode label of `name` to its unicode form.
///
/// Labels that are not ACE-encoded are returned untouched (case is
/// preserved). If any label fails to decode, the original string is
/// returned unchanged.
pub fn to_unicode(name: &str) -> String {
    if !name
        .split('.')
        .any(|label| label.len() > ACE_PREFIX.len() && is_ace(label))
    {
        return name.to_string();
    }

    let mut labels = Vec::new();
    for label in name.split('.') {
        if label.len() > ACE_PREFIX.len() && is_ace(label) {
            match idna::punycode::decode_to_string(&label[ACE_PREFIX.len()..]) {
                Some(decoded) => labels.push(decoded),
                None => {
                    tracing::debug!(domain = %name, label = %label, "failed to decode punycode label");
                    return name.to_string();
                }
            }
        } else {
            labels.push(label.to_string());
        }
    }
    labels.join(".")
}

fn is_ace(label: &str) -> bool {
    label
        .get(..ACE_PREFIX.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(ACE_PREFIX))
}

/// Unicode, fully-qualified form used for every comparison.
fn normalize(name: &str) -> String {
    to_fqdn(&to_unicode(name))
}

/// Whether `suffix` is a label-aligned, case-insensitive suffix of `name`.
///
/// An empty `name` or `suffix` never matches. The root suffix `"."`
/// matches any non-empty name.
pub fn has_suffix(name: &str, suffix: &str) -> bool {
    if name.is_empty() || suffix.is_empty() {
        return false;
    }
    has_fqdn_suffix(&normalize(name), &normalize(suffix))
}

// Both arguments must already be normalized.
fn has_fqdn_suffix(name: &str, suffix: &str) -> bool {
    if suffix.is_empty() {
        return false;
    }
    if suffix == ROOT_ZONE {
        return !name.is_empty();
    }
    if name.len() < suffix.len() {
        return false;
    }

    let split = name.len() - suffix.len();
    if !name.is_char_boundary(split) {
        return false;
    }
    let (prefix, tail) = name.split_at(split);

    eq_fold(tail, suffix) && (prefix.is_empty() || prefix.ends_with('.'))
}

fn eq_fold(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}

/// Outcome of a longest-suffix match
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuffixMatch {
    /// Host label relative to the matched suffix, without trailing dot
    pub label: String,
    /// Matched suffix in normalized form, without trailing dot (the root
    /// zone stays `"."`)
    pub suffix: String,
    /// Position of the matched suffix in the candidate list
    pub index: usize,
}

/// Find the longest candidate suffix owning `name`.
///
/// Length is measured on the normalized, fully-qualified form. Among
/// candidates of equal length the first one wins; callers should not
/// depend on that order.
pub fn match_longest_suffix<S: AsRef<str>>(name: &str, suffixes: &[S]) -> Option<SuffixMatch> {
    if name.is_empty() {
        return None;
    }
    let fqdn = normalize(name);

    let mut best: Option<(usize, String)> = None;
    for (index, suffix) in suffixes.iter().enumerate() {
        let suffix = suffix.as_ref();
        if suffix.is_empty() {
            continue;
        }
        let candidate = normalize(suffix);
        let longer = best
            .as_ref()
            .is_none_or(|(_, current)| candidate.len() > current.len());
        if longer && has_fqdn_suffix(&fqdn, &candidate) {
            best = Some((index, candidate));
        }
    }

    best.map(|(index, suffix)| {
        let label = trim_fqdn(&fqdn[..fqdn.len() - suffix.len()]).to_string();
        let suffix = if suffix == ROOT_ZONE {
            suffix
        } else {
            trim_fqdn(&suffix).to_string()
        };
        SuffixMatch {
            label,
            suffix,
            index,
        }
    })
}

/// Split `name` into `(relative label, matched suffix)` using the longest
/// candidate suffix that owns it.
///
/// Returns `None` when no candidate matches. When only the root zone
/// matches, the label is the whole name without its trailing dot and the
/// suffix is `"."`.
pub fn split_longest_suffix<S: AsRef<str>>(name: &str, suffixes: &[S]) -> Option<(String, String)> {
    match_longest_suffix(name, suffixes).map(|m| (m.label, m.suffix))
}

/// Build a name from a host label and its zone.
///
/// Trailing dots are dropped from both parts. A root (or empty) zone
/// yields the host unchanged; an empty host yields the zone apex.
///
/// Unlike plain `host + "." + zone` concatenation, the apex label `""`
/// maps back to `"test.com"` rather than `".test.com"`, so apex records
/// read back under their real name.
pub fn join_host_and_zone(host: &str, zone: &str) -> String {
    let host = to_unicode(host);
    let zone = to_unicode(zone);
    let host = trim_fqdn(&host);
    let zone = trim_fqdn(&zone);

    if zone.is_empty() {
        host.to_string()
    } else if host.is_empty() {
        zone.to_string()
    } else {
        format!("{host}.{zone}")
    }
}
