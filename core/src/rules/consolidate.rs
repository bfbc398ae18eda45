//! Wildcard consolidation
//!
//! Sibling subdomains sharing an immediate parent collapse into a single
//! `*.parent` entry. Only one level is considered and there is no knowledge
//! of public suffixes: `a.example.co.uk` and `b.example.co.uk` become
//! `*.example.co.uk`, while `example.com` is never turned into `*.com`.

use std::collections::{BTreeSet, HashMap};

use crate::models::RuleEntry;

/// Hostnames with at most this many labels are always kept verbatim
const MIN_GROUPABLE_LABELS: usize = 3;

/// Consolidate a host list into sorted rule entries.
pub fn consolidate<S: AsRef<str>>(hosts: &[S]) -> Vec<RuleEntry> {
    let mut entries = Vec::with_capacity(hosts.len());
    let mut groups: HashMap<&str, BTreeSet<&str>> = HashMap::new();

    for host in hosts.iter().map(AsRef::as_ref) {
        match parent_domain(host) {
            Some(parent) => {
                groups.entry(parent).or_default().insert(host);
            }
            None => entries.push(RuleEntry::exact(host)),
        }
    }

    for (parent, members) in groups {
        if members.len() >= 2 {
            entries.push(RuleEntry::wildcard(parent));
        } else {
            entries.extend(members.into_iter().map(RuleEntry::exact));
        }
    }

    entries.sort();
    entries
}

/// Same as [`consolidate`], rendered back to strings
pub fn consolidate_to_strings<S: AsRef<str>>(hosts: &[S]) -> Vec<String> {
    consolidate(hosts).into_iter().map(String::from).collect()
}

/// Everything after the first label, for hosts with three or more labels.
fn parent_domain(host: &str) -> Option<&str> {
    if host.split('.').count() < MIN_GROUPABLE_LABELS {
        return None;
    }
    host.split_once('.').map(|(_, parent)| parent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_gives_empty_output() {
        let hosts: Vec<String> = Vec::new();
        assert!(consolidate(&hosts).is_empty());
    }

    #[test]
    fn two_label_hosts_are_never_wildcarded() {
        assert_eq!(
            consolidate_to_strings(&["example.com", "other.com", "a.com"]),
            vec!["a.com", "example.com", "other.com"]
        );
    }

    #[test]
    fn siblings_collapse_into_wildcard() {
        assert_eq!(
            consolidate(&["a.test.com", "b.test.com"]),
            vec![RuleEntry::wildcard("test.com")]
        );
    }

    #[test]
    fn lone_subdomain_is_kept() {
        assert_eq!(consolidate_to_strings(&["a.test.com"]), vec!["a.test.com"]);
    }

    #[test]
    fn parent_itself_is_not_merged_with_its_children() {
        assert_eq!(
            consolidate_to_strings(&["api.test.com", "test.com", "www.test.com"]),
            vec!["*.test.com", "test.com"]
        );
    }

    #[test]
    fn only_the_immediate_parent_is_considered() {
        assert_eq!(
            consolidate_to_strings(&[
                "a.cdn.shop.io",
                "b.cdn.shop.io",
                "img.shop.io",
                "x.y.z.deep.net",
            ]),
            vec!["*.cdn.shop.io", "img.shop.io", "x.y.z.deep.net"]
        );
    }

    #[test]
    fn multi_part_suffixes_get_no_special_treatment() {
        assert_eq!(
            consolidate_to_strings(&["bbc.co.uk", "gov.co.uk", "a.example.co.uk"]),
            vec!["*.co.uk", "a.example.co.uk"]
        );
    }

    #[test]
    fn duplicate_hosts_do_not_form_a_group() {
        assert_eq!(
            consolidate_to_strings(&["a.test.com", "a.test.com"]),
            vec!["a.test.com"]
        );
    }
}
