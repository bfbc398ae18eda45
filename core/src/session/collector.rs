//! Set of hostnames collected by the active session

use std::collections::HashSet;

#[derive(Debug, Clone, Default)]
pub struct DomainCollector {
    hosts: HashSet<String>,
}

impl DomainCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a hostname. Returns false if it was already present.
    pub fn add(&mut self, hostname: &str) -> bool {
        if self.hosts.contains(hostname) {
            return false;
        }
        self.hosts.insert(hostname.to_string())
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    pub fn clear(&mut self) {
        self.hosts.clear();
    }

    /// All hostnames in ascending byte order
    pub fn snapshot(&self) -> Vec<String> {
        let mut hosts: Vec<String> = self.hosts.iter().cloned().collect();
        hosts.sort();
        hosts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_is_idempotent() {
        let mut collector = DomainCollector::new();
        assert!(collector.add("a.test.com"));
        for _ in 0..5 {
            assert!(!collector.add("a.test.com"));
        }
        assert_eq!(collector.len(), 1);
    }

    #[test]
    fn snapshot_is_sorted_case_sensitively() {
        let mut collector = DomainCollector::new();
        for host in ["b.test", "a.test", "Z.test", "cdn.a.test"] {
            collector.add(host);
        }
        assert_eq!(
            collector.snapshot(),
            vec!["Z.test", "a.test", "b.test", "cdn.a.test"]
        );
    }

    #[test]
    fn clear_empties_the_set() {
        let mut collector = DomainCollector::new();
        collector.add("a.test");
        collector.clear();
        assert!(collector.is_empty());
        assert!(collector.snapshot().is_empty());
    }
}
