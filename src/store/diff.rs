//! Snapshot comparison engine.
//!
//! Compares the current scan against the latest stored snapshot:
//! - path only in current: new
//! - path in both, fingerprint differs: modified
//! - path only in previous: deleted
//!
//! Unchanged paths appear nowhere in the result.

use serde::{Deserialize, Serialize};

use crate::snapshot::Snapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    New,
    Modified,
    Deleted,
}

impl ChangeKind {
    pub const ALL: [ChangeKind; 3] = [ChangeKind::New, ChangeKind::Modified, ChangeKind::Deleted];

    pub fn label(&self) -> &'static str {
        match self {
            ChangeKind::New => "New",
            ChangeKind::Modified => "Modified",
            ChangeKind::Deleted => "Deleted",
        }
    }
}

/// Sorted, disjoint lists of changed paths.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    pub new: Vec<String>,
    pub modified: Vec<String>,
    pub deleted: Vec<String>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.new.is_empty() && self.modified.is_empty() && self.deleted.is_empty()
    }

    pub fn total(&self) -> usize {
        self.new.len() + self.modified.len() + self.deleted.len()
    }

    pub fn paths(&self, kind: ChangeKind) -> &[String] {
        match kind {
            ChangeKind::New => &self.new,
            ChangeKind::Modified => &self.modified,
            ChangeKind::Deleted => &self.deleted,
        }
    }

    /// Non-empty sections in display order.
    pub fn sections(&self) -> impl Iterator<Item = (ChangeKind, &[String])> {
        ChangeKind::ALL
            .into_iter()
            .map(|kind| (kind, self.paths(kind)))
            .filter(|(_, paths)| !paths.is_empty())
    }
}

pub fn compare(current: &Snapshot, previous: &Snapshot) -> ChangeSet {
    let mut changes = ChangeSet::default();

    for (path, fingerprint) in current.iter() {
        match previous.get(path) {
            None => changes.new.push(path.to_string()),
            Some(old) if old != fingerprint => changes.modified.push(path.to_string()),
            Some(_) => {}
        }
    }

    for (path, _) in previous.iter() {
        if !current.contains(path) {
            changes.deleted.push(path.to_string());
        }
    }

    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::hasher::hash_bytes;

    fn snapshot(entries: &[(&str, &str)]) -> Snapshot {
        entries
            .iter()
            .map(|(path, content)| (path.to_string(), hash_bytes(content.as_bytes())))
            .collect()
    }

    #[test]
    fn new_file_detected() {
        let changes = compare(&snapshot(&[("a", "h1")]), &Snapshot::empty());
        assert_eq!(changes.new, vec!["a"]);
        assert!(changes.modified.is_empty());
        assert!(changes.deleted.is_empty());
    }

    #[test]
    fn modified_file_detected() {
        let changes = compare(&snapshot(&[("a", "h2")]), &snapshot(&[("a", "h1")]));
        assert_eq!(changes.modified, vec!["a"]);
        assert!(changes.new.is_empty());
        assert!(changes.deleted.is_empty());
    }

    #[test]
    fn deleted_file_detected() {
        let changes = compare(&Snapshot::empty(), &snapshot(&[("a", "h1")]));
        assert_eq!(changes.deleted, vec!["a"]);
        assert_eq!(changes.total(), 1);
    }

    #[test]
    fn identical_snapshots_have_no_changes() {
        let s = snapshot(&[("a", "1"), ("dir/b", "2"), ("dir/c", "3")]);
        let changes = compare(&s, &s);
        assert!(changes.is_empty());
        assert_eq!(changes.sections().count(), 0);
    }

    #[test]
    fn mixed_changes_are_sorted_and_disjoint() {
        let previous = snapshot(&[("keep", "k"), ("zeta", "old"), ("gone2", "x"), ("gone1", "y")]);
        let current = snapshot(&[("keep", "k"), ("zeta", "new"), ("beta", "b"), ("alpha", "a")]);

        let changes = compare(&current, &previous);
        assert_eq!(changes.new, vec!["alpha", "beta"]);
        assert_eq!(changes.modified, vec!["zeta"]);
        assert_eq!(changes.deleted, vec!["gone1", "gone2"]);

        let kinds: Vec<ChangeKind> = changes.sections().map(|(kind, _)| kind).collect();
        assert_eq!(kinds, ChangeKind::ALL.to_vec());
    }

    #[test]
    fn inputs_are_left_untouched() {
        let previous = snapshot(&[("a", "1")]);
        let current = snapshot(&[("b", "2")]);
        let (p, c) = (previous.clone(), current.clone());

        let _ = compare(&current, &previous);
        assert_eq!(previous, p);
        assert_eq!(current, c);
    }
}
