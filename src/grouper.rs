//! Occurrence Grouping
//!
//! Buckets extracted occurrences by a derived key, preserving first-seen
//! group order and within-group file order.

use regex::Regex;

use crate::extractor::Occurrence;

const UNKNOWN_ROOT: &str = "Unknown Exception";
const UNKNOWN_TYPE: &str = "UnknownException";

/// How the group key is derived from an occurrence.
pub enum GroupStrategy {
    /// Key = first line of the message.
    RootLine,
    /// Key = the `SomethingException` segment of the first qualified
    /// exception-type token found in the message.
    TypeToken { token_re: Regex },
}

impl GroupStrategy {
    pub fn root_line() -> Self {
        GroupStrategy::RootLine
    }

    pub fn type_token() -> Self {
        // Dotted identifier path ending in the literal suffix "Exception",
        // e.g. java.lang.NullPointerException. The key is the final segment.
        let token_re = Regex::new(
            r"\b(?:[A-Za-z_][A-Za-z0-9_]*\.)*([A-Za-z_][A-Za-z0-9_]*Exception)\b",
        )
        .unwrap();
        GroupStrategy::TypeToken { token_re }
    }

    /// Parse the `--group-by` flag value.
    pub fn from_name(name: &str) -> Result<Self, String> {
        match name {
            "root" => Ok(Self::root_line()),
            "type" => Ok(Self::type_token()),
            other => Err(format!(
                "Unknown grouping strategy '{}' (expected 'root' or 'type')",
                other
            )),
        }
    }

    /// Derive the group key for one occurrence. Never fails; occurrences
    /// without a usable key fall into a sentinel bucket.
    pub fn key_for(&self, occurrence: &Occurrence) -> String {
        match self {
            GroupStrategy::RootLine => occurrence
                .root_line()
                .filter(|line| !line.is_empty())
                .unwrap_or(UNKNOWN_ROOT)
                .to_string(),
            GroupStrategy::TypeToken { token_re } => token_re
                .captures(&occurrence.message)
                .map(|caps| caps[1].to_string())
                .unwrap_or_else(|| UNKNOWN_TYPE.to_string()),
        }
    }
}

/// One bucket of occurrences sharing a key.
pub struct Group {
    pub key: String,
    pub occurrences: Vec<Occurrence>,
}

/// Insertion-ordered mapping from group key to its occurrences.
///
/// Group order is the order in which each key was first seen in the file;
/// occurrences within a group keep file order.
pub struct GroupedReport {
    groups: Vec<Group>,
}

impl GroupedReport {
    /// Fold the extracted occurrences into groups under the given strategy.
    pub fn build(occurrences: Vec<Occurrence>, strategy: &GroupStrategy) -> Self {
        let mut groups: Vec<Group> = Vec::new();
        for occurrence in occurrences {
            let key = strategy.key_for(&occurrence);
            match groups.iter_mut().find(|g| g.key == key) {
                Some(group) => group.occurrences.push(occurrence),
                None => groups.push(Group {
                    key,
                    occurrences: vec![occurrence],
                }),
            }
        }
        log::debug!("Grouped occurrences into {} groups", groups.len());
        GroupedReport { groups }
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn occurrence_count(&self) -> usize {
        self.groups.iter().map(|g| g.occurrences.len()).sum()
    }
}
