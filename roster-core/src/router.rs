//! Key Router: admission number parsing and partition routing.
//!
//! Admission numbers have the shape `YY B C SECTION SERIAL`: a two digit
//! year, one digit batch, one digit campus, a section code of one to three
//! digits, then the serial. The section code is matched at a fixed offset
//! against the section table, longest candidate first.
//!
//! Routing is pure. It never touches the network or the cache, so it can be
//! called before anything else is initialized.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::error::RouteError;
use crate::identity::normalize_identifier;
use crate::section::{SectionEntry, SECTION_TABLE};

/// Shortest identifier that can carry a section code and a serial.
pub const MIN_IDENTIFIER_LEN: usize = 8;

/// Offset of the section code (after `YY B C`).
pub const SECTION_OFFSET: usize = 4;

/// Section code lengths, tried in this order.
const SECTION_CODE_LENGTHS: [usize; 3] = [3, 2, 1];

static GRAMMAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<year>\d{2})(?P<batch>\d)(?P<campus>\d)(?P<rest>[0-9A-Za-z]+)$")
        .expect("Invalid admission number regex")
});

static STANDARD: Lazy<KeyRouter> = Lazy::new(KeyRouter::default);

/// Decoded admission number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedIdentifier {
    /// The identifier as parsed (trimmed).
    pub raw: String,
    /// Two digit admission year.
    pub year: String,
    pub batch: String,
    pub campus: String,
    /// Section code matched against the table.
    pub section_code: String,
    /// Everything after the section code.
    pub serial: String,
    /// The matched table row.
    pub section: SectionEntry,
}

impl ParsedIdentifier {
    /// Partition owning this identifier.
    pub fn partition(&self) -> &'static str {
        self.section.partition
    }

    /// Four digit admission year (`22` -> `2022`).
    pub fn admission_year(&self) -> u16 {
        2000 + self.year.parse::<u16>().unwrap_or(0)
    }

    /// Department metadata for the matched section.
    pub fn department(&self) -> DepartmentInfo {
        DepartmentInfo::from(&self.section)
    }
}

/// Human readable metadata for a section code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DepartmentInfo {
    pub section_code: String,
    pub partition: String,
    pub department_name: String,
    pub department_code: String,
    pub section_index: u8,
}

impl From<&SectionEntry> for DepartmentInfo {
    fn from(entry: &SectionEntry) -> Self {
        Self {
            section_code: entry.code.to_string(),
            partition: entry.partition.to_string(),
            department_name: entry.department.to_string(),
            department_code: entry.department_code.to_string(),
            section_index: entry.section_index,
        }
    }
}

/// Stateless router over a section table.
#[derive(Debug, Clone)]
pub struct KeyRouter {
    table: &'static [SectionEntry],
    by_code: HashMap<&'static str, &'static SectionEntry>,
}

impl Default for KeyRouter {
    fn default() -> Self {
        Self::with_table(SECTION_TABLE)
    }
}

impl KeyRouter {
    /// Router over the standard section table, shared process-wide.
    pub fn standard() -> &'static KeyRouter {
        &STANDARD
    }

    /// Router over a custom table. Earlier rows win on duplicate codes.
    pub fn with_table(table: &'static [SectionEntry]) -> Self {
        let mut by_code = HashMap::with_capacity(table.len());
        for entry in table {
            by_code.entry(entry.code).or_insert(entry);
        }
        Self { table, by_code }
    }

    /// Parse an admission number, reporting why it failed.
    pub fn try_parse(&self, id: &str) -> Result<ParsedIdentifier, RouteError> {
        let id = normalize_identifier(id);
        let len = id.chars().count();
        if len < MIN_IDENTIFIER_LEN {
            return Err(RouteError::TooShort {
                id: id.to_string(),
                len,
                min: MIN_IDENTIFIER_LEN,
            });
        }

        let caps = GRAMMAR.captures(id).ok_or_else(|| RouteError::Malformed {
            id: id.to_string(),
        })?;
        let rest = &caps["rest"];

        // Longest code first; the serial must keep at least one character.
        let section = SECTION_CODE_LENGTHS
            .iter()
            .filter(|&&n| n < rest.len())
            .find_map(|&n| self.by_code.get(&rest[..n]).copied())
            .ok_or_else(|| RouteError::UnknownSection { id: id.to_string() })?;

        Ok(ParsedIdentifier {
            raw: id.to_string(),
            year: caps["year"].to_string(),
            batch: caps["batch"].to_string(),
            campus: caps["campus"].to_string(),
            section_code: section.code.to_string(),
            serial: rest[section.code.len()..].to_string(),
            section: *section,
        })
    }

    /// Parse an admission number; `None` when it cannot be routed.
    pub fn parse(&self, id: &str) -> Option<ParsedIdentifier> {
        self.try_parse(id).ok()
    }

    /// Partition owning `id`, if it routes.
    pub fn target_partition(&self, id: &str) -> Option<&'static str> {
        self.try_parse(id).ok().map(|parsed| parsed.section.partition)
    }

    /// Department metadata for a section code.
    pub fn department_info(&self, section_code: &str) -> Option<DepartmentInfo> {
        self.by_code
            .get(section_code)
            .map(|entry| DepartmentInfo::from(*entry))
    }

    /// Department metadata for a partition name.
    pub fn department_for_partition(&self, partition: &str) -> Option<DepartmentInfo> {
        self.table
            .iter()
            .find(|entry| entry.partition == partition)
            .map(DepartmentInfo::from)
    }

    /// All partitions in table order, without duplicates.
    pub fn partitions(&self) -> Vec<&'static str> {
        let mut seen = Vec::with_capacity(self.table.len());
        for entry in self.table {
            if !seen.contains(&entry.partition) {
                seen.push(entry.partition);
            }
        }
        seen
    }

    /// The underlying table.
    pub fn table(&self) -> &'static [SectionEntry] {
        self.table
    }
}


#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(500))]

        /// Parsing is deterministic for arbitrary input.
        #[test]
        fn prop_parse_is_deterministic(s in ".{0,24}") {
            let router = KeyRouter::default();
            prop_assert_eq!(router.parse(&s), router.parse(&s));
        }

        /// A standard and a freshly built router agree.
        #[test]
        fn prop_routing_independent_of_instance(s in "[0-9]{4,14}") {
            prop_assert_eq!(
                KeyRouter::standard().target_partition(&s),
                KeyRouter::default().target_partition(&s)
            );
        }

        /// Any well formed id built from a table code routes to that code's partition,
        /// unless a longer code shadows it.
        #[test]
        fn prop_known_codes_route(
            year in "[0-9]{2}",
            batch in "[0-9]",
            campus in "[0-9]",
            idx in 0usize..SECTION_TABLE.len(),
            serial in "[0-9]{4,6}",
        ) {
            let entry = &SECTION_TABLE[idx];
            let id = format!("{year}{batch}{campus}{}{serial}", entry.code);
            let parsed = KeyRouter::default().parse(&id);
            prop_assert!(parsed.is_some());
            let parsed = parsed.expect("checked above");
            prop_assert!(parsed.section_code.starts_with(entry.code));
            prop_assert_eq!(format!("{}{}", parsed.section_code, parsed.serial), format!("{}{serial}", entry.code));
        }
    }
}
