//! Roster Core - Identifiers, Routing and Records
//!
//! Pure data structures and pure functions shared by every other crate:
//! the section table, the Key Router, the `Record` type and its decoding from
//! backing store documents, filter expressions and the error taxonomy.
//! Nothing in this crate performs I/O.

pub mod error;
pub mod filter;
pub mod health;
pub mod identity;
pub mod record;
pub mod router;
pub mod section;

pub use error::{ConfigError, RosterError, RosterResult, RouteError, StoreError, StoreResult};
pub use filter::{FilterExpr, FilterOperator, MAX_IN_VALUES};
pub use health::{HealthCheck, HealthStatus};
pub use identity::{normalize_identifier, PartitionName, PrimaryKey, SecondaryKey, Timestamp};
pub use record::{fields, Document, Record, UNKNOWN_DEPARTMENT};
pub use router::{
    DepartmentInfo, KeyRouter, ParsedIdentifier, MIN_IDENTIFIER_LEN, SECTION_OFFSET,
};
pub use section::{SectionEntry, SECTION_TABLE};

/// Routing metadata for one partition, as derived from the section table.
pub type PartitionDescriptor = DepartmentInfo;
