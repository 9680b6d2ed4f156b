//! Student records and backing store documents.
//!
//! Documents are whatever the backing store returns: an id plus a loose JSON
//! field map. Records are built from documents exactly once, at the load
//! boundary, with documented defaults for every optional field.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::identity::{PartitionName, PrimaryKey, SecondaryKey, Timestamp};
use crate::router::{DepartmentInfo, KeyRouter};

/// Document field names used by the backing store.
pub mod fields {
    pub const ADMISSION_NUMBER: &str = "admissionNumber";
    pub const ROLL_NUMBER: &str = "rollNumber";
    pub const NAME: &str = "name";
    pub const DEPARTMENT: &str = "department";
    pub const DEPARTMENT_CODE: &str = "departmentCode";
    pub const YEAR: &str = "year";
    pub const ACTIVE: &str = "isActive";
    pub const CREATED_AT: &str = "createdAt";
    pub const UPDATED_AT: &str = "updatedAt";
    /// Pseudo field naming a document's decoded primary key in filters.
    ///
    /// Stores resolve it with [`Document::primary_key`](super::Document::primary_key).
    pub const PRIMARY_KEY: &str = "__key__";
}

/// Department name used when neither the document nor the router knows it.
pub const UNKNOWN_DEPARTMENT: &str = "Unknown";

/// Raw document as stored in a partition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Store assigned document id.
    pub id: String,
    /// Field map.
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl Document {
    /// Create a document with no fields.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: Map::new(),
        }
    }

    /// Set a field, builder style.
    pub fn with_field(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    /// Field value, if present and not null.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name).filter(|v| !v.is_null())
    }

    /// Field value rendered as a non-empty string.
    ///
    /// Numbers are accepted because roll numbers are often stored numerically.
    pub fn get_str(&self, name: &str) -> Option<String> {
        match self.get(name)? {
            Value::String(s) => {
                let s = s.trim();
                (!s.is_empty()).then(|| s.to_string())
            }
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Primary key: the admission number (string or numeric, trimmed), else
    /// the document id.
    pub fn primary_key(&self) -> String {
        self.get_str(fields::ADMISSION_NUMBER)
            .unwrap_or_else(|| self.id.clone())
    }

    /// Field value as a boolean.
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    /// Field value as an RFC 3339 timestamp.
    pub fn get_timestamp(&self, name: &str) -> Option<Timestamp> {
        self.get(name)
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }
}

/// A student record held in the directory cache.
///
/// Defaults applied by [`Record::from_document`]:
/// - `primary_key`: the document id when the admission number field is absent
/// - `secondary_key`: `None` when absent or empty (the record is then not
///   reachable by roll number)
/// - `department_name` / `department_code`: router metadata for the admission
///   number, then for the partition, then [`UNKNOWN_DEPARTMENT`]
/// - `year`: the four digit admission year decoded from the primary key
/// - `active`: `true`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Record {
    pub primary_key: PrimaryKey,
    pub secondary_key: Option<SecondaryKey>,
    pub display_name: String,
    pub department_name: String,
    pub department_code: String,
    pub year: Option<String>,
    pub active: bool,
    pub partition_name: PartitionName,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date-time"))]
    pub created_at: Option<Timestamp>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date-time"))]
    pub updated_at: Option<Timestamp>,
}

impl Record {
    /// Build a record from a document read out of `partition`.
    pub fn from_document(partition: &str, doc: &Document, router: &KeyRouter) -> Self {
        let primary_key = doc.primary_key();
        let parsed = router.parse(&primary_key);

        let derived: Option<DepartmentInfo> = parsed
            .as_ref()
            .map(|p| p.department())
            .or_else(|| router.department_for_partition(partition));

        let department_name = doc
            .get_str(fields::DEPARTMENT)
            .or_else(|| derived.as_ref().map(|d| d.department_name.clone()))
            .unwrap_or_else(|| UNKNOWN_DEPARTMENT.to_string());
        let department_code = doc
            .get_str(fields::DEPARTMENT_CODE)
            .or_else(|| derived.as_ref().map(|d| d.department_code.clone()))
            .unwrap_or_default();
        let year = doc
            .get_str(fields::YEAR)
            .or_else(|| parsed.as_ref().map(|p| p.admission_year().to_string()));

        Self {
            primary_key,
            secondary_key: doc.get_str(fields::ROLL_NUMBER),
            display_name: doc.get_str(fields::NAME).unwrap_or_default(),
            department_name,
            department_code,
            year,
            active: doc.get_bool(fields::ACTIVE).unwrap_or(true),
            partition_name: partition.to_string(),
            created_at: doc.get_timestamp(fields::CREATED_AT),
            updated_at: doc.get_timestamp(fields::UPDATED_AT),
        }
    }

    /// Whether the record can be indexed by roll number.
    pub fn has_secondary_key(&self) -> bool {
        self.secondary_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}
