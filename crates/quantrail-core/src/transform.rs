//! Columnar-to-record response transform.
//!
//! The remote API answers with a field list plus value rows. Consumers want
//! keyed records, so each row is paired positionally with the field list:
//! short rows pad with absent values, long rows drop the excess, and key
//! order always follows the declared field order.

use serde::{Deserialize, Serialize};

use crate::params::Scalar;

/// Raw columnar payload produced by the transport boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnarTable {
    pub fields: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Vec<Scalar>>,
}

impl ColumnarTable {
    pub fn new(fields: Vec<String>, rows: Vec<Vec<Scalar>>) -> Self {
        Self { fields, rows }
    }

    pub fn empty() -> Self {
        Self {
            fields: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Transform into keyed records, one per input row.
    ///
    /// Runs in time linear in rows × fields; each row is consumed by a single
    /// iterator pass with no per-cell lookups.
    pub fn into_records(self) -> RecordSet {
        let fields = self.fields;
        let records = self
            .rows
            .into_iter()
            .map(|row| {
                let mut values = row.into_iter();
                let entries = fields
                    .iter()
                    .map(|field| (field.clone(), values.next()))
                    .collect();
                Record { entries }
            })
            .collect();
        RecordSet { records }
    }
}

/// One keyed record; `None` marks a field the source row did not cover,
/// distinct from an explicit [`Scalar::Null`] cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    entries: Vec<(String, Option<Scalar>)>,
}

impl Record {
    /// Value for `field`, or `None` when the field is absent or unknown.
    pub fn get(&self, field: &str) -> Option<&Scalar> {
        self.entries
            .iter()
            .find(|(name, _)| name == field)
            .and_then(|(_, value)| value.as_ref())
    }

    /// Whether the field exists in the record's key set, present or absent.
    pub fn contains_field(&self, field: &str) -> bool {
        self.entries.iter().any(|(name, _)| name == field)
    }

    /// Field names in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&Scalar>)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Ordered sequence of records produced from one columnar response.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecordSet {
    records: Vec<Record>,
}

impl RecordSet {
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }
}

impl IntoIterator for RecordSet {
    type Item = Record;
    type IntoIter = std::vec::IntoIter<Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}
