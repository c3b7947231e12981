//! Change batch builder
//!
//! Turns device rows into one batch of A-record upserts. The serialized
//! form matches the provider's change batch document:
//!
//! ```json
//! {
//!     "Changes": [
//!         {
//!             "Action": "UPSERT",
//!             "ResourceRecordSet": {
//!                 "Name": "dev1.lan",
//!                 "Type": "A",
//!                 "TTL": 300,
//!                 "ResourceRecords": [
//!                     {
//!                         "Value": "10.0.0.1"
//!                     }
//!                 ]
//!             }
//!         }
//!     ],
//!     "Comment": "Upserting all device aliases"
//! }
//! ```
//!
//! Rows without a url label or an address are left out. That is a filter,
//! not a validation failure: nothing is logged above debug level.

use crate::config::BatchConfig;
use crate::devices::{self, DeviceRow};
use crate::urlbase::UrlBase;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Record mutation kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeAction {
    /// Create the record, or replace it if it exists
    Upsert,
}

/// DNS record type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordType {
    /// IPv4 address record
    A,
}

/// One value of a record set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRecord {
    #[serde(rename = "Value")]
    pub value: String,
}

/// The record set an action applies to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRecordSet {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Type")]
    pub record_type: RecordType,
    #[serde(rename = "TTL")]
    pub ttl: u32,
    #[serde(rename = "ResourceRecords")]
    pub resource_records: Vec<ResourceRecord>,
}

/// A single upsert instruction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    #[serde(rename = "Action")]
    pub action: ChangeAction,
    #[serde(rename = "ResourceRecordSet")]
    pub record_set: ResourceRecordSet,
}

impl ChangeRecord {
    /// Build an A-record upsert
    pub fn upsert_a(name: impl Into<String>, value: impl Into<String>, ttl: u32) -> Self {
        Self {
            action: ChangeAction::Upsert,
            record_set: ResourceRecordSet {
                name: name.into(),
                record_type: RecordType::A,
                ttl,
                resource_records: vec![ResourceRecord {
                    value: value.into(),
                }],
            },
        }
    }

    /// Record name
    pub fn name(&self) -> &str {
        &self.record_set.name
    }

    /// First record value (the device address)
    pub fn value(&self) -> Option<&str> {
        self.record_set
            .resource_records
            .first()
            .map(|r| r.value.as_str())
    }
}

/// An ordered, atomic set of record changes
///
/// Built once per run and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeBatch {
    #[serde(rename = "Changes")]
    changes: Vec<ChangeRecord>,
    #[serde(rename = "Comment")]
    comment: String,
}

impl ChangeBatch {
    /// Build a batch from device rows
    ///
    /// Rows that are not addressable (empty url or empty address) are
    /// skipped. Row order is preserved.
    pub fn from_rows(rows: &[DeviceRow], url_base: &UrlBase, config: &BatchConfig) -> Self {
        let changes = rows
            .iter()
            .filter(|row| row.is_addressable())
            .map(|row| {
                ChangeRecord::upsert_a(url_base.record_name(&row.url), &row.ipaddress, config.ttl)
            })
            .collect::<Vec<_>>();

        tracing::debug!(
            "Built change batch: {} upsert(s), {} row(s) skipped",
            changes.len(),
            rows.len() - changes.len()
        );

        Self {
            changes,
            comment: config.comment.clone(),
        }
    }

    /// Read a device table and build its batch
    ///
    /// # Errors
    ///
    /// - [`Error::Input`](crate::Error::Input) if the file cannot be read
    /// - [`Error::MalformedInput`](crate::Error::MalformedInput) if the
    ///   `url` or `ipaddress` column is missing
    pub fn from_csv(path: &Path, url_base: &UrlBase, config: &BatchConfig) -> Result<Self> {
        let rows = devices::read_device_rows(path, devices::BATCH_COLUMNS)?;
        Ok(Self::from_rows(&rows, url_base, config))
    }

    /// Changes in submission order
    pub fn changes(&self) -> &[ChangeRecord] {
        &self.changes
    }

    /// Batch comment
    pub fn comment(&self) -> &str {
        &self.comment
    }

    /// Number of changes
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Whether the batch holds no changes
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Pretty JSON with 4-space indentation
    pub fn to_pretty_json(&self) -> Result<String> {
        let mut out = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
        self.serialize(&mut serializer)?;

        String::from_utf8(out).map_err(|e| crate::Error::Other(e.to_string()))
    }

    /// Write the pretty JSON document to a file, replacing it if present
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = self.to_pretty_json()?;
        std::fs::write(path, json).map_err(|e| {
            crate::Error::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to write {}: {}", path.display(), e),
            ))
        })?;

        tracing::info!("Wrote {} change(s) to {}", self.len(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(url: &str, ipaddress: &str) -> DeviceRow {
        DeviceRow {
            url: url.to_string(),
            ipaddress: ipaddress.to_string(),
            ..DeviceRow::default()
        }
    }

    #[test]
    fn test_incomplete_rows_are_skipped() {
        let rows = vec![
            row("dev1", "10.0.0.1"),
            row("dev2", ""),
            row("", "10.0.0.3"),
            row("", ""),
        ];
        let base = UrlBase::parse(".lan").unwrap();

        let batch = ChangeBatch::from_rows(&rows, &base, &BatchConfig::default());

        assert_eq!(batch.len(), 1);
        assert_eq!(batch.changes()[0].name(), "dev1.lan");
        assert_eq!(batch.changes()[0].value(), Some("10.0.0.1"));
    }

    #[test]
    fn test_record_fields_are_fixed() {
        let base = UrlBase::parse("example.com").unwrap();
        let batch = ChangeBatch::from_rows(&[row("cam", "192.168.1.9")], &base, &BatchConfig::default());

        let change = &batch.changes()[0];
        assert_eq!(change.action, ChangeAction::Upsert);
        assert_eq!(change.record_set.record_type, RecordType::A);
        assert_eq!(change.record_set.ttl, 300);
        assert_eq!(change.name(), "cam.example.com");
        assert_eq!(batch.comment(), "Upserting all device aliases");
    }

    #[test]
    fn test_row_order_is_preserved() {
        let base = UrlBase::parse(".lan").unwrap();
        let rows = vec![row("b", "10.0.0.2"), row("a", "10.0.0.1"), row("c", "10.0.0.3")];

        let batch = ChangeBatch::from_rows(&rows, &base, &BatchConfig::default());
        let names: Vec<&str> = batch.changes().iter().map(ChangeRecord::name).collect();
        assert_eq!(names, vec!["b.lan", "a.lan", "c.lan"]);
    }

    #[test]
    fn test_json_document_shape() {
        let base = UrlBase::parse(".lan").unwrap();
        let batch = ChangeBatch::from_rows(&[row("dev1", "10.0.0.1")], &base, &BatchConfig::default());

        let expected = r#"{
    "Changes": [
        {
            "Action": "UPSERT",
            "ResourceRecordSet": {
                "Name": "dev1.lan",
                "Type": "A",
                "TTL": 300,
                "ResourceRecords": [
                    {
                        "Value": "10.0.0.1"
                    }
                ]
            }
        }
    ],
    "Comment": "Upserting all device aliases"
}"#;
        assert_eq!(batch.to_pretty_json().unwrap(), expected);
    }

    #[test]
    fn test_empty_batch_serializes() {
        let base = UrlBase::parse(".lan").unwrap();
        let batch = ChangeBatch::from_rows(&[], &base, &BatchConfig::default());

        assert!(batch.is_empty());
        let value: serde_json::Value = serde_json::from_str(&batch.to_pretty_json().unwrap()).unwrap();
        assert_eq!(value["Changes"], serde_json::json!([]));
    }

    #[test]
    fn test_write_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("batch.json");
        let base = UrlBase::parse(".lan").unwrap();
        let batch = ChangeBatch::from_rows(&[row("dev1", "10.0.0.1")], &base, &BatchConfig::default());

        batch.write_json(&path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        let parsed: ChangeBatch = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed, batch);
    }
}
