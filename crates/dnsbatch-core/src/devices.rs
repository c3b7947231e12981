// # Device Table
//
// Reads the operator's CSV device table. The header row names the columns;
// they are looked up by name, so column order does not matter.
//
// ```text
// Company,Gateway,url,ipaddress
// Acme,Front Desk,acme-fd,10.0.0.1
// Acme,Warehouse,acme-wh,10.0.0.2
// ```
//
// Only `url` and `ipaddress` are needed to build a change batch.
// `Company` and `Gateway` feed the inventory listing.

use crate::{Error, Result};
use std::fs::File;
use std::path::Path;

/// Column holding the company a device belongs to
pub const COLUMN_COMPANY: &str = "Company";
/// Column holding the gateway display label
pub const COLUMN_GATEWAY: &str = "Gateway";
/// Column holding the subdomain label
pub const COLUMN_URL: &str = "url";
/// Column holding the IPv4 address
pub const COLUMN_IPADDRESS: &str = "ipaddress";

/// Columns the change batch builder needs
pub const BATCH_COLUMNS: &[&str] = &[COLUMN_URL, COLUMN_IPADDRESS];

/// Columns the inventory listing needs
pub const INVENTORY_COLUMNS: &[&str] = &[COLUMN_COMPANY, COLUMN_GATEWAY, COLUMN_URL];

/// One line of the device table
///
/// Absent optional columns and short rows read as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceRow {
    pub company: String,
    pub gateway: String,
    pub url: String,
    pub ipaddress: String,
}

impl DeviceRow {
    /// Whether this row carries enough to become a DNS record
    pub fn is_addressable(&self) -> bool {
        !self.url.is_empty() && !self.ipaddress.is_empty()
    }
}

/// Read every row of a device table
///
/// # Parameters
///
/// - `path`: CSV file with a header row
/// - `required`: column names that must be present in the header
///
/// # Errors
///
/// - [`Error::Input`] if the path is not a readable file
/// - [`Error::MalformedInput`] if a required column is missing or the CSV
///   cannot be decoded
pub fn read_device_rows(path: &Path, required: &[&str]) -> Result<Vec<DeviceRow>> {
    if !path.is_file() {
        return Err(Error::input(format!("Cannot read {}: not a file", path.display())));
    }
    let file = File::open(path)
        .map_err(|e| Error::input(format!("Cannot read {}: {}", path.display(), e)))?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| read_error(path, e))?
        .clone();

    let index_of = |name: &str| headers.iter().position(|h| h == name);

    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|name| index_of(*name).is_none())
        .collect();
    if !missing.is_empty() {
        return Err(Error::malformed(format!(
            "{} is missing required column(s): {}",
            path.display(),
            missing.join(", ")
        )));
    }

    let company = index_of(COLUMN_COMPANY);
    let gateway = index_of(COLUMN_GATEWAY);
    let url = index_of(COLUMN_URL);
    let ipaddress = index_of(COLUMN_IPADDRESS);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| read_error(path, e))?;

        let field = |idx: Option<usize>| {
            idx.and_then(|i| record.get(i))
                .unwrap_or_default()
                .to_string()
        };

        rows.push(DeviceRow {
            company: field(company),
            gateway: field(gateway),
            url: field(url),
            ipaddress: field(ipaddress),
        });
    }

    tracing::debug!("Read {} device row(s) from {}", rows.len(), path.display());
    Ok(rows)
}

/// I/O failures mean the file is unreadable; anything else is bad content
fn read_error(path: &Path, err: csv::Error) -> Error {
    if err.is_io_error() {
        Error::input(format!("Cannot read {}: {}", path.display(), err))
    } else {
        Error::malformed(format!("{}: {}", path.display(), err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn table(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_reads_columns_by_name() {
        let file = table("ipaddress,url,Gateway,Company\n10.0.0.1,dev1,Lobby,Acme\n");

        let rows = read_device_rows(file.path(), BATCH_COLUMNS).unwrap();
        assert_eq!(
            rows,
            vec![DeviceRow {
                company: "Acme".to_string(),
                gateway: "Lobby".to_string(),
                url: "dev1".to_string(),
                ipaddress: "10.0.0.1".to_string(),
            }]
        );
    }

    #[test]
    fn test_optional_columns_may_be_absent() {
        let file = table("url,ipaddress\ndev1,10.0.0.1\n");

        let rows = read_device_rows(file.path(), BATCH_COLUMNS).unwrap();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].company.is_empty());
        assert!(rows[0].gateway.is_empty());
    }

    #[test]
    fn test_short_rows_read_as_empty() {
        let file = table("url,ipaddress\ndev1\n");

        let rows = read_device_rows(file.path(), BATCH_COLUMNS).unwrap();
        assert_eq!(rows[0].url, "dev1");
        assert_eq!(rows[0].ipaddress, "");
        assert!(!rows[0].is_addressable());
    }

    #[test]
    fn test_missing_required_column() {
        let file = table("Company,Gateway,url\nAcme,Lobby,dev1\n");

        let err = read_device_rows(file.path(), BATCH_COLUMNS).unwrap_err();
        assert!(matches!(err, Error::MalformedInput(ref msg) if msg.contains("ipaddress")));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_device_rows(&dir.path().join("nope.csv"), BATCH_COLUMNS).unwrap_err();
        assert!(matches!(err, Error::Input(_)));
    }

    #[test]
    fn test_directory_is_input_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_device_rows(dir.path(), BATCH_COLUMNS).unwrap_err();
        assert!(matches!(err, Error::Input(_)));
        assert!(err.is_input_error());
    }

    #[test]
    fn test_undecodable_content_is_malformed() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"url,ipaddress\ndev1,\xff\xfe\n").unwrap();

        let err = read_device_rows(file.path(), BATCH_COLUMNS).unwrap_err();
        assert!(matches!(err, Error::MalformedInput(_)));
    }

    #[test]
    fn test_header_only_table_is_empty() {
        let file = table("url,ipaddress\n");
        let rows = read_device_rows(file.path(), BATCH_COLUMNS).unwrap();
        assert!(rows.is_empty());
    }
}
