// # Device Inventory
//
// Read-only listing of the device table, grouped by company:
//
// ```text
// == Acme
//   ↳ Front Desk ⇹  acme-fd.lan
//   ↳ Warehouse  ⇹  acme-wh.lan
//
// == Globex
//   ↳ Lab        ⇹  globex-lab.lan
//
// ```
//
// Gateways are padded to the longest gateway label in the whole table, so
// columns line up across companies. No network I/O happens here.

use crate::devices::{self, DeviceRow};
use crate::urlbase::UrlBase;
use crate::Result;
use std::fmt::Write as _;
use std::path::Path;

/// One device line of the listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryEntry {
    pub gateway: String,
    pub url: String,
}

/// Devices of one company, in table order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanyGroup {
    pub company: String,
    pub devices: Vec<InventoryEntry>,
}

/// The device table grouped by company, companies in first-seen order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceInventory {
    groups: Vec<CompanyGroup>,
    gateway_width: usize,
}

impl DeviceInventory {
    /// Group rows by company
    ///
    /// Unlike the change batch, rows without an address are kept.
    pub fn from_rows(rows: &[DeviceRow]) -> Self {
        let mut inventory = Self::default();

        for row in rows {
            let entry = InventoryEntry {
                gateway: row.gateway.clone(),
                url: row.url.clone(),
            };
            inventory.gateway_width = inventory.gateway_width.max(row.gateway.chars().count());

            match inventory.groups.iter_mut().find(|g| g.company == row.company) {
                Some(group) => group.devices.push(entry),
                None => inventory.groups.push(CompanyGroup {
                    company: row.company.clone(),
                    devices: vec![entry],
                }),
            }
        }

        inventory
    }

    /// Read a device table and group it
    ///
    /// Requires the `Company`, `Gateway` and `url` columns.
    pub fn from_csv(path: &Path) -> Result<Self> {
        let rows = devices::read_device_rows(path, devices::INVENTORY_COLUMNS)?;
        Ok(Self::from_rows(&rows))
    }

    /// Company groups in first-seen order
    pub fn groups(&self) -> &[CompanyGroup] {
        &self.groups
    }

    /// Render the aligned tree listing
    pub fn render(&self, url_base: &UrlBase) -> String {
        let mut out = String::new();

        for group in &self.groups {
            let _ = writeln!(out, "== {}", group.company);
            for device in &group.devices {
                let pad = self.gateway_width - device.gateway.chars().count();
                let _ = writeln!(
                    out,
                    "  \u{21B3} {}{} \u{21B9}  {}{}",
                    device.gateway,
                    " ".repeat(pad),
                    device.url,
                    url_base
                );
            }
            out.push('\n');
        }

        out
    }
}
