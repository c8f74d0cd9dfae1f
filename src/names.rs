//! Device name mapping for bulk renames.
//!
//! The mapping file is a CSV with a header row followed by
//! `UDN,IP,Friendly Name` rows. A blank UDN means the row only matches by IP.
//! When a device matches both ways, the UDN row wins.

use anyhow::{Context, Result};
use csv::{ReaderBuilder, Trim};
use log::debug;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Friendly names keyed by device UDN and by IP address.
#[derive(Debug, Default)]
pub struct NameMapping {
    by_udn: HashMap<String, String>,
    by_ip: HashMap<String, String>,
    rows: usize,
}

impl NameMapping {
    /// Loads a mapping file.
    ///
    /// # Arguments
    /// * `path` - CSV file with a header row and `UDN,IP,Friendly Name` rows
    ///
    /// # Returns
    /// The mapping, or an error naming the file when it cannot be opened or
    /// is not valid CSV.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open name mapping: {}", path.display()))?;
        Self::from_reader(file)
            .with_context(|| format!("Failed to parse name mapping: {}", path.display()))
    }

    /// Skips the header, blank rows, rows with fewer than three fields, rows
    /// whose first field starts with `#`, and rows without a name.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, csv::Error> {
        let mut csv = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(Trim::None)
            .from_reader(reader);

        let mut by_udn = HashMap::new();
        let mut by_ip = HashMap::new();
        let mut rows = 0;

        for record in csv.records() {
            let record = record?;
            if record.len() < 3 || record[0].starts_with('#') {
                debug!("skipping name mapping row: {:?}", record);
                continue;
            }

            let udn = record[0].trim();
            let ip = record[1].trim();
            let name = record[2].trim();
            if name.is_empty() || (udn.is_empty() && ip.is_empty()) {
                continue;
            }
            rows += 1;
            if !udn.is_empty() {
                by_udn.insert(udn.to_string(), name.to_string());
            }
            if !ip.is_empty() {
                by_ip.insert(ip.to_string(), name.to_string());
            }
        }

        Ok(NameMapping { by_udn, by_ip, rows })
    }

    /// Target name for a device: the IP entry, overridden by the UDN entry.
    ///
    /// # Arguments
    /// * `udn` - Device UDN, e.g. `uuid:Socket-1_0-221517K0100000`
    /// * `ip` - Device host as discovered
    ///
    /// # Returns
    /// `None` when neither key has an entry.
    pub fn lookup(&self, udn: &str, ip: &str) -> Option<&str> {
        self.by_udn
            .get(udn)
            .or_else(|| self.by_ip.get(ip))
            .map(String::as_str)
    }

    /// Number of accepted rows. A row keyed by both UDN and IP counts once.
    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }
}
