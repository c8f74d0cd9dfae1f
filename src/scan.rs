//! WiFi access point scanning.
//!
//! Device access points are recognised by SSID prefix (`wemo.` by default,
//! e.g. `Wemo.Mini.3A1`). The scan also remembers which network the host is
//! currently on so it can be reconnected after onboarding.
//!
//! # Example
//!
//! ```no_run
//! use wemo_setup::connection::Nmcli;
//! use wemo_setup::scan::WifiManager;
//!
//! let result = Nmcli::new(None).scan("wemo.").expect("Scan failed");
//! for ap in &result.device_aps {
//!     println!("{}", ap.ssid);
//! }
//! ```

use log::{debug, info};

use crate::error::ScanError;

/// A network from the nmcli listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessPoint {
    pub ssid: String,

    /// True when the host is associated with this network.
    pub in_use: bool,

    pub channel: String,

    /// Signal strength as a percentage (0-100).
    pub signal: u8,

    /// Security type (e.g. "WPA2"); empty for open networks.
    pub security: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanResult {
    pub device_aps: Vec<AccessPoint>,
    /// First network listed as in use, if any.
    pub current: Option<String>,
}

/// Capability for listing and joining WiFi networks.
pub trait WifiManager {
    /// Triggers a rescan and lists every visible network.
    fn list_networks(&self) -> Result<Vec<AccessPoint>, ScanError>;

    /// Joins a network by SSID. Callers should let the link settle before
    /// using it.
    fn connect(&self, ssid: &str) -> Result<(), ScanError>;

    fn scan(&self, prefix: &str) -> Result<ScanResult, ScanError> {
        Ok(classify(self.list_networks()?, prefix))
    }
}

pub fn is_device_ap(ssid: &str, prefix: &str) -> bool {
    ssid.to_lowercase().starts_with(&prefix.to_lowercase())
}

/// Splits a listing into device access points and the current network.
pub fn classify(networks: Vec<AccessPoint>, prefix: &str) -> ScanResult {
    let mut result = ScanResult::default();
    for ap in networks {
        if ap.in_use {
            debug!(
                "current network: {} (channel={}, signal={}, security={})",
                ap.ssid, ap.channel, ap.signal, ap.security
            );
            // With several radios in use, only the first is restored.
            if result.current.is_none() {
                result.current = Some(ap.ssid.clone());
            }
        }
        if is_device_ap(&ap.ssid, prefix) {
            info!(
                "expected wemo ap: {} (channel={}, signal={}% {}, security={})",
                ap.ssid,
                ap.channel,
                ap.signal,
                signal_to_bar(ap.signal),
                ap.security
            );
            result.device_aps.push(ap);
        }
    }
    result
}

/// Parses `nmcli --get-values SSID,IN-USE,CHAN,SIGNAL,SECURITY` output.
///
/// Fields are split from the right so an SSID containing `:` survives, and
/// nmcli's `\:` escaping is undone.
pub fn parse_networks(stdout: &str) -> Vec<AccessPoint> {
    let mut networks = Vec::new();

    for line in stdout.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let parts: Vec<&str> = line.rsplitn(5, ':').collect();
        if parts.len() != 5 {
            debug!("skipping unparseable nmcli line: {}", line);
            continue;
        }

        networks.push(AccessPoint {
            ssid: unescape(parts[4]),
            in_use: parts[3].trim() == "*",
            channel: parts[2].to_string(),
            signal: parts[1].trim().parse().unwrap_or(0),
            security: parts[0].to_string(),
        });
    }

    networks
}

fn unescape(value: &str) -> String {
    value.replace("\\:", ":").replace("\\\\", "\\")
}

/// Converts a numeric signal strength to a 4 segment bar.
pub fn signal_to_bar(signal: u8) -> &'static str {
    match signal {
        80..=100 => "████",
        60..=79 => "███░",
        40..=59 => "██░░",
        20..=39 => "█░░░",
        _ => "░░░░",
    }
}
