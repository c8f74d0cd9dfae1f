//! NetworkManager integration.
//!
//! [`Nmcli`] implements [`WifiManager`] by running the `nmcli` command-line
//! tool. A missing `nmcli` binary is reported as [`ScanError::Unavailable`],
//! a non-zero exit as [`ScanError::CommandFailed`] with both output streams.
//!
//! # Requirements
//!
//! - NetworkManager must be installed and running
//! - The `nmcli` command must be available in PATH
//! - User must have permission to manage network connections

use log::{debug, error, warn};
use std::io;
use std::process::{Command, Output};
use std::thread;
use std::time::Duration;

use crate::error::ScanError;
use crate::scan::{self, AccessPoint, WifiManager};

/// Fields requested from `nmcli device wifi list`, in parse order.
const LIST_FIELDS: &str = "SSID,IN-USE,CHAN,SIGNAL,SECURITY";

/// [`WifiManager`] backed by the `nmcli` command.
pub struct Nmcli {
    /// Appended as `ifname <interface>` to every device command.
    interface: Option<String>,
}

impl Nmcli {
    /// Creates a manager.
    ///
    /// # Arguments
    /// * `interface` - WiFi interface to scan and connect with (e.g. "wlan1");
    ///   `None` lets NetworkManager choose
    pub fn new(interface: Option<String>) -> Self {
        Nmcli { interface }
    }

    fn with_interface<'a>(&'a self, args: &[&'a str]) -> Vec<&'a str> {
        let mut all = args.to_vec();
        if let Some(ref iface) = self.interface {
            all.extend(["ifname", iface.as_str()]);
        }
        all
    }

    fn run(&self, args: &[&str]) -> Result<Output, ScanError> {
        debug!("running: nmcli {}", args.join(" "));
        Command::new("nmcli").args(args).output().map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ScanError::Unavailable,
            _ => ScanError::CommandFailed {
                stdout: String::new(),
                stderr: e.to_string(),
            },
        })
    }
}

impl WifiManager for Nmcli {
    /// # Commands Executed
    /// ```bash
    /// nmcli device wifi rescan [ifname <interface>]
    /// nmcli --get-values SSID,IN-USE,CHAN,SIGNAL,SECURITY device wifi list [ifname <interface>]
    /// ```
    fn list_networks(&self) -> Result<Vec<AccessPoint>, ScanError> {
        // Rescan can fail if a scan is already running; the listing still
        // returns the cached results in that case.
        if let Err(ScanError::Unavailable) = self.run(&self.with_interface(&["device", "wifi", "rescan"])) {
            return Err(ScanError::Unavailable);
        }
        // Give the adapter a moment to finish the scan
        thread::sleep(Duration::from_millis(500));

        let args = self.with_interface(&["--get-values", LIST_FIELDS, "device", "wifi", "list"]);
        let output = self.run(&args)?;
        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            error!("stdout:\n{}", stdout);
            error!("stderr:\n{}", stderr);
            return Err(ScanError::CommandFailed { stdout, stderr });
        }

        debug!("result of \"nmcli {}\":\nstdout:\n{}", args.join(" "), stdout);
        if stdout.is_empty() {
            warn!("no result from nmcli, try again");
        }

        Ok(scan::parse_networks(&stdout))
    }

    /// # Command Executed
    /// ```bash
    /// nmcli device wifi connect <ssid> [ifname <interface>]
    /// ```
    fn connect(&self, ssid: &str) -> Result<(), ScanError> {
        let output = self.run(&self.with_interface(&["device", "wifi", "connect", ssid]))?;

        if !output.status.success() {
            // nmcli reports some failures on stdout, so keep both
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            error!("stdout:\n{}", stdout.trim());
            error!("stderr:\n{}", stderr.trim());
            return Err(ScanError::ConnectFailed(ssid.to_string()));
        }

        debug!("connected to {}: {}", ssid, String::from_utf8_lossy(&output.stdout).trim());
        Ok(())
    }
}
