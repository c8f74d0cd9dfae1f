//! Discover, rename, reset and onboard Belkin Wemo devices on the local
//! network without the vendor app.
//!
//! # Modules
//!
//! - [`config`] - Saved networks and tunable settings
//! - [`connection`] - Host WiFi control through nmcli
//! - [`device`] - Device model and the [`DeviceControl`] capability
//! - [`diagnostics`] - Read-only calls printed by `list`
//! - [`error`] - Error types for the library
//! - [`names`] - UDN/IP to friendly name mapping for renames
//! - [`prompt`] - Confirmation and password prompts
//! - [`report`] - Logger setup and output formatting
//! - [`scan`] - Device access point detection
//! - [`wemo`] - SSDP discovery and UPnP/SOAP action calls
//! - [`workflow`] - The list, rename, reset and setup commands
//!
//! # Example Usage
//!
//! ```no_run
//! use wemo_setup::{DeviceControl, WemoClient, config::Settings};
//!
//! let client = WemoClient::new(&Settings::default());
//! for device in client.discover().expect("Discovery failed") {
//!     println!("{}", device);
//! }
//! ```

/// Configuration module for saved home networks and tunable settings.
/// Reads and writes the TOML config file.
pub mod config;

/// NetworkManager integration: lists and joins WiFi networks through `nmcli`.
pub mod connection;

/// Device model, action results and the `DeviceControl` capability trait.
pub mod device;

/// Read-only diagnostic calls printed when listing devices.
pub mod diagnostics;

/// Error module defining the error types of each capability.
/// Uses `thiserror` for ergonomic error handling.
pub mod error;

/// Friendly name mapping loaded from a `UDN,IP,Friendly Name` CSV file.
pub mod names;

/// Interactive confirmation and hidden password prompts.
pub mod prompt;

/// Logger setup (log4rs) and log line formatting.
pub mod report;

/// Device access point detection and the `WifiManager` capability trait.
pub mod scan;

/// UPnP client for Wemo devices: SSDP discovery, description parsing,
/// SOAP action calls and WiFi onboarding.
pub mod wemo;

/// The list, rename, reset and setup commands, built on the capabilities.
pub mod workflow;

// Re-export the device model and capability for library users
pub use device::{ActionResult, Device, DeviceControl, SetupState};

// Re-export the error types
pub use error::{DeviceError, ResetError, ScanError, SetupError};

pub use scan::{AccessPoint, WifiManager};

pub use wemo::WemoClient;

pub use workflow::{ResetOptions, SetupOptions, Workflow};
