use thiserror::Error;

/// Failures talking to a device, as opposed to faults the device reports.
#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("HTTP request to {url} failed: {reason}")]
    Transport { url: String, reason: String },

    #[error("Malformed response from {0}: {1}")]
    MalformedResponse(String, String),

    #[error("Service '{0}' not available on this device")]
    MissingService(String),

    #[error("Action '{service}.{action}' not available on this device")]
    MissingAction { service: String, action: String },

    #[error("Action '{action}' expects arguments [{expected}] but got [{given}]")]
    ArgumentMismatch {
        action: String,
        expected: String,
        given: String,
    },

    #[error("Result of '{action}' has no '{key}' field")]
    MissingField { action: String, key: String },

    #[error("Discovery failed: {0}")]
    Discovery(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("nmcli command failed (NetworkManager must be installed)")]
    Unavailable,

    #[error("nmcli command failed")]
    CommandFailed { stdout: String, stderr: String },

    #[error("nmcli could not connect to '{0}' (network may not exist anymore or may no longer be reachable)")]
    ConnectFailed(String),
}

#[derive(Error, Debug)]
pub enum SetupError {
    #[error(transparent)]
    Scanner(#[from] ScanError),

    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error("--setup-all or --name=<str> is required")]
    MissingTarget,

    #[error("device named \"{0}\" not found")]
    DeviceNotFound(String),

    #[error(
        "No valid Wemo device AP's found. Try running this again, otherwise consider \
         directly connecting to the devices network and using the --name option."
    )]
    NoAccessPoints,

    #[error("device cannot see network \"{0}\"")]
    NetworkNotVisible(String),

    #[error("unsupported network security \"{0}\" (only OPEN and AES are supported)")]
    UnsupportedSecurity(String),

    #[error("password encryption failed: {0}")]
    Encryption(String),

    #[error("device rejected network settings: {0}")]
    Rejected(String),

    #[error("device failed to join \"{ssid}\" (network status {status})")]
    JoinFailed { ssid: String, status: String },

    #[error("device did not join \"{0}\" before the timeout")]
    Timeout(String),

    #[error("prompt failed: {0}")]
    Prompt(std::io::Error),
}

#[derive(Error, Debug)]
pub enum ResetError {
    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error("--reset-all or --name=<str> is required")]
    MissingTarget,

    #[error("device named \"{0}\" not found")]
    DeviceNotFound(String),

    #[error("no reset action requested (use --data, --wifi or --full)")]
    NoActionRequested,

    #[error("device {device} rejected reset: {response}")]
    Rejected { device: String, response: String },

    #[error("prompt failed: {0}")]
    Prompt(std::io::Error),
}
