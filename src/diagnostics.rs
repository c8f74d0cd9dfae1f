//! Read-only diagnostic calls printed while listing devices.
//!
//! What gets called is table driven: each [`DetailLevel`] maps to an ordered
//! list of `(service, action, result key)` rows, or for the two highest
//! levels to every `Get*` action the device advertises.

use log::{info, warn};

use crate::device::{ActionResult, Device, DeviceControl};
use crate::report::result_line;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DetailLevel {
    Minimal,
    Extended,
    /// Every getter except the slow network scans.
    AllGetters,
    AllGettersWithScans,
}

impl DetailLevel {
    /// `list` starts at [`DetailLevel::Extended`]; each `-i` goes one higher.
    pub fn from_info_count(info: u8) -> Self {
        match info {
            0 => DetailLevel::Extended,
            1 => DetailLevel::AllGetters,
            _ => DetailLevel::AllGettersWithScans,
        }
    }
}

type Row = (&'static str, &'static str, Option<&'static str>);

const MINIMAL: &[Row] = &[
    ("basicevent", "GetFriendlyName", Some("FriendlyName")),
    ("basicevent", "GetMacAddr", None),
    ("metainfo", "GetMetaInfo", Some("MetaInfo")),
];

const EXTENDED: &[Row] = &[
    ("basicevent", "GetFriendlyName", Some("FriendlyName")),
    ("basicevent", "GetSignalStrength", Some("SignalStrength")),
    ("basicevent", "GetMacAddr", None),
    ("firmwareupdate", "GetFirmwareVersion", Some("FirmwareVersion")),
    ("metainfo", "GetMetaInfo", Some("MetaInfo")),
    ("metainfo", "GetExtMetaInfo", Some("ExtMetaInfo")),
    ("deviceinfo", "GetDeviceInformation", Some("DeviceInformation")),
];

/// Getters that make the device scan for networks and take several seconds.
const SLOW_ACTIONS: &[&str] = &["getaplist", "getnetworklist"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticCall {
    pub service: String,
    pub action: String,
    pub key: Option<String>,
}

impl DiagnosticCall {
    fn name(&self) -> String {
        format!("{}.{}", self.service, self.action)
    }
}

impl From<&Row> for DiagnosticCall {
    fn from(&(service, action, key): &Row) -> Self {
        DiagnosticCall {
            service: service.to_string(),
            action: action.to_string(),
            key: key.map(str::to_string),
        }
    }
}

/// The calls to make on `device` at `level`.
pub fn tier(device: &Device, level: DetailLevel) -> Vec<DiagnosticCall> {
    match level {
        DetailLevel::Minimal => MINIMAL.iter().map(DiagnosticCall::from).collect(),
        DetailLevel::Extended => EXTENDED.iter().map(DiagnosticCall::from).collect(),
        DetailLevel::AllGetters | DetailLevel::AllGettersWithScans => {
            let skip_slow = level == DetailLevel::AllGetters;
            device
                .services
                .iter()
                .flat_map(|(service, svc)| {
                    svc.actions.keys().map(move |action| (service.as_str(), action.as_str()))
                })
                .filter(|(_, action)| {
                    let lower = action.to_lowercase();
                    lower.starts_with("get") && !(skip_slow && SLOW_ACTIONS.contains(&lower.as_str()))
                })
                .map(|(service, action)| DiagnosticCall {
                    service: service.to_string(),
                    action: action.to_string(),
                    key: None,
                })
                .collect()
        }
    }
}

/// What happened to each call of one device's diagnostics.
#[derive(Debug, Default)]
pub struct DiagnosticReport {
    pub succeeded: Vec<String>,
    pub faults: Vec<(String, ActionResult)>,
    pub errors: Vec<String>,
}

/// Runs the diagnostics for one device and logs the results. Faults are
/// logged after the successful calls; call errors only produce a warning.
pub fn run<D: DeviceControl + ?Sized>(client: &D, device: &Device, level: DetailLevel) -> DiagnosticReport {
    let mut report = DiagnosticReport::default();

    for call in tier(device, level) {
        let name = call.name();
        let result = match client.invoke(device, &call.service, &call.action, &[]) {
            Ok(result) => result,
            Err(e) => {
                warn!("{}", result_line(&format!("Failed to get result for {}", name), &e));
                report.errors.push(name);
                continue;
            }
        };

        if result.is_fault() {
            report.faults.push((name, result));
            continue;
        }

        match call.key.as_deref().and_then(|key| result.get(key).map(|value| (key, value))) {
            Some((key, value)) => info!("{}", result_line(&format!("{}[{}]", name, key), &value)),
            None => info!("{}", result_line(&name, &result)),
        }
        report.succeeded.push(name);
    }

    if !report.faults.is_empty() {
        warn!(
            "    The results below resulted in an error.  This may be due to the action \
             no longer working or that the method requires an argument."
        );
    }
    for (name, result) in &report.faults {
        info!("{}", result_line(name, result));
    }

    report
}
