//! Device model and the device-control capability.
//!
//! [`DeviceControl`] is the seam between the workflows and the network: the
//! real implementation lives in [`crate::wemo`], tests use in-memory fakes.
//! Reset and setup are provided methods built on [`DeviceControl::invoke`],
//! so an implementation only has to know how to discover devices and call
//! an action.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use crate::error::{DeviceError, ResetError, SetupError};
use crate::wemo::setup;

/// Result values accepted by `basicevent.ReSetup` as a successful reset.
const RESET_ACCEPTED: [&str; 2] = ["success", "reset_remote"];

/// A discovered device. Only lives for the duration of one command.
#[derive(Debug, Clone, Default)]
pub struct Device {
    pub name: String,
    pub udn: String,
    pub host: String,
    pub port: u16,
    pub model: String,
    pub serial: String,
    pub mac: String,
    /// URL of the UPnP description document the device was read from.
    pub location: String,
    pub services: BTreeMap<String, Service>,
}

#[derive(Debug, Clone, Default)]
pub struct Service {
    pub service_type: String,
    pub control_url: String,
    pub scpd_url: String,
    pub actions: BTreeMap<String, Action>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Action {
    pub name: String,
    /// Names of the input arguments, in declaration order.
    pub inputs: Vec<String>,
}

impl Device {
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// Case-insensitive exact match on the friendly name.
    pub fn matches_name(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.to_lowercase()
    }

    pub fn action(&self, service: &str, action: &str) -> Result<(&Service, &Action), DeviceError> {
        let svc = self
            .services
            .get(service)
            .ok_or_else(|| DeviceError::MissingService(service.to_string()))?;
        let act = svc.actions.get(action).ok_or_else(|| DeviceError::MissingAction {
            service: service.to_string(),
            action: action.to_string(),
        })?;
        Ok((svc, act))
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.model.is_empty() {
            write!(f, "\"{}\" @ {}", self.name, self.host)
        } else {
            write!(f, "\"{}\" ({} @ {})", self.name, self.model, self.host)
        }
    }
}

/// Onboarding state as reported by `WiFiSetup.GetNetworkStatus`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupState {
    Configured,
    NeedsSetup,
}

impl SetupState {
    pub fn from_network_status(status: &str) -> Self {
        if status.trim() == "1" {
            SetupState::Configured
        } else {
            SetupState::NeedsSetup
        }
    }
}

/// Key/value result of a single action call.
///
/// A result is a fault when the device delivered a SOAP fault instead of a
/// regular response; see [`ActionResult::is_fault`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActionResult(BTreeMap<String, String>);

impl ActionResult {
    pub fn new(values: BTreeMap<String, String>) -> Self {
        ActionResult(values)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn require(&self, action: &str, key: &str) -> Result<&str, DeviceError> {
        self.get(key).ok_or_else(|| DeviceError::MissingField {
            action: action.to_string(),
            key: key.to_string(),
        })
    }

    pub fn is_fault(&self) -> bool {
        self.get("faultstring")
            .is_some_and(|s| s.eq_ignore_ascii_case("upnperror"))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, String)> for ActionResult {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        ActionResult(iter.into_iter().collect())
    }
}

impl fmt::Display for ActionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(&self.0) {
            Ok(json) => f.write_str(&json),
            Err(_) => write!(f, "{:?}", self.0),
        }
    }
}

/// Capability for finding devices and calling their actions.
pub trait DeviceControl {
    /// Finds every responsive device. Order is unspecified.
    fn discover(&self) -> Result<Vec<Device>, DeviceError>;

    /// Calls `service.action` with the given input arguments.
    ///
    /// A fault reported by the device is returned as `Ok` with
    /// [`ActionResult::is_fault`] set; `Err` means the call itself failed.
    fn invoke(
        &self,
        device: &Device,
        service: &str,
        action: &str,
        args: &[(&str, &str)],
    ) -> Result<ActionResult, DeviceError>;

    fn setup_state(&self, device: &Device) -> Result<SetupState, DeviceError> {
        let result = self.invoke(device, "WiFiSetup", "GetNetworkStatus", &[])?;
        let status = result.require("GetNetworkStatus", "NetworkStatus")?;
        Ok(SetupState::from_network_status(status))
    }

    /// Requests a factory reset. The device reboots afterwards and drops off
    /// the network for roughly 90 seconds.
    fn reset(&self, device: &Device, clear_data: bool, clear_wifi: bool) -> Result<(), ResetError> {
        let code = reset_code(clear_data, clear_wifi).ok_or(ResetError::NoActionRequested)?;
        log::info!("resetting {} (data={}, wifi={})", device, clear_data, clear_wifi);

        let result = self.invoke(device, "basicevent", "ReSetup", &[("Reset", code)])?;
        match result.get("Reset") {
            Some(status) if RESET_ACCEPTED.contains(&status.trim()) => {
                log::info!("reset requested for {}: {}", device, status);
                Ok(())
            }
            _ => Err(ResetError::Rejected {
                device: device.to_string(),
                response: result.to_string(),
            }),
        }
    }

    /// Pushes home network credentials to a device that is in AP mode.
    fn setup(
        &self,
        device: &Device,
        ssid: &str,
        password: &str,
        timeout: Duration,
    ) -> Result<(), SetupError> {
        setup::push_credentials(self, device, ssid, password, timeout)
    }
}

/// `ReSetup` argument for the requested combination of flags.
pub fn reset_code(clear_data: bool, clear_wifi: bool) -> Option<&'static str> {
    match (clear_data, clear_wifi) {
        (true, true) => Some("2"),
        (true, false) => Some("1"),
        (false, true) => Some("5"),
        (false, false) => None,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::RefCell;

    pub fn device(name: &str, host: &str, udn: &str) -> Device {
        Device {
            name: name.to_string(),
            udn: udn.to_string(),
            host: host.to_string(),
            port: 49153,
            model: "Socket".to_string(),
            ..Default::default()
        }
    }

    pub fn result(pairs: &[(&str, &str)]) -> ActionResult {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    /// Answers every invocation with the same canned result.
    struct CannedControl {
        response: ActionResult,
        calls: RefCell<Vec<(String, String, Vec<(String, String)>)>>,
    }

    impl DeviceControl for CannedControl {
        fn discover(&self) -> Result<Vec<Device>, DeviceError> {
            Ok(vec![])
        }

        fn invoke(
            &self,
            _device: &Device,
            service: &str,
            action: &str,
            args: &[(&str, &str)],
        ) -> Result<ActionResult, DeviceError> {
            self.calls.borrow_mut().push((
                service.to_string(),
                action.to_string(),
                args.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            ));
            Ok(self.response.clone())
        }
    }

    fn canned(pairs: &[(&str, &str)]) -> CannedControl {
        CannedControl {
            response: result(pairs),
            calls: RefCell::new(vec![]),
        }
    }

    #[test]
    fn test_reset_code_selection() {
        assert_eq!(reset_code(true, true), Some("2"));
        assert_eq!(reset_code(true, false), Some("1"));
        assert_eq!(reset_code(false, true), Some("5"));
        assert_eq!(reset_code(false, false), None);
    }

    #[test]
    fn test_reset_sends_resetup() {
        let control = canned(&[("Reset", "success")]);
        let dev = device("Lamp", "10.0.0.5", "uuid:Socket-1");

        control.reset(&dev, true, true).unwrap();

        let calls = control.calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "basicevent");
        assert_eq!(calls[0].1, "ReSetup");
        assert_eq!(calls[0].2, vec![("Reset".to_string(), "2".to_string())]);
    }

    #[test]
    fn test_reset_accepts_reset_remote() {
        let control = canned(&[("Reset", "reset_remote")]);
        let dev = device("Lamp", "10.0.0.5", "uuid:Socket-1");
        assert!(control.reset(&dev, false, true).is_ok());
    }

    #[test]
    fn test_reset_rejected_on_fault() {
        let control = canned(&[("faultstring", "UPnPError"), ("errorCode", "-1")]);
        let dev = device("Lamp", "10.0.0.5", "uuid:Socket-1");
        assert!(matches!(
            control.reset(&dev, true, false),
            Err(ResetError::Rejected { .. })
        ));
    }

    #[test]
    fn test_reset_without_flags_makes_no_call() {
        let control = canned(&[("Reset", "success")]);
        let dev = device("Lamp", "10.0.0.5", "uuid:Socket-1");
        assert!(matches!(
            control.reset(&dev, false, false),
            Err(ResetError::NoActionRequested)
        ));
        assert!(control.calls.borrow().is_empty());
    }

    #[test]
    fn test_setup_state() {
        let dev = device("Lamp", "10.0.0.5", "uuid:Socket-1");
        let configured = canned(&[("NetworkStatus", "1")]);
        assert_eq!(configured.setup_state(&dev).unwrap(), SetupState::Configured);

        let unconfigured = canned(&[("NetworkStatus", "0")]);
        assert_eq!(unconfigured.setup_state(&dev).unwrap(), SetupState::NeedsSetup);

        let missing = canned(&[]);
        assert!(matches!(
            missing.setup_state(&dev),
            Err(DeviceError::MissingField { .. })
        ));
    }

    #[test]
    fn test_fault_marker() {
        assert!(result(&[("faultstring", "UPnPError")]).is_fault());
        assert!(result(&[("faultstring", "upnperror")]).is_fault());
        assert!(!result(&[("faultstring", "Client")]).is_fault());
        assert!(!result(&[("FriendlyName", "Lamp")]).is_fault());
    }

    #[test]
    fn test_matches_name_is_exact_and_case_insensitive() {
        let lamp = device("Lamp", "10.0.0.5", "uuid:1");
        assert!(lamp.matches_name("LAMP"));
        assert!(lamp.matches_name("lamp"));
        assert!(!lamp.matches_name("lamp2"));
        assert!(!lamp.matches_name("Lam"));
    }

    #[test]
    fn test_action_lookup_errors() {
        let mut dev = device("Lamp", "10.0.0.5", "uuid:1");
        let mut service = Service::default();
        service.actions.insert(
            "GetFriendlyName".to_string(),
            Action {
                name: "GetFriendlyName".to_string(),
                inputs: vec![],
            },
        );
        dev.services.insert("basicevent".to_string(), service);

        assert!(dev.action("basicevent", "GetFriendlyName").is_ok());
        assert!(matches!(
            dev.action("metainfo", "GetMetaInfo"),
            Err(DeviceError::MissingService(_))
        ));
        assert!(matches!(
            dev.action("basicevent", "GetMacAddr"),
            Err(DeviceError::MissingAction { .. })
        ));
    }

    #[test]
    fn test_result_display_is_json() {
        let r = result(&[("MacAddr", "AABBCCDDEEFF"), ("PluginUDN", "uuid:x")]);
        assert_eq!(r.to_string(), r#"{"MacAddr":"AABBCCDDEEFF","PluginUDN":"uuid:x"}"#);
    }
}
