//! Command workflows: discover, select, act, report.
//!
//! Every workflow runs strictly one device (or access point) at a time.
//! Joining a device AP moves the host's only WiFi link, and confirmation
//! prompts need the terminal, so nothing here runs in parallel.

use log::{debug, error, info, warn};
use std::thread;

use crate::config::Settings;
use crate::device::{Device, DeviceControl, SetupState, reset_code};
use crate::diagnostics::{self, DetailLevel};
use crate::error::{DeviceError, ResetError, SetupError};
use crate::names::NameMapping;
use crate::prompt::Prompt;
use crate::report::separator;
use crate::scan::{WifiManager, is_device_ap};

/// What `reset` should do and to which devices.
#[derive(Debug, Clone, Default)]
pub struct ResetOptions {
    /// Reset every discovered device after a confirmation.
    pub all: bool,

    /// Friendly name of the single device to reset. Ignored when `all` is set.
    pub name: Option<String>,

    /// Clear name, rules and icon.
    pub clear_data: bool,

    /// Clear the saved WiFi network.
    pub clear_wifi: bool,
}

/// Target network and devices for `setup`.
#[derive(Debug, Clone, Default)]
pub struct SetupOptions {
    /// Network the devices should join.
    pub ssid: String,
    /// Prompted for when missing.
    pub password: Option<String>,
    /// Join every device access point in range and set up what is found.
    pub all: bool,
    /// Friendly name of a device already reachable from this host.
    pub name: Option<String>,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct RenameSummary {
    pub renamed: usize,
    pub unmatched: usize,
    pub failed: usize,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ResetSummary {
    pub attempted: usize,
    pub succeeded: usize,
    /// Display names of the devices whose reset failed.
    pub failed: Vec<String>,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SetupSummary {
    /// Device access points found by the scan (setup-all only).
    pub access_points: usize,
    /// Devices that joined the target network.
    pub configured: usize,
    /// SSIDs of the access points that were skipped after an error.
    pub failed: Vec<String>,
}

/// Runs the commands against a device capability `D`, a WiFi capability `W`
/// and a prompt `P`.
///
/// # Example
///
/// ```no_run
/// use wemo_setup::config::Settings;
/// use wemo_setup::connection::Nmcli;
/// use wemo_setup::diagnostics::DetailLevel;
/// use wemo_setup::prompt::Terminal;
/// use wemo_setup::{WemoClient, Workflow};
///
/// let settings = Settings::default();
/// let workflow = Workflow::new(WemoClient::new(&settings), Nmcli::new(None), Terminal, settings);
/// let devices = workflow.list(DetailLevel::Minimal).expect("Discovery failed");
/// println!("{} devices", devices.len());
/// ```
pub struct Workflow<D, W, P> {
    devices: D,
    wifi: W,
    prompt: P,
    settings: Settings,
}

/// First device whose friendly name matches, ignoring case.
pub fn select_by_name<'a>(devices: &'a [Device], name: &str) -> Option<&'a Device> {
    devices.iter().find(|d| d.matches_name(name))
}

impl<D: DeviceControl, W: WifiManager, P: Prompt> Workflow<D, W, P> {
    pub fn new(devices: D, wifi: W, prompt: P, settings: Settings) -> Self {
        Workflow {
            devices,
            wifi,
            prompt,
            settings,
        }
    }

    /// Discovers every device and logs diagnostics for each at `level`.
    ///
    /// Every other command starts with this at [`DetailLevel::Minimal`], so the
    /// user always sees what was found before anything is changed.
    ///
    /// # Returns
    /// The discovered devices, possibly none. `found N devices` is logged last.
    ///
    /// # Errors
    /// Only a failure of discovery itself. Diagnostic call failures are
    /// logged as warnings.
    pub fn list(&self, level: DetailLevel) -> Result<Vec<Device>, DeviceError> {
        let devices = self.devices.discover()?;
        for device in &devices {
            info!("{}", separator());
            info!("found device: {}", device);
            diagnostics::run(&self.devices, device, level);
        }
        if !devices.is_empty() {
            info!("{}", separator());
        }
        info!("found {} devices", devices.len());
        Ok(devices)
    }

    /// Renames each discovered device that has an entry in `names`.
    ///
    /// The UDN entry wins over the IP entry. Devices without an entry are
    /// logged and left alone; a failed `ChangeFriendlyName` is logged and
    /// counted, and the remaining devices are still renamed.
    ///
    /// # Arguments
    /// * `names` - Mapping loaded with [`NameMapping::load`]
    ///
    /// # Returns
    /// A [`RenameSummary`] of renamed, unmatched and failed devices.
    pub fn rename(&self, names: &NameMapping) -> Result<RenameSummary, DeviceError> {
        let devices = self.list(DetailLevel::Minimal)?;
        let mut summary = RenameSummary::default();

        for device in &devices {
            let Some(name) = names.lookup(&device.udn, &device.host) else {
                info!(
                    "no name found for device {} with UDN=\"{}\" and IP=\"{}\"",
                    device, device.udn, device.host
                );
                summary.unmatched += 1;
                continue;
            };

            info!("changing {} name to: {}", device, name);
            match self
                .devices
                .invoke(device, "basicevent", "ChangeFriendlyName", &[("FriendlyName", name)])
            {
                Ok(result) if !result.is_fault() => summary.renamed += 1,
                Ok(result) => {
                    error!("rename of {} failed: {}", device, result);
                    summary.failed += 1;
                }
                Err(e) => {
                    error!("rename of {} failed: {}", device, e);
                    summary.failed += 1;
                }
            }
        }

        Ok(summary)
    }

    /// Factory resets one device by name, or every discovered device.
    ///
    /// Reset-all asks for confirmation once, after listing the devices, and
    /// is skipped entirely when nothing was found. Per-device failures are
    /// logged and skipped.
    ///
    /// # Errors
    /// * [`ResetError::MissingTarget`] - neither `all` nor `name` given
    /// * [`ResetError::NoActionRequested`] - neither data nor WiFi selected
    /// * [`ResetError::DeviceNotFound`] - no device has the given name
    /// * any error of the single named reset
    pub fn reset(&self, options: &ResetOptions) -> Result<ResetSummary, ResetError> {
        if !options.all && options.name.is_none() {
            return Err(ResetError::MissingTarget);
        }
        if reset_code(options.clear_data, options.clear_wifi).is_none() {
            return Err(ResetError::NoActionRequested);
        }

        if options.all {
            return self.reset_all(options);
        }

        let Some(ref name) = options.name else {
            return Err(ResetError::MissingTarget);
        };
        let devices = self.list(DetailLevel::Minimal)?;
        let device = select_by_name(&devices, name)
            .ok_or_else(|| ResetError::DeviceNotFound(name.clone()))?;

        self.devices.reset(device, options.clear_data, options.clear_wifi)?;
        info!("devices will take approximately 90 seconds to reset");
        Ok(ResetSummary {
            attempted: 1,
            succeeded: 1,
            failed: vec![],
        })
    }

    fn reset_all(&self, options: &ResetOptions) -> Result<ResetSummary, ResetError> {
        let devices = self.list(DetailLevel::Minimal)?;
        if let Some(ref name) = options.name {
            warn!("name \"{}\" ignored, all discovered devices will be reset", name);
        }

        let mut summary = ResetSummary::default();
        if devices.is_empty() {
            return Ok(summary);
        }

        let question = format!(
            "Are you sure you want to reset all {} devices listed above?",
            devices.len()
        );
        if !self.prompt.confirm(&question).map_err(ResetError::Prompt)? {
            info!("reset cancelled");
            return Ok(summary);
        }

        for device in &devices {
            info!("{}", separator());
            summary.attempted += 1;
            match self.devices.reset(device, options.clear_data, options.clear_wifi) {
                Ok(()) => summary.succeeded += 1,
                Err(e) => {
                    error!("{}", e);
                    error!("|-- thus skipping: {}", device);
                    summary.failed.push(device.to_string());
                }
            }
        }
        info!("{}", separator());

        if summary.succeeded > 0 {
            info!("devices will take approximately 90 seconds to reset");
        }
        Ok(summary)
    }

    /// Sends home network credentials to devices in setup mode.
    ///
    /// With `all`, every device access point in range is joined in turn and
    /// each device on it that reports it is not set up is configured. An
    /// access point that fails is logged and skipped. Afterwards the host is
    /// reconnected to the network it started on, unless that was itself a
    /// device access point.
    ///
    /// With `name`, the named device must already be reachable.
    ///
    /// # Errors
    /// * [`SetupError::MissingTarget`] - neither `all` nor `name` given
    /// * [`SetupError::NoAccessPoints`] - the scan found no device access point
    /// * [`SetupError::DeviceNotFound`] - no device has the given name
    /// * any scan error, or any error of the single named setup
    pub fn setup(&self, options: &SetupOptions) -> Result<SetupSummary, SetupError> {
        info!("{}", separator());
        info!("NOTE: If some or all devices fail to connect, try re-running the same command a second time!");
        info!("{}", separator());

        if options.all {
            self.setup_all(options)
        } else if let Some(ref name) = options.name {
            self.setup_named(name, options)
        } else {
            Err(SetupError::MissingTarget)
        }
    }

    fn setup_named(&self, name: &str, options: &SetupOptions) -> Result<SetupSummary, SetupError> {
        let devices = self.list(DetailLevel::Minimal)?;
        let device = select_by_name(&devices, name)
            .ok_or_else(|| SetupError::DeviceNotFound(name.to_string()))?;

        let password = self.password(options)?;
        self.devices
            .setup(device, &options.ssid, &password, self.settings.setup_timeout())?;
        Ok(SetupSummary {
            access_points: 0,
            configured: 1,
            failed: vec![],
        })
    }

    fn setup_all(&self, options: &SetupOptions) -> Result<SetupSummary, SetupError> {
        let scan = self.wifi.scan(&self.settings.ap_prefix)?;
        if scan.device_aps.is_empty() {
            return Err(SetupError::NoAccessPoints);
        }

        let question = format!(
            "Are you sure you want to setup all {} \"expected wemo\" devices listed above?",
            scan.device_aps.len()
        );
        if !self.prompt.confirm(&question).map_err(SetupError::Prompt)? {
            info!("setup cancelled");
            return Ok(SetupSummary::default());
        }
        info!("{}", separator());

        let password = self.password(options)?;
        let mut summary = SetupSummary {
            access_points: scan.device_aps.len(),
            ..Default::default()
        };

        for ap in &scan.device_aps {
            info!("{}", separator());
            match self.connect_and_setup(&ap.ssid, &options.ssid, &password) {
                Ok(configured) => summary.configured += configured,
                Err(e) => {
                    error!("{}", e);
                    error!("|-- thus skipping: {}", ap.ssid);
                    summary.failed.push(ap.ssid.clone());
                }
            }
        }
        info!("{}", separator());

        if let Some(ref current) = scan.current {
            if !is_device_ap(current, &self.settings.ap_prefix) {
                info!("attempting to reconnect host to {}", current);
                // The OS usually reconnects on its own if this fails.
                if let Err(e) = self.wifi.connect(current) {
                    debug!("reconnect to {} failed: {}", current, e);
                }
            }
        }

        Ok(summary)
    }

    /// Joins one device AP and sets up every device on it that needs it.
    fn connect_and_setup(&self, ap_ssid: &str, ssid: &str, password: &str) -> Result<usize, SetupError> {
        self.wifi.connect(ap_ssid)?;
        thread::sleep(self.settings.settle_delay());

        info!("searching {} for wemo devices", ap_ssid);
        let devices = self.discover_needing_setup()?;
        for device in &devices {
            self.devices
                .setup(device, ssid, password, self.settings.setup_timeout())?;
        }
        Ok(devices.len())
    }

    /// Discovers devices and keeps the ones reporting they are not set up.
    /// A device whose status cannot be read is logged and left out.
    pub fn discover_needing_setup(&self) -> Result<Vec<Device>, DeviceError> {
        let mut pending = Vec::new();
        for device in self.devices.discover()? {
            match self.devices.setup_state(&device) {
                Ok(SetupState::NeedsSetup) => {
                    info!("found device needing setup: {}", device);
                    pending.push(device);
                }
                Ok(SetupState::Configured) => debug!("{} is already set up", device),
                Err(e) => warn!("could not read setup status of {}: {}", device, e),
            }
        }
        Ok(pending)
    }

    /// The given password, or a hidden prompt when there is none.
    fn password(&self, options: &SetupOptions) -> Result<String, SetupError> {
        match options.password {
            Some(ref password) => Ok(password.clone()),
            None => self.prompt.password().map_err(SetupError::Prompt),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::ActionResult;
    use crate::device::tests::{device, result};
    use crate::error::ScanError;
    use crate::scan::AccessPoint;
    use crate::scan::tests::ap;
    use std::cell::{Cell, RefCell};
    use std::io;
    use std::time::Duration;

    #[derive(Default)]
    struct FakeDevices {
        devices: Vec<Device>,
        /// UDNs whose reset fails.
        failing_resets: Vec<String>,
        /// UDNs that report they are already configured.
        configured: Vec<String>,
        invocations: RefCell<Vec<(String, String, Vec<(String, String)>)>>,
        resets: RefCell<Vec<String>>,
        setups: RefCell<Vec<(String, String, String)>>,
        discoveries: Cell<usize>,
    }

    impl DeviceControl for FakeDevices {
        fn discover(&self) -> Result<Vec<Device>, DeviceError> {
            self.discoveries.set(self.discoveries.get() + 1);
            Ok(self.devices.clone())
        }

        fn invoke(
            &self,
            device: &Device,
            _service: &str,
            action: &str,
            args: &[(&str, &str)],
        ) -> Result<ActionResult, DeviceError> {
            self.invocations.borrow_mut().push((
                device.udn.clone(),
                action.to_string(),
                args.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            ));
            match action {
                "GetNetworkStatus" if self.configured.contains(&device.udn) => {
                    Ok(result(&[("NetworkStatus", "1")]))
                }
                "GetNetworkStatus" => Ok(result(&[("NetworkStatus", "0")])),
                "GetFriendlyName" => Ok(result(&[("FriendlyName", device.name.as_str())])),
                "ChangeFriendlyName" => Ok(result(&[("FriendlyName", args[0].1)])),
                _ => Ok(result(&[])),
            }
        }

        fn reset(&self, device: &Device, _clear_data: bool, _clear_wifi: bool) -> Result<(), ResetError> {
            self.resets.borrow_mut().push(device.name.clone());
            if self.failing_resets.contains(&device.udn) {
                return Err(ResetError::Rejected {
                    device: device.to_string(),
                    response: "{}".to_string(),
                });
            }
            Ok(())
        }

        fn setup(
            &self,
            device: &Device,
            ssid: &str,
            password: &str,
            _timeout: Duration,
        ) -> Result<(), SetupError> {
            self.setups.borrow_mut().push((
                device.name.clone(),
                ssid.to_string(),
                password.to_string(),
            ));
            Ok(())
        }
    }

    impl FakeDevices {
        fn renames(&self) -> Vec<(String, String)> {
            self.invocations
                .borrow()
                .iter()
                .filter(|(_, action, _)| action == "ChangeFriendlyName")
                .map(|(udn, _, args)| (udn.clone(), args[0].1.clone()))
                .collect()
        }
    }

    #[derive(Default)]
    struct FakeWifi {
        networks: Vec<AccessPoint>,
        failing: Vec<String>,
        connects: RefCell<Vec<String>>,
    }

    impl WifiManager for FakeWifi {
        fn list_networks(&self) -> Result<Vec<AccessPoint>, ScanError> {
            Ok(self.networks.clone())
        }

        fn connect(&self, ssid: &str) -> Result<(), ScanError> {
            self.connects.borrow_mut().push(ssid.to_string());
            if self.failing.iter().any(|s| s == ssid) {
                return Err(ScanError::ConnectFailed(ssid.to_string()));
            }
            Ok(())
        }
    }

    struct FakePrompt {
        answer: bool,
        confirms: Cell<usize>,
        passwords: Cell<usize>,
    }

    impl FakePrompt {
        fn answering(answer: bool) -> Self {
            FakePrompt {
                answer,
                confirms: Cell::new(0),
                passwords: Cell::new(0),
            }
        }
    }

    impl Prompt for FakePrompt {
        fn confirm(&self, _question: &str) -> io::Result<bool> {
            self.confirms.set(self.confirms.get() + 1);
            Ok(self.answer)
        }

        fn password(&self) -> io::Result<String> {
            self.passwords.set(self.passwords.get() + 1);
            Ok("prompted".to_string())
        }
    }

    fn settings() -> Settings {
        Settings {
            settle_delay_ms: 0,
            ..Default::default()
        }
    }

    fn workflow(devices: FakeDevices, wifi: FakeWifi, answer: bool) -> Workflow<FakeDevices, FakeWifi, FakePrompt> {
        Workflow::new(devices, wifi, FakePrompt::answering(answer), settings())
    }

    fn reset_all() -> ResetOptions {
        ResetOptions {
            all: true,
            name: None,
            clear_data: true,
            clear_wifi: true,
        }
    }

    fn reset_named(name: &str) -> ResetOptions {
        ResetOptions {
            all: false,
            name: Some(name.to_string()),
            clear_data: true,
            clear_wifi: false,
        }
    }

    #[test]
    fn test_rename_prefers_udn_over_ip() {
        let names = NameMapping::from_reader(
            "UDN,IP,Friendly Name\nuuid:A,,Porch\n,10.0.0.5,Kitchen Light\n,10.0.0.6,Den\n".as_bytes(),
        )
        .unwrap();
        let devices = FakeDevices {
            devices: vec![
                device("Socket", "10.0.0.5", "uuid:A"),
                device("Socket", "10.0.0.6", "uuid:B"),
                device("Socket", "10.0.0.7", "uuid:C"),
            ],
            ..Default::default()
        };
        let wf = workflow(devices, FakeWifi::default(), true);

        let summary = wf.rename(&names).unwrap();

        assert_eq!(
            summary,
            RenameSummary {
                renamed: 2,
                unmatched: 1,
                failed: 0
            }
        );
        assert_eq!(
            wf.devices.renames(),
            vec![
                ("uuid:A".to_string(), "Porch".to_string()),
                ("uuid:B".to_string(), "Den".to_string()),
            ]
        );
    }

    #[test]
    fn test_reset_all_skips_failures() {
        let devices = FakeDevices {
            devices: vec![
                device("One", "10.0.0.1", "uuid:1"),
                device("Two", "10.0.0.2", "uuid:2"),
                device("Three", "10.0.0.3", "uuid:3"),
                device("Four", "10.0.0.4", "uuid:4"),
            ],
            failing_resets: vec!["uuid:2".to_string(), "uuid:4".to_string()],
            ..Default::default()
        };
        let wf = workflow(devices, FakeWifi::default(), true);

        let summary = wf.reset(&reset_all()).unwrap();

        assert_eq!(summary.attempted, 4);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed.len(), 2);
        assert_eq!(wf.devices.resets.borrow().len(), 4);
        assert_eq!(wf.prompt.confirms.get(), 1);
    }

    #[test]
    fn test_reset_all_declined() {
        let devices = FakeDevices {
            devices: vec![device("One", "10.0.0.1", "uuid:1")],
            ..Default::default()
        };
        let wf = workflow(devices, FakeWifi::default(), false);

        let summary = wf.reset(&reset_all()).unwrap();

        assert_eq!(summary, ResetSummary::default());
        assert!(wf.devices.resets.borrow().is_empty());
    }

    #[test]
    fn test_reset_all_ignores_name() {
        let devices = FakeDevices {
            devices: vec![device("One", "10.0.0.1", "uuid:1"), device("Two", "10.0.0.2", "uuid:2")],
            ..Default::default()
        };
        let wf = workflow(devices, FakeWifi::default(), true);
        let options = ResetOptions {
            name: Some("One".to_string()),
            ..reset_all()
        };

        let summary = wf.reset(&options).unwrap();
        assert_eq!(summary.succeeded, 2);
    }

    #[test]
    fn test_reset_named_selects_exact_match_only() {
        let devices = FakeDevices {
            devices: vec![device("lamp2", "10.0.0.2", "uuid:2"), device("Lamp", "10.0.0.1", "uuid:1")],
            ..Default::default()
        };
        let wf = workflow(devices, FakeWifi::default(), true);

        wf.reset(&reset_named("LAMP")).unwrap();

        assert_eq!(*wf.devices.resets.borrow(), vec!["Lamp".to_string()]);
        assert_eq!(wf.prompt.confirms.get(), 0);
    }

    #[test]
    fn test_reset_named_first_match_wins() {
        let devices = FakeDevices {
            devices: vec![device("Lamp", "10.0.0.1", "uuid:1"), device("LAMP", "10.0.0.2", "uuid:2")],
            ..Default::default()
        };
        let wf = workflow(devices, FakeWifi::default(), true);

        wf.reset(&reset_named("lamp")).unwrap();

        assert_eq!(*wf.devices.resets.borrow(), vec!["Lamp".to_string()]);
    }

    #[test]
    fn test_reset_named_not_found() {
        let devices = FakeDevices {
            devices: vec![device("Lamp", "10.0.0.1", "uuid:1")],
            ..Default::default()
        };
        let wf = workflow(devices, FakeWifi::default(), true);

        assert!(matches!(
            wf.reset(&reset_named("Porch")),
            Err(ResetError::DeviceNotFound(name)) if name == "Porch"
        ));
        assert!(wf.devices.resets.borrow().is_empty());
    }

    #[test]
    fn test_reset_requires_target_and_action() {
        let wf = workflow(FakeDevices::default(), FakeWifi::default(), true);

        assert!(matches!(
            wf.reset(&ResetOptions {
                clear_data: true,
                ..Default::default()
            }),
            Err(ResetError::MissingTarget)
        ));
        assert!(matches!(
            wf.reset(&ResetOptions {
                all: true,
                ..Default::default()
            }),
            Err(ResetError::NoActionRequested)
        ));
        assert_eq!(wf.devices.discoveries.get(), 0);
    }

    #[test]
    fn test_zero_devices_does_nothing() {
        let wf = workflow(FakeDevices::default(), FakeWifi::default(), true);

        assert!(wf.list(DetailLevel::Extended).unwrap().is_empty());
        assert_eq!(wf.rename(&NameMapping::default()).unwrap(), RenameSummary::default());
        assert_eq!(wf.reset(&reset_all()).unwrap(), ResetSummary::default());
        assert!(matches!(
            wf.setup(&SetupOptions {
                ssid: "HomeNet".to_string(),
                all: true,
                ..Default::default()
            }),
            Err(SetupError::NoAccessPoints)
        ));
        assert!(matches!(
            wf.setup(&SetupOptions {
                ssid: "HomeNet".to_string(),
                name: Some("Lamp".to_string()),
                ..Default::default()
            }),
            Err(SetupError::DeviceNotFound(_))
        ));

        assert_eq!(wf.prompt.confirms.get(), 0);
        assert_eq!(wf.prompt.passwords.get(), 0);
        assert!(wf.devices.invocations.borrow().is_empty());
        assert!(wf.devices.resets.borrow().is_empty());
        assert!(wf.devices.setups.borrow().is_empty());
    }

    #[test]
    fn test_setup_all_continues_past_failed_access_point() {
        let devices = FakeDevices {
            devices: vec![
                device("Wemo Mini", "10.22.22.1", "uuid:new"),
                device("Porch", "10.22.22.1", "uuid:old"),
            ],
            configured: vec!["uuid:old".to_string()],
            ..Default::default()
        };
        let wifi = FakeWifi {
            networks: vec![
                ap("HomeNet", true),
                ap("wemo.livingroom", false),
                ap("WEMO.KITCHEN", false),
                ap("mywemodevice", false),
            ],
            failing: vec!["WEMO.KITCHEN".to_string()],
            ..Default::default()
        };
        let wf = workflow(devices, wifi, true);

        let summary = wf
            .setup(&SetupOptions {
                ssid: "HomeNet".to_string(),
                password: None,
                all: true,
                name: None,
            })
            .unwrap();

        assert_eq!(
            summary,
            SetupSummary {
                access_points: 2,
                configured: 1,
                failed: vec!["WEMO.KITCHEN".to_string()],
            }
        );
        assert_eq!(
            *wf.wifi.connects.borrow(),
            vec!["wemo.livingroom", "WEMO.KITCHEN", "HomeNet"]
        );
        assert_eq!(
            *wf.devices.setups.borrow(),
            vec![(
                "Wemo Mini".to_string(),
                "HomeNet".to_string(),
                "prompted".to_string()
            )]
        );
        assert_eq!(wf.prompt.confirms.get(), 1);
        assert_eq!(wf.prompt.passwords.get(), 1);
    }

    #[test]
    fn test_setup_all_does_not_reconnect_to_device_ap() {
        let wifi = FakeWifi {
            networks: vec![ap("Wemo.Mini.3A1", true)],
            ..Default::default()
        };
        let wf = workflow(FakeDevices::default(), wifi, true);

        wf.setup(&SetupOptions {
            ssid: "HomeNet".to_string(),
            password: Some("secret".to_string()),
            all: true,
            name: None,
        })
        .unwrap();

        assert_eq!(*wf.wifi.connects.borrow(), vec!["Wemo.Mini.3A1"]);
        assert_eq!(wf.prompt.passwords.get(), 0);
    }

    #[test]
    fn test_setup_all_declined() {
        let wifi = FakeWifi {
            networks: vec![ap("wemo.livingroom", false)],
            ..Default::default()
        };
        let wf = workflow(FakeDevices::default(), wifi, false);

        let summary = wf
            .setup(&SetupOptions {
                ssid: "HomeNet".to_string(),
                all: true,
                ..Default::default()
            })
            .unwrap();

        assert_eq!(summary, SetupSummary::default());
        assert!(wf.wifi.connects.borrow().is_empty());
    }

    #[test]
    fn test_setup_named() {
        let devices = FakeDevices {
            devices: vec![device("Lamp", "10.22.22.1", "uuid:1")],
            ..Default::default()
        };
        let wf = workflow(devices, FakeWifi::default(), true);

        let summary = wf
            .setup(&SetupOptions {
                ssid: "HomeNet".to_string(),
                password: Some("secret".to_string()),
                all: false,
                name: Some("lamp".to_string()),
            })
            .unwrap();

        assert_eq!(summary.configured, 1);
        assert_eq!(
            *wf.devices.setups.borrow(),
            vec![("Lamp".to_string(), "HomeNet".to_string(), "secret".to_string())]
        );
        assert!(wf.wifi.connects.borrow().is_empty());
    }

    #[test]
    fn test_setup_requires_target() {
        let wf = workflow(FakeDevices::default(), FakeWifi::default(), true);
        assert!(matches!(
            wf.setup(&SetupOptions {
                ssid: "HomeNet".to_string(),
                ..Default::default()
            }),
            Err(SetupError::MissingTarget)
        ));
    }

    #[test]
    fn test_discover_needing_setup() {
        let devices = FakeDevices {
            devices: vec![device("A", "10.0.0.1", "uuid:a"), device("B", "10.0.0.2", "uuid:b")],
            configured: vec!["uuid:a".to_string()],
            ..Default::default()
        };
        let wf = workflow(devices, FakeWifi::default(), true);

        let pending = wf.discover_needing_setup().unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].name, "B");
    }
}
