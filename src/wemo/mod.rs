//! UPnP client for Wemo devices.
//!
//! Discovery multicasts an SSDP search, then reads each answering device's
//! description and service documents over HTTP. Actions are invoked as SOAP
//! calls against the service control URLs.

pub mod description;
pub mod setup;
pub mod soap;
pub mod ssdp;
pub mod xml;

use log::{debug, warn};
use std::collections::BTreeSet;
use std::time::Duration;

use crate::config::Settings;
use crate::device::{ActionResult, Device, DeviceControl};
use crate::error::DeviceError;

/// [`DeviceControl`] over the network: SSDP discovery and SOAP calls.
///
/// One `ureq` agent is shared by every request, so HTTP connections are
/// reused across the description reads and action calls to a device.
pub struct WemoClient {
    agent: ureq::Agent,
    discovery_timeout: Duration,
}

impl WemoClient {
    /// Creates a client using the discovery and HTTP timeouts from `settings`.
    pub fn new(settings: &Settings) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(settings.http_timeout())
            .build();
        WemoClient {
            agent,
            discovery_timeout: settings.discovery_timeout(),
        }
    }

    fn fetch(&self, url: &str) -> Result<String, DeviceError> {
        let transport = |reason: String| DeviceError::Transport {
            url: url.to_string(),
            reason,
        };
        self.agent
            .get(url)
            .call()
            .map_err(|e| transport(e.to_string()))?
            .into_string()
            .map_err(|e| transport(e.to_string()))
    }

    fn describe(&self, location: &str) -> Result<Device, DeviceError> {
        let document = self.fetch(location)?;
        let mut device = description::parse_device(&document, location)?;

        let urls: Vec<(String, String)> = device
            .services
            .iter()
            .map(|(name, service)| (name.clone(), description::resolve(&device, &service.scpd_url)))
            .collect();

        for (name, url) in urls {
            match self.fetch(&url) {
                Ok(scpd) => {
                    if let Some(service) = device.services.get_mut(&name) {
                        service.actions = description::parse_actions(&scpd);
                    }
                }
                Err(e) => warn!("could not read {} service of {}: {}", name, device, e),
            }
        }

        Ok(device)
    }
}

impl DeviceControl for WemoClient {
    fn discover(&self) -> Result<Vec<Device>, DeviceError> {
        debug!("searching for devices ({}s)", self.discovery_timeout.as_secs());
        let locations = ssdp::search(self.discovery_timeout)?;

        let mut devices: Vec<Device> = Vec::new();
        for location in locations {
            match self.describe(&location) {
                Ok(device) => {
                    if devices.iter().any(|d| d.udn == device.udn) {
                        continue;
                    }
                    devices.push(device);
                }
                Err(e) => warn!("skipping device at {}: {}", location, e),
            }
        }
        Ok(devices)
    }

    fn invoke(
        &self,
        device: &Device,
        service: &str,
        action: &str,
        args: &[(&str, &str)],
    ) -> Result<ActionResult, DeviceError> {
        let (svc, spec) = device.action(service, action)?;

        let expected: BTreeSet<&str> = spec.inputs.iter().map(String::as_str).collect();
        let given: BTreeSet<&str> = args.iter().map(|(name, _)| *name).collect();
        if expected != given {
            return Err(DeviceError::ArgumentMismatch {
                action: format!("{service}.{action}"),
                expected: spec.inputs.join(", "),
                given: given.into_iter().collect::<Vec<_>>().join(", "),
            });
        }

        let url = description::resolve(device, &svc.control_url);
        let transport = |reason: String| DeviceError::Transport {
            url: url.clone(),
            reason,
        };

        debug!("calling {}.{} on {}", service, action, device);
        let response = self
            .agent
            .post(&url)
            .set("Content-Type", "text/xml; charset=\"utf-8\"")
            .set("SOAPACTION", &soap::action_header(&svc.service_type, action))
            .send_string(&soap::envelope(&svc.service_type, action, args));

        // Faults arrive as HTTP 500 with a SOAP body, so keep reading them.
        let body = match response {
            Ok(response) => response.into_string(),
            Err(ureq::Error::Status(code, response)) => {
                debug!("{}.{} returned HTTP {}", service, action, code);
                response.into_string()
            }
            Err(e) => return Err(transport(e.to_string())),
        }
        .map_err(|e| transport(e.to_string()))?;

        soap::parse_response(&body).map_err(|reason| DeviceError::MalformedResponse(url.clone(), reason))
    }
}
