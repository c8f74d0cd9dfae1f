//! Parsing of UPnP device descriptions (`setup.xml`) and service
//! descriptions (SCPD documents).

use std::collections::BTreeMap;

use crate::device::{Action, Device, Service};
use crate::error::DeviceError;
use crate::wemo::xml;

/// Builds a device from its description. Services are listed but their
/// actions are left empty until the SCPD documents are read.
///
/// # Arguments
/// * `document` - The `setup.xml` body
/// * `location` - URL the body was fetched from; gives host and port
///
/// # Returns
/// [`DeviceError::MalformedResponse`] when the location is not an `http://`
/// URL or the description lacks `friendlyName` or `UDN`.
pub fn parse_device(document: &str, location: &str) -> Result<Device, DeviceError> {
    let malformed = |what: &str| DeviceError::MalformedResponse(location.to_string(), what.to_string());

    let (host, port) = host_and_port(location).ok_or_else(|| malformed("bad location URL"))?;
    let name = xml::first(document, "friendlyName").ok_or_else(|| malformed("missing friendlyName"))?;
    let udn = xml::first(document, "UDN").ok_or_else(|| malformed("missing UDN"))?;

    let mut services = BTreeMap::new();
    for block in xml::blocks(&xml::SERVICE, document) {
        let Some(service_type) = xml::first(block, "serviceType") else {
            continue;
        };
        let service = Service {
            control_url: xml::first(block, "controlURL").unwrap_or_default(),
            scpd_url: xml::first(block, "SCPDURL").unwrap_or_default(),
            service_type: service_type.clone(),
            actions: BTreeMap::new(),
        };
        services.insert(service_name(&service_type).to_string(), service);
    }

    Ok(Device {
        name,
        udn,
        host,
        port,
        model: xml::first(document, "modelName").unwrap_or_default(),
        serial: xml::first(document, "serialNumber").unwrap_or_default(),
        mac: xml::first(document, "macAddress").unwrap_or_default(),
        location: location.to_string(),
        services,
    })
}

/// Reads the action list of a service description (SCPD).
///
/// Only arguments with direction `in` are kept, in document order, since
/// those are what a call must supply. Actions without a name are skipped.
///
/// # Returns
/// Actions keyed by name. An unparseable document gives an empty map.
pub fn parse_actions(document: &str) -> BTreeMap<String, Action> {
    let mut actions = BTreeMap::new();
    for block in xml::blocks(&xml::ACTION, document) {
        let Some(name) = xml::first(block, "name") else {
            continue;
        };
        let inputs = xml::blocks(&xml::ARGUMENT, block)
            .into_iter()
            .filter(|arg| xml::first(arg, "direction").is_some_and(|d| d.eq_ignore_ascii_case("in")))
            .filter_map(|arg| xml::first(arg, "name"))
            .collect();
        actions.insert(name.clone(), Action { name, inputs });
    }
    actions
}

/// `urn:Belkin:service:basicevent:1` -> `basicevent`
pub fn service_name(service_type: &str) -> &str {
    service_type.rsplit(':').nth(1).unwrap_or(service_type)
}

/// Splits `http://10.0.0.5:49153/setup.xml` into host and port.
pub fn host_and_port(url: &str) -> Option<(String, u16)> {
    let rest = url.strip_prefix("http://")?;
    let authority = rest.split('/').next()?;
    match authority.rsplit_once(':') {
        Some((host, port)) => Some((host.to_string(), port.parse().ok()?)),
        None => Some((authority.to_string(), 80)),
    }
}

/// Resolves a possibly relative URL from a description against the device.
///
/// # Arguments
/// * `device` - Device whose host and port form the base URL
/// * `url` - `controlURL` or `SCPDURL` value, absolute or relative
pub fn resolve(device: &Device, url: &str) -> String {
    if url.starts_with("http://") {
        url.to_string()
    } else if url.starts_with('/') {
        format!("{}{}", device.base_url(), url)
    } else {
        format!("{}/{}", device.base_url(), url)
    }
}
