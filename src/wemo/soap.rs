//! SOAP request encoding and response decoding for UPnP action calls.

use crate::device::ActionResult;
use crate::wemo::xml;

/// Builds the SOAP request body for an action call.
///
/// # Arguments
/// * `service_type` - Full service type, e.g. `urn:Belkin:service:basicevent:1`
/// * `action` - Action name
/// * `args` - Input arguments in call order; values are XML-escaped
pub fn envelope(service_type: &str, action: &str, args: &[(&str, &str)]) -> String {
    let arguments: String = args
        .iter()
        .map(|(name, value)| format!("<{name}>{}</{name}>", xml::escape(value)))
        .collect();

    format!(
        concat!(
            r#"<?xml version="1.0" encoding="utf-8"?>"#,
            r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/" "#,
            r#"s:encodingStyle="http://schemas.xmlsoap.org/soap/encoding/">"#,
            r#"<s:Body><u:{action} xmlns:u="{service_type}">{arguments}</u:{action}></s:Body>"#,
            r#"</s:Envelope>"#
        ),
        action = action,
        service_type = service_type,
        arguments = arguments,
    )
}

/// Value of the `SOAPACTION` header: `"<service type>#<action>"`, quoted.
pub fn action_header(service_type: &str, action: &str) -> String {
    format!("\"{}#{}\"", service_type, action)
}

/// Flattens the SOAP body into a result. Faults come back the same way and
/// carry `faultstring`, `errorCode` and `errorDescription`.
///
/// # Returns
/// An error message only when the body has no SOAP body element at all.
pub fn parse_response(body: &str) -> Result<ActionResult, String> {
    let inner = xml::blocks(&xml::BODY, body)
        .into_iter()
        .next()
        .ok_or_else(|| "no SOAP body in response".to_string())?;

    Ok(xml::leaves(inner).into_iter().collect())
}
