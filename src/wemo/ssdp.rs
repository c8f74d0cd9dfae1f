//! SSDP discovery of Wemo devices.

use log::{debug, trace};
use std::io;
use std::net::UdpSocket;
use std::time::{Duration, Instant};

const SSDP_ADDR: &str = "239.255.255.250:1900";
const SEARCH_TARGET: &str = "urn:Belkin:service:basicevent:1";
const SEARCH_REPEATS: usize = 3;

fn search_request(mx: u64) -> String {
    format!(
        "M-SEARCH * HTTP/1.1\r\n\
         HOST: {SSDP_ADDR}\r\n\
         MAN: \"ssdp:discover\"\r\n\
         MX: {mx}\r\n\
         ST: {SEARCH_TARGET}\r\n\r\n"
    )
}

/// Multicasts an M-SEARCH and collects the description URLs of every device
/// that answers before `timeout` runs out.
///
/// The request is sent three times since UDP multicast can drop packets.
/// Repeated answers from one device are collapsed.
///
/// # Arguments
/// * `timeout` - Total listening time; also sets the request's `MX` (1-5 s)
///
/// # Returns
/// Description URLs in the order first seen. Socket errors other than the
/// read timeout are returned.
pub fn search(timeout: Duration) -> io::Result<Vec<String>> {
    let socket = UdpSocket::bind("0.0.0.0:0")?;
    socket.set_multicast_ttl_v4(2)?;

    let request = search_request(timeout.as_secs().clamp(1, 5));
    for _ in 0..SEARCH_REPEATS {
        socket.send_to(request.as_bytes(), SSDP_ADDR)?;
    }

    let deadline = Instant::now() + timeout;
    let mut buf = [0u8; 4096];
    let mut locations = Vec::new();

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }
        socket.set_read_timeout(Some(remaining))?;

        match socket.recv_from(&mut buf) {
            Ok((size, addr)) => {
                let response = String::from_utf8_lossy(&buf[..size]);
                trace!("ssdp response from {}:\n{}", addr, response);
                if let Some(location) = parse_location(&response) {
                    if !locations.contains(&location) {
                        debug!("ssdp: {} answered with {}", addr, location);
                        locations.push(location);
                    }
                }
            }
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => break,
            Err(e) => return Err(e),
        }
    }

    Ok(locations)
}

/// Extracts the `LOCATION` header from an SSDP response.
pub fn parse_location(response: &str) -> Option<String> {
    response
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("location"))
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
