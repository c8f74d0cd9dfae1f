//! Pushing home network credentials to a device in AP mode.
//!
//! The device is asked which networks it can see, the password is encrypted
//! with a key derived from the device's MAC address and serial number, and
//! the device is polled until it reports that it joined the network.
//!
//! The encryption matches what `openssl enc -aes-128-cbc -md md5 -S <salt>
//! -iv <iv> -pass pass:<keydata>` produces, without the `Salted__` header.

use aes::{
    Aes128,
    cipher::{BlockEncryptMut, KeyIvInit, block_padding::Pkcs7},
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use log::{debug, info, warn};
use md5::{Digest, Md5};
use std::thread;
use std::time::{Duration, Instant};

use crate::device::{Device, DeviceControl};
use crate::error::SetupError;

const POLL_INTERVAL: Duration = Duration::from_secs(1);

type Aes128CbcEnc = cbc::Encryptor<Aes128>;

/// One network as seen by the device (`WiFiSetup.GetApList`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApEntry {
    pub ssid: String,
    pub channel: String,
    pub strength: String,
    pub auth: String,
    pub encrypt: String,
}

/// Parses the `ApList` value, e.g.
///
/// ```text
/// Page:1/1/2$
/// HomeNet|6|100|WPA2PSK/AES,
/// Cafe|11|40|OPEN/NONE,
/// ```
pub fn parse_ap_list(list: &str) -> Vec<ApEntry> {
    let mut entries = Vec::new();
    for line in list.lines() {
        let line = match line.split_once('$') {
            Some((head, rest)) if head.trim_start().starts_with("Page:") => rest,
            _ => line,
        };
        let line = line.trim().trim_end_matches(',');
        if line.is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.rsplitn(4, '|').collect();
        if fields.len() != 4 {
            debug!("skipping unparseable AP list entry: {}", line);
            continue;
        }
        let (auth, encrypt) = match fields[0].split_once('/') {
            Some((auth, encrypt)) => (auth, encrypt),
            None => (fields[0], ""),
        };
        entries.push(ApEntry {
            ssid: fields[3].to_string(),
            channel: fields[2].to_string(),
            strength: fields[1].to_string(),
            auth: auth.to_string(),
            encrypt: encrypt.to_string(),
        });
    }
    entries
}

/// Per-device key material. The pass phrase is `mac[..6] + serial +
/// mac[6..12]`; the salt and IV are its first 8 and 16 bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyMaterial {
    pub keydata: String,
    pub salt: [u8; 8],
    pub iv: [u8; 16],
}

impl KeyMaterial {
    /// Derives the AES-128 key the way `openssl enc -md md5` does
    /// (EVP_BytesToKey, one round): `MD5(keydata || salt)`.
    pub fn key(&self) -> [u8; 16] {
        let digest = Md5::new()
            .chain_update(self.keydata.as_bytes())
            .chain_update(self.salt)
            .finalize();
        <[u8; 16]>::from(digest)
    }
}

pub fn key_material(mac: &str, serial: &str) -> Result<KeyMaterial, SetupError> {
    let malformed = || {
        SetupError::Encryption(format!(
            "unexpected device metadata (mac={mac:?}, serial={serial:?})"
        ))
    };
    if mac.len() < 12 || !mac.is_ascii() || !serial.is_ascii() {
        return Err(malformed());
    }
    let keydata = format!("{}{}{}", &mac[..6], serial, &mac[6..12]);
    let bytes = keydata.as_bytes();
    if bytes.len() < 16 {
        return Err(malformed());
    }

    let mut salt = [0u8; 8];
    salt.copy_from_slice(&bytes[..8]);
    let mut iv = [0u8; 16];
    iv.copy_from_slice(&bytes[..16]);

    Ok(KeyMaterial { keydata, salt, iv })
}

/// Two hex digit lengths the device expects after the encrypted password.
pub fn length_suffix(encrypted_len: usize, plain_len: usize) -> String {
    format!("{:02x}{:02x}", encrypted_len, plain_len)
}

/// Encrypts `password` for a device whose `MetaInfo` is `MAC|serial|...`.
///
/// # Arguments
///
/// * `password` - Plain text network password, must not be empty
/// * `meta_info` - The `MetaInfo` value from `metainfo.GetMetaInfo`
///
/// # Returns
///
/// The AES-128-CBC ciphertext (PKCS7 padded), base64 encoded, followed by
/// [`length_suffix`] of the encoded and plain lengths.
pub fn encrypt_password(password: &str, meta_info: &str) -> Result<String, SetupError> {
    if password.is_empty() {
        return Err(SetupError::Encryption("password required for AES".to_string()));
    }
    let mut meta = meta_info.split('|');
    let mac = meta.next().unwrap_or_default().trim();
    let serial = meta.next().unwrap_or_default().trim();
    let material = key_material(mac, serial)?;
    debug!(
        "encrypting password (salt={}, iv={})",
        hex::encode(material.salt),
        hex::encode(material.iv)
    );

    let ciphertext = Aes128CbcEnc::new_from_slices(&material.key(), &material.iv)
        .map_err(|e| SetupError::Encryption(e.to_string()))?
        .encrypt_padded_vec_mut::<Pkcs7>(password.as_bytes());

    let mut encrypted = STANDARD.encode(ciphertext);
    let suffix = length_suffix(encrypted.len(), password.len());
    encrypted.push_str(&suffix);
    Ok(encrypted)
}

pub fn push_credentials<D: DeviceControl + ?Sized>(
    client: &D,
    device: &Device,
    ssid: &str,
    password: &str,
    timeout: Duration,
) -> Result<(), SetupError> {
    info!("setting up {} to join \"{}\"", device, ssid);

    let meta = client.invoke(device, "metainfo", "GetMetaInfo", &[])?;
    let meta_info = meta.require("GetMetaInfo", "MetaInfo")?.to_string();

    let aps = client.invoke(device, "WiFiSetup", "GetApList", &[])?;
    let entries = parse_ap_list(aps.require("GetApList", "ApList")?);
    let ap = entries
        .into_iter()
        .find(|ap| ap.ssid == ssid)
        .ok_or_else(|| SetupError::NetworkNotVisible(ssid.to_string()))?;
    debug!(
        "device sees \"{}\" (channel={}, strength={}, security={}/{})",
        ap.ssid, ap.channel, ap.strength, ap.auth, ap.encrypt
    );

    let (encrypted, encrypt) = if ap.auth.eq_ignore_ascii_case("OPEN") {
        (String::new(), "NONE".to_string())
    } else if ap.encrypt.eq_ignore_ascii_case("AES") {
        (encrypt_password(password, &meta_info)?, ap.encrypt.clone())
    } else {
        return Err(SetupError::UnsupportedSecurity(format!("{}/{}", ap.auth, ap.encrypt)));
    };

    let result = client.invoke(
        device,
        "WiFiSetup",
        "ConnectHomeNetwork",
        &[
            ("ssid", ssid),
            ("auth", ap.auth.as_str()),
            ("password", encrypted.as_str()),
            ("encrypt", encrypt.as_str()),
            ("channel", ap.channel.as_str()),
        ],
    )?;
    if result.is_fault() {
        return Err(SetupError::Rejected(result.to_string()));
    }

    wait_for_network(client, device, ssid, timeout)?;

    match client.invoke(device, "WiFiSetup", "CloseSetup", &[]) {
        Ok(result) if !result.is_fault() => debug!("CloseSetup: {}", result),
        Ok(result) => warn!("CloseSetup failed on {}: {}", device, result),
        Err(e) => warn!("CloseSetup failed on {}: {}", device, e),
    }

    info!("{} joined \"{}\"", device, ssid);
    Ok(())
}

/// Network status codes: 1 connected, 2 and 3 failed, anything else pending.
fn wait_for_network<D: DeviceControl + ?Sized>(
    client: &D,
    device: &Device,
    ssid: &str,
    timeout: Duration,
) -> Result<(), SetupError> {
    let started = Instant::now();
    loop {
        let result = client.invoke(device, "WiFiSetup", "GetNetworkStatus", &[])?;
        let status = result.get("NetworkStatus").unwrap_or_default().trim().to_string();
        debug!("network status of {}: {:?}", device, status);

        match status.as_str() {
            "1" => return Ok(()),
            "2" | "3" => {
                return Err(SetupError::JoinFailed {
                    ssid: ssid.to_string(),
                    status,
                });
            }
            _ => {}
        }

        if started.elapsed() >= timeout {
            return Err(SetupError::Timeout(ssid.to_string()));
        }
        thread::sleep(POLL_INTERVAL);
    }
}
