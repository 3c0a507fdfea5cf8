//! Time-based one-time passwords (RFC 6238) for the login 2FA challenge

use data_encoding::BASE32_NOPAD;
use hmac::{Hmac, Mac};
use sha1::Sha1;

use crate::error::PlatformError;

type HmacSha1 = Hmac<Sha1>;

const TIME_STEP_SECS: i64 = 30;
const DIGITS: u32 = 6;

/// Generate the 6-digit code for a base32 `secret` at `unix_time`
///
/// The secret may contain spaces, lowercase letters and `=` padding, as
/// authenticator setup screens show it.
pub fn generate_totp(secret: &str, unix_time: i64) -> Result<String, PlatformError> {
    let normalized: String = secret
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '=')
        .map(|c| c.to_ascii_uppercase())
        .collect();

    let key = BASE32_NOPAD.decode(normalized.as_bytes()).map_err(|e| {
        PlatformError::Authentication(format!("Invalid two-factor secret: {}", e))
    })?;

    let counter = (unix_time / TIME_STEP_SECS) as u64;
    let mut mac = HmacSha1::new_from_slice(&key)
        .map_err(|e| PlatformError::Authentication(format!("Invalid two-factor secret: {}", e)))?;
    mac.update(&counter.to_be_bytes());
    let digest = mac.finalize().into_bytes();

    let offset = (digest[digest.len() - 1] & 0x0f) as usize;
    let binary = u32::from_be_bytes([
        digest[offset] & 0x7f,
        digest[offset + 1],
        digest[offset + 2],
        digest[offset + 3],
    ]);

    Ok(format!(
        "{:0width$}",
        binary % 10u32.pow(DIGITS),
        width = DIGITS as usize
    ))
}

/// Code for the current time
pub fn current_totp(secret: &str) -> Result<String, PlatformError> {
    generate_totp(secret, chrono::Utc::now().timestamp())
}
