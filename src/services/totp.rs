//! Time-based one-time passwords (RFC 6238) over HMAC-SHA256.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub const DIGITS: u32 = 6;
pub const STEP_SECONDS: i64 = 30;
pub const SECRET_BYTES: usize = 32;

/// Accepted clock drift, in steps, on either side of the current one.
const SKEW_STEPS: i64 = 1;

/// Generate a fresh random secret, hex encoded for storage.
#[must_use]
pub fn generate_secret() -> String {
    use rand::Rng;

    let bytes: [u8; SECRET_BYTES] = rand::rng().random();
    hex::encode(bytes)
}

/// HOTP value for a raw counter.
fn hotp(secret: &[u8], counter: u64) -> Option<u32> {
    let mut mac = HmacSha256::new_from_slice(secret).ok()?;
    mac.update(&counter.to_be_bytes());
    let digest = mac.finalize().into_bytes();

    let offset = usize::from(digest[digest.len() - 1] & 0x0f);
    let truncated = u32::from_be_bytes([
        digest[offset] & 0x7f,
        digest[offset + 1],
        digest[offset + 2],
        digest[offset + 3],
    ]);

    Some(truncated % 10u32.pow(DIGITS))
}

/// Code valid at `unix_seconds` for the given raw secret.
#[must_use]
pub fn code_at(secret: &[u8], unix_seconds: i64) -> Option<u32> {
    let counter = u64::try_from(unix_seconds.div_euclid(STEP_SECONDS)).ok()?;
    hotp(secret, counter)
}

/// Checks a user-supplied code against a hex secret, allowing one step of drift.
#[must_use]
pub fn verify(secret_hex: &str, code: &str, unix_seconds: i64) -> bool {
    let code = code.trim();
    if code.len() != DIGITS as usize || !code.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    let Ok(expected) = code.parse::<u32>() else {
        return false;
    };
    let Ok(secret) = hex::decode(secret_hex) else {
        return false;
    };

    (-SKEW_STEPS..=SKEW_STEPS).any(|drift| {
        code_at(&secret, unix_seconds + drift * STEP_SECONDS) == Some(expected)
    })
}
