//! Time-based one-time passwords (RFC 6238, HMAC-SHA1).

use hmac::{Hmac, Mac};
use sha1::Sha1;

use screener_core::error::ProviderError;

/// Seconds per TOTP step.
pub const STEP_SECS: i64 = 30;
/// Digits per code.
pub const DIGITS: u32 = 6;

/// A TOTP generator over a shared secret.
#[derive(Clone)]
pub struct Totp {
    secret: Vec<u8>,
}

impl std::fmt::Debug for Totp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Totp").finish_non_exhaustive()
    }
}

impl Totp {
    /// Create a generator from raw secret bytes.
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self { secret: secret.into() }
    }

    /// Create a generator from a base32 secret as shown by authenticator apps.
    pub fn from_base32(secret: &str) -> Result<Self, ProviderError> {
        let bytes = base32_decode(secret)
            .filter(|b| !b.is_empty())
            .ok_or_else(|| ProviderError::Config("TOTP secret is not valid base32".into()))?;
        Ok(Self::new(bytes))
    }

    /// Code for the step containing `unix_secs`.
    pub fn code_at(&self, unix_secs: i64) -> String {
        self.code_with_digits(unix_secs, DIGITS)
    }

    fn code_with_digits(&self, unix_secs: i64, digits: u32) -> String {
        let counter = unix_secs.div_euclid(STEP_SECS) as u64;

        let mut mac = Hmac::<Sha1>::new_from_slice(&self.secret)
            .expect("HMAC accepts keys of any length");
        mac.update(&counter.to_be_bytes());
        let hash = mac.finalize().into_bytes();

        // dynamic truncation
        let offset = (hash[hash.len() - 1] & 0x0f) as usize;
        let binary = u32::from_be_bytes([hash[offset], hash[offset + 1], hash[offset + 2], hash[offset + 3]])
            & 0x7fff_ffff;

        let code = binary % 10u32.pow(digits);
        format!("{:0width$}", code, width = digits as usize)
    }
}

/// Decode RFC 4648 base32, ignoring case, spaces and padding.
pub fn base32_decode(input: &str) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(input.len() * 5 / 8);
    let mut buffer: u32 = 0;
    let mut bits = 0;

    for ch in input.chars().filter(|c| !c.is_whitespace() && *c != '=' && *c != '-') {
        let value = match ch.to_ascii_uppercase() {
            c @ 'A'..='Z' => c as u32 - 'A' as u32,
            c @ '2'..='7' => c as u32 - '2' as u32 + 26,
            _ => return None,
        };
        buffer = (buffer << 5) | value;
        bits += 5;
        if bits >= 8 {
            bits -= 8;
            out.push((buffer >> bits) as u8);
            buffer &= (1 << bits) - 1;
        }
    }

    Some(out)
}
