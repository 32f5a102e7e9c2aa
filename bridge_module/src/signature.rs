//! HMAC-SHA256 signing shared by both directions of the Talk bot protocol.
//!
//! Talk signs `random || body` with the bot secret and sends the random value
//! and the hex digest as headers. Replies from the bot use the same scheme.

use hmac::{Hmac, Mac};
use rand::distributions::Alphanumeric;
use rand::rngs::OsRng;
use rand::Rng;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Length of the nonce attached to every outbound frame.
pub const NONCE_LENGTH: usize = 64;

/// Nonce and signature pair carried in request headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedFrame {
    pub nonce: String,
    pub signature: String,
}

impl SignedFrame {
    /// Sign `payload` under a freshly generated nonce.
    pub fn sign(payload: &[u8], secret: &str) -> Self {
        let nonce = generate_nonce();
        let signature = sign(payload, &nonce, secret);
        Self { nonce, signature }
    }
}

fn keyed_mac(nonce: &str, payload: &[u8], secret: &str) -> HmacSha256 {
    // HMAC accepts keys of any length, so this never fails.
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .unwrap_or_else(|_| unreachable!("hmac key of any length"));
    mac.update(nonce.as_bytes());
    mac.update(payload);
    mac
}

/// Lowercase hex HMAC-SHA256 of `nonce || payload`.
pub fn sign(payload: &[u8], nonce: &str, secret: &str) -> String {
    hex::encode(keyed_mac(nonce, payload, secret).finalize().into_bytes())
}

/// Check `signature` against `nonce || payload` in constant time.
///
/// Anything that is not exactly a hex encoded 32 byte digest is rejected,
/// including surrounding whitespace. Hex digits may be either case.
pub fn verify(payload: &[u8], nonce: &str, signature: &str, secret: &str) -> bool {
    let Ok(provided) = hex::decode(signature) else {
        return false;
    };
    keyed_mac(nonce, payload, secret)
        .verify_slice(&provided)
        .is_ok()
}

/// 64 alphanumeric characters from the OS random source.
pub fn generate_nonce() -> String {
    OsRng
        .sample_iter(&Alphanumeric)
        .take(NONCE_LENGTH)
        .map(char::from)
        .collect()
}
