//! Request signing for Binance `SIGNED` endpoints.
//!
//! The signature is the lowercase hex HMAC-SHA256 of the URL-encoded query
//! string, keyed with the API secret, appended as `signature=<hex>`.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// HMAC-SHA256 of `message` keyed with `secret`, as lowercase hex.
pub fn hmac_sha256_sign(secret: &str, message: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(message.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// URL-encode `params` in order and append their signature.
///
/// `params` must already include `timestamp` (and `recvWindow` if used).
pub fn build_signed_query(params: &[(&str, &str)], secret: &str) -> String {
    let query = params
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");

    let signature = hmac_sha256_sign(secret, &query);
    format!("{query}&signature={signature}")
}
