//! HMAC-SHA256 signatures for Shopify OAuth callbacks.
//!
//! Shopify signs the callback query string: every parameter except `hmac`
//! and `signature`, sorted by key, joined as `k=v&k=v`, keyed with the app
//! secret and hex encoded.

use std::collections::BTreeMap;

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Parameters that are never part of the signed message.
const UNSIGNED_PARAMS: &[&str] = &["hmac", "signature"];

/// Build the signed message from the callback parameters.
fn message(params: &BTreeMap<String, String>) -> String {
    params
        .iter()
        .filter(|(key, _)| !UNSIGNED_PARAMS.contains(&key.as_str()))
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&")
}

fn mac(params: &BTreeMap<String, String>, secret: &str) -> Option<HmacSha256> {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(message(params).as_bytes());
    Some(mac)
}

/// Compute the hex signature Shopify would attach to `params`.
///
/// Returns `None` only if the HMAC key is rejected, which SHA-256 HMAC
/// never does.
#[must_use]
pub fn sign_query(params: &BTreeMap<String, String>, secret: &str) -> Option<String> {
    mac(params, secret).map(|mac| hex::encode(mac.finalize().into_bytes()))
}

/// Verify the `hmac` parameter of a callback query in constant time.
///
/// Returns `false` when `hmac` is missing or not valid hex.
#[must_use]
pub fn verify_query(params: &BTreeMap<String, String>, secret: &str) -> bool {
    let Some(provided) = params.get("hmac") else {
        return false;
    };
    let Ok(provided) = hex::decode(provided.trim()) else {
        return false;
    };

    mac(params, secret).is_some_and(|mac| mac.verify_slice(&provided).is_ok())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SECRET: &str = "hush";

    fn callback_params() -> BTreeMap<String, String> {
        BTreeMap::from([
            ("code".to_string(), "0907a61c0c8d55e99db179b68161bc00".to_string()),
            ("shop".to_string(), "some-shop.myshopify.com".to_string()),
            ("state".to_string(), "0.6784241404160823".to_string()),
            ("timestamp".to_string(), "1337178173".to_string()),
        ])
    }

    #[test]
    fn test_message_is_sorted_and_excludes_signature_params() {
        let mut params = callback_params();
        params.insert("hmac".to_string(), "abc".to_string());
        params.insert("signature".to_string(), "def".to_string());

        assert_eq!(
            message(&params),
            "code=0907a61c0c8d55e99db179b68161bc00&shop=some-shop.myshopify.com&state=0.6784241404160823&timestamp=1337178173"
        );
    }

    #[test]
    fn test_signed_query_verifies() {
        let mut params = callback_params();
        let signature = sign_query(&params, SECRET).unwrap();
        assert_eq!(signature.len(), 64);

        params.insert("hmac".to_string(), signature);
        assert!(verify_query(&params, SECRET));
    }

    #[test]
    fn test_uppercase_hex_verifies() {
        let mut params = callback_params();
        let signature = sign_query(&params, SECRET).unwrap().to_uppercase();
        params.insert("hmac".to_string(), signature);
        assert!(verify_query(&params, SECRET));
    }

    #[test]
    fn test_wrong_secret_fails() {
        let mut params = callback_params();
        params.insert("hmac".to_string(), sign_query(&params, "other-secret").unwrap());
        assert!(!verify_query(&params, SECRET));
    }

    #[test]
    fn test_single_character_change_fails() {
        let mut params = callback_params();
        let mut signature = sign_query(&params, SECRET).unwrap();
        let last = signature.pop().unwrap_or('0');
        signature.push(if last == '0' { '1' } else { '0' });

        params.insert("hmac".to_string(), signature);
        assert!(!verify_query(&params, SECRET));
    }

    #[test]
    fn test_tampered_param_fails() {
        let mut params = callback_params();
        params.insert("hmac".to_string(), sign_query(&params, SECRET).unwrap());
        params.insert("shop".to_string(), "evil.myshopify.com".to_string());
        assert!(!verify_query(&params, SECRET));
    }

    #[test]
    fn test_missing_or_malformed_hmac_fails() {
        let mut params = callback_params();
        assert!(!verify_query(&params, SECRET));

        params.insert("hmac".to_string(), "not-hex".to_string());
        assert!(!verify_query(&params, SECRET));

        params.insert("hmac".to_string(), String::new());
        assert!(!verify_query(&params, SECRET));
    }

    #[test]
    fn test_signature_param_does_not_affect_result() {
        let mut params = callback_params();
        params.insert("hmac".to_string(), sign_query(&params, SECRET).unwrap());
        params.insert("signature".to_string(), "anything".to_string());
        assert!(verify_query(&params, SECRET));
    }
}
