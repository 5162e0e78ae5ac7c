//! OAuth 1.0a one-legged request signing (HMAC-SHA1)
//!
//! Only the consumer key/secret pair is used; there is no token secret, so
//! the signing key is `enc(consumer_secret) + "&"`.
//!
//! ```text
//! base = METHOD & enc(url) & enc(k1=v1&k2=v2...)   (pairs sorted after encoding)
//! signature = base64(hmac_sha1(enc(secret) + "&", base))
//! ```

use base64::{Engine as _, engine::general_purpose::STANDARD};
use hmac::{Hmac, Mac};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use rand::Rng;
use rand::distributions::Alphanumeric;
use sha1::Sha1;

use crate::error::{ClientError, ClientResult};

type HmacSha1 = Hmac<Sha1>;

/// RFC 3986 unreserved characters stay literal, everything else is encoded
const OAUTH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

pub const SIGNATURE_METHOD: &str = "HMAC-SHA1";
pub const OAUTH_VERSION: &str = "1.0";
const NONCE_LEN: usize = 32;

/// Percent-encode per RFC 3986 (uppercase hex, UTF-8)
pub fn percent_encode(value: &str) -> String {
    utf8_percent_encode(value, OAUTH_ENCODE_SET).to_string()
}

/// Encode every key and value, sort by key then value, join with `&`
pub fn normalized_params<K, V>(params: &[(K, V)]) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (percent_encode(k.as_ref()), percent_encode(v.as_ref())))
        .collect();
    encoded.sort();
    encoded
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

/// `METHOD&enc(url)&enc(normalized params)`
pub fn signature_base_string<K, V>(method: &str, url: &str, params: &[(K, V)]) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    format!(
        "{}&{}&{}",
        method.to_ascii_uppercase(),
        percent_encode(url),
        percent_encode(&normalized_params(params))
    )
}

/// Compute the Base64 HMAC-SHA1 signature. Pure and deterministic.
pub fn sign<K, V>(
    method: &str,
    url: &str,
    params: &[(K, V)],
    consumer_secret: &str,
) -> ClientResult<String>
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let base = signature_base_string(method, url, params);
    let key = format!("{}&", percent_encode(consumer_secret));
    let mut mac = HmacSha1::new_from_slice(key.as_bytes())
        .map_err(|_| ClientError::Validation("invalid signing key".to_string()))?;
    mac.update(base.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// The five protocol parameters sent with every request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthParams {
    pub consumer_key: String,
    pub nonce: String,
    pub timestamp: i64,
}

impl OAuthParams {
    /// Fresh nonce and current unix timestamp
    pub fn new(consumer_key: impl Into<String>) -> Self {
        let nonce: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(NONCE_LEN)
            .map(char::from)
            .collect();
        Self {
            consumer_key: consumer_key.into(),
            nonce,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }

    /// Fixed nonce/timestamp (reproducible signatures)
    pub fn fixed(consumer_key: impl Into<String>, nonce: impl Into<String>, timestamp: i64) -> Self {
        Self {
            consumer_key: consumer_key.into(),
            nonce: nonce.into(),
            timestamp,
        }
    }

    pub fn pairs(&self) -> Vec<(String, String)> {
        vec![
            ("oauth_consumer_key".to_string(), self.consumer_key.clone()),
            ("oauth_nonce".to_string(), self.nonce.clone()),
            (
                "oauth_signature_method".to_string(),
                SIGNATURE_METHOD.to_string(),
            ),
            ("oauth_timestamp".to_string(), self.timestamp.to_string()),
            ("oauth_version".to_string(), OAUTH_VERSION.to_string()),
        ]
    }
}

/// Full query for a request: resource params, the oauth params, and
/// `oauth_signature` appended last.
pub fn signed_query(
    method: &str,
    url: &str,
    params: &[(String, String)],
    oauth: &OAuthParams,
    consumer_secret: &str,
) -> ClientResult<Vec<(String, String)>> {
    let mut query: Vec<(String, String)> = params.to_vec();
    query.extend(oauth.pairs());
    let signature = sign(method, url, &query, consumer_secret)?;
    query.push(("oauth_signature".to_string(), signature));
    Ok(query)
}
