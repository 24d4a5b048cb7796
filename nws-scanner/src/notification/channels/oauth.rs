//! OAuth 1.0a request signing (RFC 5849, HMAC-SHA1).
//!
//! Only what the Twitter channel needs: building the `Authorization` header for
//! a request whose body is not form-encoded, so just the query parameters and
//! the `oauth_*` protocol parameters enter the signature base string.

use base64::Engine as _;
use hmac::{Hmac, Mac};
use sha1::Sha1;

use crate::{Error, Result};

type HmacSha1 = Hmac<Sha1>;

/// Consumer and access-token credentials for user-context requests.
#[derive(Clone)]
pub struct OAuthCredentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub token: String,
    pub token_secret: String,
}

/// Per-request values that must be fresh on every call.
#[derive(Debug, Clone)]
pub struct RequestNonce {
    pub nonce: String,
    pub timestamp: u64,
}

impl RequestNonce {
    pub fn generate() -> Self {
        Self {
            nonce: format!("{:032x}", rand::random::<u128>()),
            timestamp: chrono::Utc::now().timestamp().max(0) as u64,
        }
    }
}

/// RFC 3986 percent-encoding: everything but `A-Z a-z 0-9 - . _ ~`.
fn encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Compute the base64 HMAC-SHA1 signature for a request.
///
/// `params` holds the request parameters (query string, or form body when the
/// body is form-encoded); the `oauth_*` parameters are added here.
pub fn signature(
    credentials: &OAuthCredentials,
    method: &str,
    url: &str,
    params: &[(&str, &str)],
    nonce: &RequestNonce,
) -> Result<String> {
    let timestamp = nonce.timestamp.to_string();
    let oauth_params = protocol_params(credentials, nonce, &timestamp);

    let mut encoded: Vec<(String, String)> = params
        .iter()
        .chain(oauth_params.iter())
        .map(|(k, v)| (encode(k), encode(v)))
        .collect();
    encoded.sort();

    let parameter_string = encoded
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let base_string = format!(
        "{}&{}&{}",
        method.to_ascii_uppercase(),
        encode(url),
        encode(&parameter_string)
    );
    let signing_key = format!(
        "{}&{}",
        encode(&credentials.consumer_secret),
        encode(&credentials.token_secret)
    );

    let mut mac = HmacSha1::new_from_slice(signing_key.as_bytes())
        .map_err(|e| Error::Other(format!("invalid OAuth signing key: {e}")))?;
    mac.update(base_string.as_bytes());

    Ok(base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes()))
}

/// Build the `Authorization: OAuth ...` header value for a request.
pub fn authorization_header(
    credentials: &OAuthCredentials,
    method: &str,
    url: &str,
    params: &[(&str, &str)],
    nonce: &RequestNonce,
) -> Result<String> {
    let signature = signature(credentials, method, url, params, nonce)?;
    let timestamp = nonce.timestamp.to_string();

    let mut header_params = protocol_params(credentials, nonce, &timestamp);
    header_params.push(("oauth_signature", signature.as_str()));
    header_params.sort();

    let fields = header_params
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", encode(k), encode(v)))
        .collect::<Vec<_>>()
        .join(", ");

    Ok(format!("OAuth {fields}"))
}

fn protocol_params<'a>(
    credentials: &'a OAuthCredentials,
    nonce: &'a RequestNonce,
    timestamp: &'a str,
) -> Vec<(&'a str, &'a str)> {
    vec![
        ("oauth_consumer_key", credentials.consumer_key.as_str()),
        ("oauth_nonce", nonce.nonce.as_str()),
        ("oauth_signature_method", "HMAC-SHA1"),
        ("oauth_timestamp", timestamp),
        ("oauth_token", credentials.token.as_str()),
        ("oauth_version", "1.0"),
    ]
}
