//! AWS Signature Version 4 request signing.
//!
//! Signing is a pure transform: the caller's request is cloned and the copy
//! receives `x-amz-date` and `authorization` headers.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use reqwest::header::{AUTHORIZATION, HeaderName, HeaderValue};
use sha2::{Digest, Sha256};
use url::Url;

use crate::credential::Credentials;
use crate::error::{Error, Result};
use crate::request::OutboundRequest;

type HmacSha256 = Hmac<Sha256>;

/// Signing name of the Elasticsearch / OpenSearch service.
pub const SERVICE_NAME: &str = "es";

const ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// SHA-256 of an empty payload.
const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

const X_AMZ_DATE: HeaderName = HeaderName::from_static("x-amz-date");

/// Headers left out of the signature because proxies and clients rewrite them.
const UNSIGNED_HEADERS: &[&str] = &[
    "accept",
    "authorization",
    "cache-control",
    "content-length",
    "content-type",
    "expect",
    "from",
    "max-forwards",
    "pragma",
    "proxy-authorization",
    "range",
    "referer",
    "te",
    "user-agent",
    "x-amzn-trace-id",
];

/// Signs `request` for `service` in `region` using the current time.
pub fn sign_request(
    request: &OutboundRequest,
    credentials: &Credentials,
    region: &str,
    service: &str,
) -> Result<OutboundRequest> {
    sign_request_at(request, credentials, region, service, Utc::now())
}

/// Signs `request` as of `now`.
///
/// Steps:
/// 1. Build the canonical request from method, URI, query, headers and payload hash.
/// 2. Build the string to sign over the `date/region/service/aws4_request` scope.
/// 3. Derive the signing key with the HMAC chain seeded by `AWS4{secret}`.
/// 4. Attach `x-amz-date` and the `AWS4-HMAC-SHA256` authorization header.
pub fn sign_request_at(
    request: &OutboundRequest,
    credentials: &Credentials,
    region: &str,
    service: &str,
    now: DateTime<Utc>,
) -> Result<OutboundRequest> {
    if !credentials.is_complete() || region.is_empty() || service.is_empty() {
        return Err(Error::Signing(
            "key id, secret key, region and service must all be non-empty".into(),
        ));
    }
    let payload = request
        .body
        .as_bytes()
        .ok_or_else(|| Error::Signing("multipart bodies cannot be signed".into()))?;
    if request.url.cannot_be_a_base() {
        return Err(Error::Signing(format!(
            "request URL '{}' has no path to sign",
            request.url
        )));
    }
    let host = host_header(&request.url)
        .ok_or_else(|| Error::Signing(format!("request URL '{}' has no host", request.url)))?;

    let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
    let date_stamp = now.format("%Y%m%d").to_string();

    let mut headers: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in &request.headers {
        if UNSIGNED_HEADERS.contains(&name.as_str()) {
            continue;
        }
        let value = value.to_str().map_err(|_| {
            Error::Signing(format!("header '{}' has a non-visible-ASCII value", name))
        })?;
        let value = normalize_header_value(value);
        headers
            .entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push(',');
                existing.push_str(&value);
            })
            .or_insert(value);
    }
    headers.insert("host".to_string(), host);
    headers.insert("x-amz-date".to_string(), amz_date.clone());

    let canonical_headers: String = headers
        .iter()
        .map(|(k, v)| format!("{}:{}\n", k, v))
        .collect();
    let signed_headers = headers.keys().cloned().collect::<Vec<_>>().join(";");

    let payload_hash = if payload.is_empty() {
        EMPTY_SHA256.to_string()
    } else {
        hex::encode(Sha256::digest(payload))
    };

    let canonical_request = format!(
        "{}\n{}\n{}\n{}\n{}\n{}",
        request.method.as_str(),
        canonical_uri(request.url.path()),
        canonical_query(request.url.query()),
        canonical_headers,
        signed_headers,
        payload_hash
    );
    tracing::trace!(%canonical_request, "built SigV4 canonical request");

    let scope = format!("{}/{}/{}/aws4_request", date_stamp, region, service);
    let string_to_sign = format!(
        "{}\n{}\n{}\n{}",
        ALGORITHM,
        amz_date,
        scope,
        hex::encode(Sha256::digest(canonical_request.as_bytes()))
    );

    let signing_key = derive_signing_key(&credentials.secret_key, &date_stamp, region, service)?;
    let signature = hex::encode(hmac_sha256(&signing_key, string_to_sign.as_bytes())?);

    let authorization = format!(
        "{} Credential={}/{}, SignedHeaders={}, Signature={}",
        ALGORITHM, credentials.key_id, scope, signed_headers, signature
    );

    let mut signed = request.clone();
    signed.headers.insert(
        X_AMZ_DATE,
        HeaderValue::from_str(&amz_date)
            .map_err(|e| Error::Signing(format!("invalid x-amz-date value: {}", e)))?,
    );
    signed.headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&authorization)
            .map_err(|e| Error::Signing(format!("invalid authorization value: {}", e)))?,
    );
    Ok(signed)
}

/// `Host` header value: host plus port when it is not the scheme default.
fn host_header(url: &Url) -> Option<String> {
    let host = url.host_str().filter(|h| !h.is_empty())?;
    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

/// Collapses runs of spaces and trims, as canonical header values require.
fn normalize_header_value(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// The already percent-encoded path, encoded once more with `/` preserved.
fn canonical_uri(path: &str) -> String {
    if path.is_empty() {
        return "/".to_string();
    }
    uri_encode(path, false)
}

/// Decodes, re-encodes (RFC 3986) and sorts the query parameters.
fn canonical_query(query: Option<&str>) -> String {
    let Some(query) = query.filter(|q| !q.is_empty()) else {
        return String::new();
    };

    let decode = |s: &str| {
        urlencoding::decode(s)
            .map(|d| d.into_owned())
            .unwrap_or_else(|_| s.to_string())
    };

    let mut params: Vec<(String, String)> = query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (
                uri_encode(&decode(key), true),
                uri_encode(&decode(value), true),
            )
        })
        .collect();
    params.sort();

    params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

/// Percent-encodes every byte outside the RFC 3986 unreserved set
/// (`A-Z a-z 0-9 - . _ ~`), optionally leaving `/` alone.
fn uri_encode(s: &str, encode_slash: bool) -> String {
    let mut encoded = String::with_capacity(s.len() * 2);
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                encoded.push(byte as char);
            }
            b'/' if !encode_slash => encoded.push('/'),
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }
    encoded
}

fn derive_signing_key(
    secret_key: &str,
    date_stamp: &str,
    region: &str,
    service: &str,
) -> Result<[u8; 32]> {
    let k_date = hmac_sha256(format!("AWS4{}", secret_key).as_bytes(), date_stamp.as_bytes())?;
    let k_region = hmac_sha256(&k_date, region.as_bytes())?;
    let k_service = hmac_sha256(&k_region, service.as_bytes())?;
    hmac_sha256(&k_service, b"aws4_request")
}

fn hmac_sha256(key: &[u8], msg: &[u8]) -> Result<[u8; 32]> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| Error::Signing(format!("HMAC key error: {}", e)))?;
    mac.update(msg);
    let mut output = [0u8; 32];
    output.copy_from_slice(&mac.finalize().into_bytes());
    Ok(output)
}
