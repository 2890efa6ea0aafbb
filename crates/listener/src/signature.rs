//! GitHub webhook signature verification.
//!
//! GitHub signs the raw request body with the shared webhook secret and sends
//! the hex digest in `X-Hub-Signature-256` (`sha256=<hex>`). Older
//! deployments only send `X-Hub-Signature` (`sha1=<hex>`); it is accepted
//! when the SHA-256 header is absent.

use axum::http::HeaderMap;
use ring::hmac;
use thiserror::Error;

/// HMAC-SHA256 signature header.
pub const SIGNATURE_256_HEADER: &str = "x-hub-signature-256";
/// Legacy HMAC-SHA1 signature header.
pub const SIGNATURE_SHA1_HEADER: &str = "x-hub-signature";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("missing signature header")]
    Missing,

    #[error("malformed signature header")]
    Malformed,

    #[error("signature does not match payload")]
    Mismatch,
}

/// A decoded signature header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signature {
    Sha256(Vec<u8>),
    Sha1(Vec<u8>),
}

impl Signature {
    /// Reads the strongest signature present in `headers`.
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, SignatureError> {
        if let Some(value) = headers.get(SIGNATURE_256_HEADER) {
            let value = value.to_str().map_err(|_| SignatureError::Malformed)?;
            return Self::parse(value, "sha256=").map(Signature::Sha256);
        }
        if let Some(value) = headers.get(SIGNATURE_SHA1_HEADER) {
            let value = value.to_str().map_err(|_| SignatureError::Malformed)?;
            return Self::parse(value, "sha1=").map(Signature::Sha1);
        }
        Err(SignatureError::Missing)
    }

    fn parse(value: &str, prefix: &str) -> Result<Vec<u8>, SignatureError> {
        let digest = value
            .trim()
            .strip_prefix(prefix)
            .ok_or(SignatureError::Malformed)?;
        hex::decode(digest).map_err(|_| SignatureError::Malformed)
    }

    /// Checks the signature against `body` in constant time.
    pub fn verify(&self, secret: &[u8], body: &[u8]) -> Result<(), SignatureError> {
        let (algorithm, tag) = match self {
            Signature::Sha256(tag) => (hmac::HMAC_SHA256, tag),
            Signature::Sha1(tag) => (hmac::HMAC_SHA1_FOR_LEGACY_USE_ONLY, tag),
        };
        let key = hmac::Key::new(algorithm, secret);
        hmac::verify(&key, body, tag).map_err(|_| SignatureError::Mismatch)
    }
}

/// Verifies the request carried by `headers` and `body` against `secret`.
pub fn verify_request(secret: &[u8], headers: &HeaderMap, body: &[u8]) -> Result<(), SignatureError> {
    Signature::from_headers(headers)?.verify(secret, body)
}

#[cfg(test)]
pub(crate) fn sign_sha256(secret: &[u8], body: &[u8]) -> String {
    let key = hmac::Key::new(hmac::HMAC_SHA256, secret);
    format!("sha256={}", hex::encode(hmac::sign(&key, body).as_ref()))
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    const SECRET: &[u8] = b"It's a Secret to Everybody";
    const BODY: &[u8] = b"Hello, World!";

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn accepts_github_documented_sha256_example() {
        // Example delivery from GitHub's webhook validation docs.
        let h = headers(&[(
            SIGNATURE_256_HEADER,
            "sha256=757107ea0eb2509fc211221cce984b8a37570b6d7586c22c46f4379c8b043e17",
        )]);
        assert_eq!(verify_request(SECRET, &h, BODY), Ok(()));
    }

    #[test]
    fn accepts_legacy_sha1_signature() {
        let key = hmac::Key::new(hmac::HMAC_SHA1_FOR_LEGACY_USE_ONLY, SECRET);
        let digest = hex::encode(hmac::sign(&key, BODY).as_ref());
        let h = headers(&[(SIGNATURE_SHA1_HEADER, &format!("sha1={digest}"))]);
        assert_eq!(verify_request(SECRET, &h, BODY), Ok(()));
    }

    #[test]
    fn prefers_sha256_over_sha1() {
        let h = headers(&[
            (SIGNATURE_256_HEADER, &sign_sha256(b"wrong", BODY)),
            (SIGNATURE_SHA1_HEADER, "sha1=00"),
        ]);
        assert_eq!(
            verify_request(SECRET, &h, BODY),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn rejects_tampered_body() {
        let h = headers(&[(SIGNATURE_256_HEADER, &sign_sha256(SECRET, BODY))]);
        assert_eq!(
            verify_request(SECRET, &h, b"Hello, World?"),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn rejects_missing_and_malformed_headers() {
        assert_eq!(
            verify_request(SECRET, &HeaderMap::new(), BODY),
            Err(SignatureError::Missing)
        );
        let no_prefix = headers(&[(SIGNATURE_256_HEADER, "757107ea")]);
        assert_eq!(
            verify_request(SECRET, &no_prefix, BODY),
            Err(SignatureError::Malformed)
        );
        let not_hex = headers(&[(SIGNATURE_256_HEADER, "sha256=zz")]);
        assert_eq!(
            verify_request(SECRET, &not_hex, BODY),
            Err(SignatureError::Malformed)
        );
    }
}
