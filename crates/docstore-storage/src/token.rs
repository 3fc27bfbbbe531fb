//! Signed transfer tokens.
//!
//! A token binds a physical file path, an operation mode, and an expiry
//! into an opaque string a client can present exactly once (logically) to
//! the transfer endpoints. Format:
//!
//! `base64url(JSON payload) + "." + hex(HMAC-SHA256(secret, payload bytes))`
//!
//! Payload fields: `file_path`, `mode` (`"upload"`/`"download"`), `exp`
//! (epoch seconds). Tokens are stateless: nothing is persisted and they die
//! at `exp`. The MAC is recomputed over the decoded payload bytes and
//! compared in constant time; every failure mode (bad format, bad base64,
//! bad hex, MAC mismatch, unparseable payload, expiry) collapses into the
//! same `None` so callers cannot distinguish tampered from malformed.

use base64::Engine;
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Which single operation a token authorizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferMode {
    Upload,
    Download,
}

/// Decoded token payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenGrant {
    pub file_path: String,
    pub mode: TransferMode,
    pub exp: i64,
}

/// Issues and verifies signed transfer tokens with an injected secret.
///
/// The secret is process-wide configuration resolved once at startup; it is
/// never logged and never exposed through this type's API (no accessor, no
/// `Debug` output).
#[derive(Clone)]
pub struct TokenCodec {
    secret: Vec<u8>,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec").finish_non_exhaustive()
    }
}

impl TokenCodec {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Issue a token for `file_path`/`mode` valid for `ttl_secs` from now.
    pub fn issue(&self, file_path: &str, mode: TransferMode, ttl_secs: u64) -> String {
        self.issue_at(file_path, mode, ttl_secs, Utc::now().timestamp())
    }

    /// Issue with an explicit clock. Exists so expiry is testable without
    /// sleeping; production paths go through [`TokenCodec::issue`].
    pub fn issue_at(
        &self,
        file_path: &str,
        mode: TransferMode,
        ttl_secs: u64,
        now_secs: i64,
    ) -> String {
        let grant = TokenGrant {
            file_path: file_path.to_string(),
            mode,
            exp: now_secs.saturating_add(ttl_secs as i64),
        };
        // TokenGrant serialization cannot fail: plain strings and integers.
        let payload = serde_json::to_vec(&grant).expect("token payload serializes");
        let tag = self.sign(&payload);

        let mut token = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(&payload);
        token.push('.');
        token.push_str(&hex::encode(tag));
        token
    }

    /// Verify a token against the wall clock.
    pub fn verify(&self, token: &str) -> Option<TokenGrant> {
        self.verify_at(token, Utc::now().timestamp())
    }

    /// Verify a token at an explicit time. Pure in `(token, now_secs)`.
    ///
    /// Never returns an error: any invalid token yields `None`.
    pub fn verify_at(&self, token: &str, now_secs: i64) -> Option<TokenGrant> {
        let (payload_b64, tag_hex) = token.rsplit_once('.')?;
        let payload = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(payload_b64)
            .ok()?;
        // hex::decode accepts uppercase digits, which would make two distinct
        // token strings carry the same MAC. Only the canonical lowercase
        // encoding issue() produces is a valid tag.
        if !tag_hex
            .bytes()
            .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
        {
            return None;
        }
        let tag = hex::decode(tag_hex).ok()?;

        // Constant-time comparison; MAC mismatch and malformed input are
        // indistinguishable to the caller.
        let mut mac = HmacSha256::new_from_slice(&self.secret).expect("HMAC accepts any key size");
        mac.update(&payload);
        mac.verify_slice(&tag).ok()?;

        let grant: TokenGrant = serde_json::from_slice(&payload).ok()?;
        if now_secs > grant.exp {
            return None;
        }
        Some(grant)
    }

    fn sign(&self, payload: &[u8]) -> Vec<u8> {
        let mut mac = HmacSha256::new_from_slice(&self.secret).expect("HMAC accepts any key size");
        mac.update(payload);
        mac.finalize().into_bytes().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> TokenCodec {
        TokenCodec::new(b"test-secret".to_vec())
    }

    #[test]
    fn round_trip_preserves_path_and_mode() {
        let codec = codec();
        let now = 1_700_000_000;
        let token = codec.issue_at("/data/bucket/a/b.pdf", TransferMode::Upload, 300, now);

        let grant = codec.verify_at(&token, now + 299).unwrap();
        assert_eq!(grant.file_path, "/data/bucket/a/b.pdf");
        assert_eq!(grant.mode, TransferMode::Upload);
        assert_eq!(grant.exp, now + 300);
    }

    #[test]
    fn expired_token_is_invalid() {
        let codec = codec();
        let now = 1_700_000_000;
        let token = codec.issue_at("/data/f", TransferMode::Download, 300, now);

        assert!(codec.verify_at(&token, now + 301).is_none());
        // Boundary: now == exp still verifies.
        assert!(codec.verify_at(&token, now + 300).is_some());
    }

    #[test]
    fn any_single_bit_flip_invalidates() {
        let codec = codec();
        let now = 1_700_000_000;
        let token = codec.issue_at("/data/f.txt", TransferMode::Upload, 300, now);
        let bytes = token.as_bytes();

        for i in 0..bytes.len() {
            for bit in 0..8 {
                let mut mutated = bytes.to_vec();
                mutated[i] ^= 1 << bit;
                let Ok(mutated) = String::from_utf8(mutated) else {
                    continue;
                };
                assert!(
                    codec.verify_at(&mutated, now).is_none(),
                    "bit {} of byte {} accepted",
                    bit,
                    i
                );
            }
        }
    }

    #[test]
    fn case_flipped_mac_segment_is_invalid() {
        let codec = codec();
        let now = 1_700_000_000;
        let token = codec.issue_at("/data/f.txt", TransferMode::Upload, 300, now);

        let (payload, tag) = token.rsplit_once('.').unwrap();
        let uppercased = format!("{}.{}", payload, tag.to_uppercase());
        assert_ne!(token, uppercased, "tag contains no letters to flip");
        assert!(codec.verify_at(&uppercased, now).is_none());
    }

    #[test]
    fn resigned_payload_with_wrong_secret_is_invalid() {
        let now = 1_700_000_000;
        let other = TokenCodec::new(b"other-secret".to_vec());
        let token = other.issue_at("/data/f", TransferMode::Download, 300, now);

        assert!(codec().verify_at(&token, now).is_none());
    }

    #[test]
    fn garbage_inputs_are_invalid_not_panics() {
        let codec = codec();
        for token in ["", ".", "no-delimiter", "a.b", "!!!.zzzz", "Zm9v."] {
            assert!(codec.verify_at(token, 0).is_none());
        }
    }

    #[test]
    fn different_issue_times_yield_different_tokens() {
        let codec = codec();
        let a = codec.issue_at("/data/f", TransferMode::Upload, 300, 1_700_000_000);
        let b = codec.issue_at("/data/f", TransferMode::Upload, 300, 1_700_000_001);
        assert_ne!(a, b);
    }
}
