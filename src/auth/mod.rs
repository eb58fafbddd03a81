//! HTTP authentication handshakes.
//!
//! # Data Flow
//! ```text
//! Protected request
//!     → basic.rs  (decode "Authorization: Basic ..", exact compare)
//!     → digest.rs (parse "Authorization: Digest ..", recompute response hash)
//!     → AuthOutcome::Verified            → 200 + {"authenticated": true}
//!     → AuthOutcome::Challenged(challenge) → 401 + WWW-Authenticate (or 404 when hidden)
//! ```
//!
//! # States
//! `Unauthenticated → ChallengeIssued → (Verified | ChallengeIssued)`.
//! Nothing is persisted between the two requests of a handshake: the
//! client's retry carries everything needed to verify it.
//!
//! # Design Decisions
//! - Failures are outcomes, never errors
//! - Nonce = H(client address : time : fresh random bytes), opaque = H(fresh random bytes)
//! - An unknown qop requested by the client offers both `auth` and `auth-int`

pub mod basic;
pub mod digest;

pub use basic::check_basic_auth;
pub use digest::{DigestChallenge, DigestCredentials, DigestRequest, Qop};

/// Cookie set alongside a Digest challenge and required on the retry.
pub const DIGEST_MARKER_COOKIE: &str = "fake=fake_value";

/// A challenge sent back with a rejected request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Challenge {
    Basic { realm: String },
    Digest(DigestChallenge),
}

impl Challenge {
    /// `WWW-Authenticate` header value.
    pub fn header_value(&self) -> String {
        match self {
            Challenge::Basic { realm } => format!("Basic realm=\"{}\"", realm),
            Challenge::Digest(digest) => digest.header_value(),
        }
    }
}

/// Result of evaluating one request against a protected endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Verified,
    Challenged(Challenge),
}

impl AuthOutcome {
    pub fn is_verified(&self) -> bool {
        matches!(self, AuthOutcome::Verified)
    }
}

/// Evaluate a Basic-protected request.
pub fn basic_outcome(
    headers: &axum::http::HeaderMap,
    user: &str,
    passwd: &str,
    realm: &str,
) -> AuthOutcome {
    if check_basic_auth(headers, user, passwd) {
        AuthOutcome::Verified
    } else {
        AuthOutcome::Challenged(Challenge::Basic {
            realm: realm.to_string(),
        })
    }
}
