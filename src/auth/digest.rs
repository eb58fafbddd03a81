//! Digest authentication (RFC 2617, MD5).

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use md5::{Digest, Md5};
use rand::RngCore;

use super::{AuthOutcome, Challenge};

/// Quality of protection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Qop {
    Auth,
    AuthInt,
}

impl Qop {
    pub fn as_str(&self) -> &'static str {
        match self {
            Qop::Auth => "auth",
            Qop::AuthInt => "auth-int",
        }
    }

    /// Parse a qop path segment. Unknown values mean "unspecified".
    pub fn from_param(value: &str) -> Option<Self> {
        match value {
            "auth" => Some(Qop::Auth),
            "auth-int" => Some(Qop::AuthInt),
            _ => None,
        }
    }

    /// Modes offered for a requested qop: the one asked for, or both.
    pub fn offered(requested: Option<Qop>) -> Vec<Qop> {
        match requested {
            Some(qop) => vec![qop],
            None => vec![Qop::Auth, Qop::AuthInt],
        }
    }
}

/// A freshly issued Digest challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestChallenge {
    pub realm: String,
    pub nonce: String,
    pub opaque: String,
    pub qop: Vec<Qop>,
}

impl DigestChallenge {
    /// Issue a challenge with a nonce bound to the client address and current time.
    pub fn issue(client_addr: &str, realm: &str, qop: Option<Qop>) -> Self {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs_f64();

        let mut rng = rand::thread_rng();
        let mut salt = [0u8; 10];
        rng.fill_bytes(&mut salt);

        let mut hasher = Md5::new();
        hasher.update(client_addr.as_bytes());
        hasher.update(b":");
        hasher.update(now.to_string().as_bytes());
        hasher.update(b":");
        hasher.update(salt);
        let nonce = hex::encode(hasher.finalize());

        rng.fill_bytes(&mut salt);
        let opaque = hex::encode(Md5::digest(salt));

        Self {
            realm: realm.to_string(),
            nonce,
            opaque,
            qop: Qop::offered(qop),
        }
    }

    /// `WWW-Authenticate` header value.
    pub fn header_value(&self) -> String {
        let qop: Vec<&str> = self.qop.iter().map(Qop::as_str).collect();
        format!(
            "Digest realm=\"{}\", nonce=\"{}\", qop=\"{}\", opaque=\"{}\", algorithm=MD5",
            self.realm,
            self.nonce,
            qop.join(", "),
            self.opaque
        )
    }
}

/// Parsed `Authorization: Digest ...` parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestCredentials {
    pub username: String,
    pub realm: String,
    pub nonce: String,
    pub uri: String,
    pub response: String,
    pub qop: Option<String>,
    pub nc: Option<String>,
    pub cnonce: Option<String>,
    pub opaque: Option<String>,
}

impl DigestCredentials {
    /// Parse an `Authorization` header value. Returns `None` for other schemes
    /// or when a required parameter is missing.
    pub fn parse(header: &str) -> Option<Self> {
        let (scheme, rest) = header.trim().split_once(' ')?;
        if !scheme.eq_ignore_ascii_case("digest") {
            return None;
        }

        let mut params = parse_params(rest);
        let mut take = |key: &str| params.remove(key);

        let creds = Self {
            username: take("username")?,
            realm: take("realm")?,
            nonce: take("nonce")?,
            uri: take("uri")?,
            response: take("response")?,
            qop: take("qop"),
            nc: take("nc"),
            cnonce: take("cnonce"),
            opaque: take("opaque"),
        };

        // qop requires nc and cnonce
        if creds.qop.is_some() && (creds.nc.is_none() || creds.cnonce.is_none()) {
            return None;
        }
        Some(creds)
    }
}

/// The parts of a request that take part in the Digest response hash.
#[derive(Debug, Clone, Copy)]
pub struct DigestRequest<'a> {
    pub method: &'a str,
    /// Request target as sent: path plus query.
    pub uri: &'a str,
    pub body: &'a [u8],
    pub authorization: Option<&'a str>,
    /// Whether the request echoes any cookie (the challenge marker).
    pub has_cookie: bool,
    pub client_addr: &'a str,
}

/// Recompute the expected response hash and compare.
pub fn check_digest_auth(request: &DigestRequest<'_>, user: &str, passwd: &str) -> bool {
    let Some(creds) = request.authorization.and_then(DigestCredentials::parse) else {
        return false;
    };
    if creds.username != user {
        return false;
    }
    expected_response(&creds, passwd, request).is_some_and(|r| r == creds.response)
}

/// Run one step of the handshake.
///
/// Verified only when valid credentials and the marker cookie are both
/// present; otherwise a fresh challenge is issued.
pub fn digest_outcome(
    request: &DigestRequest<'_>,
    user: &str,
    passwd: &str,
    realm: &str,
    qop: Option<Qop>,
) -> AuthOutcome {
    if request.authorization.is_some()
        && request.has_cookie
        && check_digest_auth(request, user, passwd)
    {
        return AuthOutcome::Verified;
    }

    let challenge = DigestChallenge::issue(request.client_addr, realm, qop);
    tracing::debug!(
        realm = %challenge.realm,
        nonce = %challenge.nonce,
        "Digest challenge issued"
    );
    AuthOutcome::Challenged(Challenge::Digest(challenge))
}

fn h(data: &str) -> String {
    hex::encode(Md5::digest(data.as_bytes()))
}

fn expected_response(
    creds: &DigestCredentials,
    passwd: &str,
    request: &DigestRequest<'_>,
) -> Option<String> {
    let ha1 = h(&format!("{}:{}:{}", creds.username, creds.realm, passwd));

    let ha2 = match creds.qop.as_deref() {
        None | Some("auth") => h(&format!("{}:{}", request.method, request.uri)),
        Some("auth-int") => {
            let body_hash = hex::encode(Md5::digest(request.body));
            h(&format!("{}:{}:{}", request.method, request.uri, body_hash))
        }
        Some(_) => return None,
    };

    let response = match creds.qop.as_deref() {
        None => h(&format!("{}:{}:{}", ha1, creds.nonce, ha2)),
        Some(qop) => h(&format!(
            "{}:{}:{}:{}:{}:{}",
            ha1,
            creds.nonce,
            creds.nc.as_deref()?,
            creds.cnonce.as_deref()?,
            qop,
            ha2
        )),
    };
    Some(response)
}

/// Split `k=v, k="quoted, value"` pairs. Keys are lowercased.
fn parse_params(input: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();
    let mut chars = input.chars().peekable();

    loop {
        while matches!(chars.peek(), Some(c) if c.is_whitespace() || *c == ',') {
            chars.next();
        }

        let key: String = chars
            .by_ref()
            .take_while(|c| *c != '=')
            .collect::<String>()
            .trim()
            .to_ascii_lowercase();
        if key.is_empty() {
            break;
        }

        let mut value = String::new();
        if chars.peek() == Some(&'"') {
            chars.next();
            while let Some(c) = chars.next() {
                match c {
                    '\\' => {
                        if let Some(escaped) = chars.next() {
                            value.push(escaped);
                        }
                    }
                    '"' => break,
                    c => value.push(c),
                }
            }
        } else {
            while let Some(c) = chars.peek() {
                if *c == ',' {
                    break;
                }
                value.push(*c);
                chars.next();
            }
            value = value.trim().to_string();
        }

        params.insert(key, value);
    }

    params
}
