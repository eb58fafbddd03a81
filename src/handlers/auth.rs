//! Protected endpoints driving the Basic and Digest handshakes.

use axum::http::{header, StatusCode};
use axum::response::Response;
use serde_json::json;

use crate::auth::digest::digest_outcome;
use crate::auth::{basic_outcome, AuthOutcome, Challenge, DigestRequest, Qop, DIGEST_MARKER_COOKIE};
use crate::error::HandlerError;
use crate::handlers::HandlerResult;
use crate::http::{response, Exchange};

fn credentials(ex: &Exchange) -> Result<(String, String), HandlerError> {
    match (ex.params.str("user"), ex.params.str("passwd")) {
        (Some(user), Some(passwd)) => Ok((user.to_string(), passwd.to_string())),
        _ => Err(HandlerError::Internal("route lacks credential placeholders".into())),
    }
}

fn authenticated(user: &str) -> Response {
    response::json(&json!({ "authenticated": true, "user": user }))
}

fn challenge_response(challenge: &Challenge) -> HandlerResult {
    let mut response = response::empty(StatusCode::UNAUTHORIZED);
    response.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        response::header_value(&challenge.header_value())?,
    );
    Ok(response)
}

/// `GET /basic-auth/<user>/<passwd>`
pub async fn basic(ex: Exchange) -> HandlerResult {
    let (user, passwd) = credentials(&ex)?;
    match basic_outcome(&ex.headers, &user, &passwd, &ex.ctx.config.auth.basic_realm) {
        AuthOutcome::Verified => Ok(authenticated(&user)),
        AuthOutcome::Challenged(challenge) => challenge_response(&challenge),
    }
}

/// `GET /hidden-basic-auth/<user>/<passwd>`: failures look like a missing page.
pub async fn hidden_basic(ex: Exchange) -> HandlerResult {
    let (user, passwd) = credentials(&ex)?;
    match basic_outcome(&ex.headers, &user, &passwd, &ex.ctx.config.auth.basic_realm) {
        AuthOutcome::Verified => Ok(authenticated(&user)),
        AuthOutcome::Challenged(_) => Ok(response::empty(StatusCode::NOT_FOUND)),
    }
}

/// `GET /digest-auth/<qop>/<user>/<passwd>`
///
/// The challenge sets a marker cookie; a retry without it is challenged again.
pub async fn digest(ex: Exchange) -> HandlerResult {
    let (user, passwd) = credentials(&ex)?;
    let qop = ex.params.str("qop").and_then(Qop::from_param);
    let client_addr = ex.client_addr.ip().to_string();
    let method = ex.method.to_string();

    let request = DigestRequest {
        method: &method,
        uri: ex.path_and_query(),
        body: &ex.body,
        authorization: ex.header(header::AUTHORIZATION),
        has_cookie: ex.headers.contains_key(header::COOKIE),
        client_addr: &client_addr,
    };

    match digest_outcome(&request, &user, &passwd, &ex.ctx.config.auth.digest_realm, qop) {
        AuthOutcome::Verified => Ok(authenticated(&user)),
        AuthOutcome::Challenged(challenge) => {
            let mut response = challenge_response(&challenge)?;
            response.headers_mut().insert(
                header::SET_COOKIE,
                response::header_value(&format!("{}; Path=/", DIGEST_MARKER_COOKIE))?,
            );
            Ok(response)
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::handlers::testing;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use md5::{Digest, Md5};
    use serde_json::json;

    fn h(data: &str) -> String {
        hex::encode(Md5::digest(data.as_bytes()))
    }

    /// Pull `key="value"` out of a challenge header.
    fn param(challenge: &str, key: &str) -> String {
        let start = challenge.find(&format!("{}=\"", key)).unwrap() + key.len() + 2;
        let len = challenge[start..].find('"').unwrap();
        challenge[start..start + len].to_string()
    }

    #[tokio::test]
    async fn test_basic_auth() {
        let denied = testing::get("/basic-auth/user/passwd").await;
        assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            denied.headers()[header::WWW_AUTHENTICATE],
            "Basic realm=\"Fake Realm\""
        );

        let allowed = testing::send(
            Request::get("/basic-auth/user/passwd")
                .header("authorization", "Basic dXNlcjpwYXNzd2Q=")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(allowed.status(), StatusCode::OK);
        assert_eq!(
            testing::json(allowed).await,
            json!({"authenticated": true, "user": "user"})
        );
    }

    #[tokio::test]
    async fn test_hidden_basic_auth_is_404() {
        let response = testing::get("/hidden-basic-auth/user/passwd").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(!response.headers().contains_key(header::WWW_AUTHENTICATE));
    }

    #[tokio::test]
    async fn test_digest_handshake() {
        let uri = "/digest-auth/auth/user/passwd";
        let first = testing::get(uri).await;
        assert_eq!(first.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(first.headers()[header::SET_COOKIE], "fake=fake_value; Path=/");

        let challenge = first.headers()[header::WWW_AUTHENTICATE]
            .to_str()
            .unwrap()
            .to_string();
        assert!(challenge.starts_with("Digest "));
        assert!(challenge.contains("qop=\"auth\""));
        let realm = param(&challenge, "realm");
        let nonce = param(&challenge, "nonce");
        let opaque = param(&challenge, "opaque");

        let ha1 = h(&format!("user:{}:passwd", realm));
        let ha2 = h(&format!("GET:{}", uri));
        let response = h(&format!("{}:{}:00000001:abcdef:auth:{}", ha1, nonce, ha2));
        let authorization = format!(
            "Digest username=\"user\", realm=\"{}\", nonce=\"{}\", uri=\"{}\", qop=auth, \
             nc=00000001, cnonce=\"abcdef\", response=\"{}\", opaque=\"{}\"",
            realm, nonce, uri, response, opaque
        );

        let retry = |cookie: Option<&str>| {
            let mut builder = Request::get(uri).header("authorization", authorization.as_str());
            if let Some(cookie) = cookie {
                builder = builder.header("cookie", cookie);
            }
            builder.body(Body::empty()).unwrap()
        };

        // without the marker cookie the client is challenged again
        let no_cookie = testing::send(retry(None)).await;
        assert_eq!(no_cookie.status(), StatusCode::UNAUTHORIZED);

        let verified = testing::send(retry(Some("fake=fake_value"))).await;
        assert_eq!(verified.status(), StatusCode::OK);
        assert_eq!(
            testing::json(verified).await,
            json!({"authenticated": true, "user": "user"})
        );
    }

    #[tokio::test]
    async fn test_digest_unknown_qop_offers_both() {
        let response = testing::get("/digest-auth/whatever/user/passwd").await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let challenge = response.headers()[header::WWW_AUTHENTICATE].to_str().unwrap();
        assert!(challenge.contains("qop=\"auth, auth-int\""));
    }
}
