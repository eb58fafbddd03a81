//! Cookie endpoints.
//!
//! Setting and deleting cookies answers with a redirect to `/cookies`, so a
//! client following redirects sees its jar right away.

use axum::http::header;
use serde_json::{json, Map, Value};

use crate::error::HandlerError;
use crate::handlers::HandlerResult;
use crate::http::{response, Exchange};
use crate::routing::Params;

/// Analytics cookies hidden unless `show_env` is given.
const ENV_COOKIES: &[&str] = &[
    "_gauges_unique",
    "_gauges_unique_year",
    "_gauges_unique_month",
    "_gauges_unique_day",
    "_gauges_unique_hour",
    "__utmz",
    "__utma",
    "__utmb",
];

const EXPIRED: &str = "Thu, 01 Jan 1970 00:00:00 GMT";

/// Name/value pairs from every `Cookie` header, in order.
fn request_cookies(ex: &Exchange) -> Vec<(String, String)> {
    ex.headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|line| line.split(';'))
        .filter_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            Some((name.trim().to_string(), value.trim().to_string()))
        })
        .filter(|(name, _)| !name.is_empty())
        .collect()
}

/// `302` to `/cookies` carrying the given `Set-Cookie` values.
fn back_to_jar(ex: &Exchange, set_cookies: &[String]) -> HandlerResult {
    let location = ex.url_for("cookies", &Params::new())?;
    let mut response = response::redirect(&location)?;
    for cookie in set_cookies {
        response
            .headers_mut()
            .append(header::SET_COOKIE, response::header_value(cookie)?);
    }
    Ok(response)
}

/// `GET /cookies`
pub async fn view(ex: Exchange) -> HandlerResult {
    let hide_env = !ex.has_query("show_env");
    let mut cookies = Map::new();
    for (name, value) in request_cookies(&ex) {
        if hide_env && ENV_COOKIES.contains(&name.as_str()) {
            continue;
        }
        cookies.insert(name, Value::String(value));
    }
    Ok(response::json(&json!({ "cookies": cookies })))
}

/// `GET /cookies/set/<name>/<value>`
pub async fn set_one(ex: Exchange) -> HandlerResult {
    let (Some(name), Some(value)) = (ex.params.str("name"), ex.params.str("value")) else {
        return Err(HandlerError::Internal("route lacks cookie placeholders".into()));
    };
    let cookie = format!("{}={}; Path=/", name, value);
    back_to_jar(&ex, &[cookie])
}

/// `GET /cookies/set?name=value&...`
pub async fn set_from_query(ex: Exchange) -> HandlerResult {
    let cookies: Vec<String> = ex
        .query_pairs()
        .into_iter()
        .map(|(name, value)| format!("{}={}; Path=/", name, value))
        .collect();
    back_to_jar(&ex, &cookies)
}

/// `GET /cookies/delete?name&...`
pub async fn delete(ex: Exchange) -> HandlerResult {
    let cookies: Vec<String> = ex
        .query_pairs()
        .into_iter()
        .map(|(name, _)| format!("{}=; Expires={}; Max-Age=0; Path=/", name, EXPIRED))
        .collect();
    back_to_jar(&ex, &cookies)
}

#[cfg(test)]
mod tests {
    use crate::handlers::testing;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use serde_json::json;

    fn with_cookie(uri: &str, cookie: &str) -> Request<Body> {
        Request::get(uri)
            .header("cookie", cookie)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_view_lists_cookies() {
        let response = testing::send(with_cookie("/cookies", "a=1; b=two")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            testing::json(response).await,
            json!({"cookies": {"a": "1", "b": "two"}})
        );
    }

    #[tokio::test]
    async fn test_env_cookies_hidden() {
        let hidden = testing::send(with_cookie("/cookies", "__utma=x; keep=1")).await;
        assert_eq!(testing::json(hidden).await, json!({"cookies": {"keep": "1"}}));

        let shown = testing::send(with_cookie("/cookies?show_env=1", "__utma=x")).await;
        assert_eq!(testing::json(shown).await["cookies"]["__utma"], "x");
    }

    #[tokio::test]
    async fn test_set_one_redirects_to_jar() {
        let response = testing::get("/cookies/set/flavor/oatmeal").await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "/cookies");
        assert_eq!(
            response.headers()[header::SET_COOKIE],
            "flavor=oatmeal; Path=/"
        );
    }

    #[tokio::test]
    async fn test_set_from_query_sets_each_pair() {
        let response = testing::get("/cookies/set?a=1&b=2").await;
        let cookies: Vec<_> = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect();
        assert_eq!(cookies, vec!["a=1; Path=/", "b=2; Path=/"]);
    }

    #[tokio::test]
    async fn test_delete_expires_cookie() {
        let response = testing::get("/cookies/delete?a").await;
        assert_eq!(response.status(), StatusCode::FOUND);
        let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with("a=; Expires=Thu, 01 Jan 1970"));
        assert!(cookie.contains("Max-Age=0"));
    }
}
