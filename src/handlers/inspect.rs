//! Request inspection endpoints: the request comes back as JSON.

use axum::http::{header, HeaderMap};
use base64ct::{Base64, Encoding as _};
use serde_json::{json, Map, Value};

use crate::handlers::HandlerResult;
use crate::http::compression::{self, Encoding};
use crate::http::{response, Exchange};

/// Headers added by hosting infrastructure, hidden unless `show_env` is given.
const ENV_HEADERS: &[&str] = &[
    "x-varnish",
    "x-request-start",
    "x-heroku-queue-depth",
    "x-real-ip",
    "x-forwarded-proto",
    "x-forwarded-protocol",
    "x-forwarded-ssl",
    "x-heroku-queue-wait-time",
    "x-forwarded-for",
    "x-heroku-dynos-in-use",
    "x-forwarded-port",
    "x-request-id",
    "runscope-service",
];

/// Parts of the request a response may echo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Field {
    Url,
    Args,
    Form,
    Data,
    Origin,
    Headers,
    Files,
    Json,
}

/// `content-type` → `Content-Type`
pub(crate) fn title_case(name: &str) -> String {
    name.split('-')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

/// Request headers as a JSON object with Title-Cased names.
pub(crate) fn headers_json(headers: &HeaderMap, hide_env: bool) -> Value {
    let mut out = Map::new();
    for name in headers.keys() {
        if hide_env && ENV_HEADERS.contains(&name.as_str()) {
            continue;
        }
        let values: Vec<String> = headers
            .get_all(name)
            .iter()
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
            .collect();
        out.insert(title_case(name.as_str()), Value::String(values.join(",")));
    }
    Value::Object(out)
}

/// Pairs to an object: one value stays a string, repeated keys become arrays.
pub(crate) fn semiflatten(pairs: Vec<(String, String)>) -> Value {
    let mut out = Map::new();
    for (key, value) in pairs {
        match out.get_mut(&key) {
            None => {
                out.insert(key, Value::String(value));
            }
            Some(Value::Array(items)) => items.push(Value::String(value)),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, Value::String(value)]);
            }
        }
    }
    Value::Object(out)
}

/// Parsed request body: form fields, uploaded files and leftover raw text.
struct ParsedBody {
    form: Value,
    files: Value,
    data: String,
}

fn parse_body(ex: &Exchange) -> ParsedBody {
    let content_type = ex.header(header::CONTENT_TYPE).unwrap_or("").to_ascii_lowercase();

    if content_type.starts_with("application/x-www-form-urlencoded") {
        let pairs = url::form_urlencoded::parse(&ex.body).into_owned().collect();
        return ParsedBody {
            form: semiflatten(pairs),
            files: json!({}),
            data: String::new(),
        };
    }

    if content_type.starts_with("multipart/form-data") {
        let boundary = ex
            .header(header::CONTENT_TYPE)
            .and_then(|ct| ct.split(';').find_map(|p| p.trim().strip_prefix("boundary=")))
            .map(|b| b.trim_matches('"').to_string());
        if let Some(boundary) = boundary {
            let (fields, files) = parse_multipart(&ex.body, &boundary);
            return ParsedBody {
                form: semiflatten(fields),
                files: semiflatten(files),
                data: String::new(),
            };
        }
    }

    ParsedBody {
        form: json!({}),
        files: json!({}),
        data: String::from_utf8_lossy(&ex.body).into_owned(),
    }
}

/// Split a `multipart/form-data` body into (fields, files).
///
/// Uploads that are not UTF-8 are echoed as `data:` URLs.
fn parse_multipart(body: &[u8], boundary: &str) -> (Vec<(String, String)>, Vec<(String, String)>) {
    let delimiter = format!("--{}", boundary);
    let mut fields = Vec::new();
    let mut files = Vec::new();

    for part in split_on(body, delimiter.as_bytes()).into_iter().skip(1) {
        if part.starts_with(b"--") {
            break;
        }
        let part = part.strip_prefix(b"\r\n").unwrap_or(part);
        let Some(head_end) = find(part, b"\r\n\r\n") else {
            continue;
        };
        let head = String::from_utf8_lossy(&part[..head_end]);
        let content = &part[head_end + 4..];
        let content = content.strip_suffix(b"\r\n").unwrap_or(content);

        let part_header = |wanted: &str| {
            head.lines().find_map(|line| {
                let (key, value) = line.split_once(':')?;
                key.trim()
                    .eq_ignore_ascii_case(wanted)
                    .then(|| value.trim().to_string())
            })
        };
        let disposition = part_header("content-disposition").unwrap_or_default();
        let attribute = |attr: &str| {
            disposition.split(';').find_map(|p| {
                p.trim()
                    .strip_prefix(attr)
                    .and_then(|v| v.strip_prefix('='))
                    .map(|v| v.trim_matches('"').to_string())
            })
        };

        let Some(name) = attribute("name") else {
            continue;
        };
        if attribute("filename").is_some() {
            let content_type = part_header("content-type");
            files.push((name, text_or_data_url(content, content_type.as_deref())));
        } else {
            fields.push((name, String::from_utf8_lossy(content).into_owned()));
        }
    }

    (fields, files)
}

fn text_or_data_url(content: &[u8], content_type: Option<&str>) -> String {
    match std::str::from_utf8(content) {
        Ok(text) => text.to_string(),
        Err(_) => format!(
            "data:{};base64,{}",
            content_type.unwrap_or(response::OCTET_STREAM),
            Base64::encode_string(content)
        ),
    }
}

fn split_on<'a>(haystack: &'a [u8], needle: &[u8]) -> Vec<&'a [u8]> {
    let mut parts = Vec::new();
    let mut rest = haystack;
    while let Some(at) = find(rest, needle) {
        parts.push(&rest[..at]);
        rest = &rest[at + needle.len()..];
    }
    parts.push(rest);
    parts
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Build the standard echo document with the requested fields.
pub(crate) fn get_dict(ex: &Exchange, fields: &[Field]) -> Map<String, Value> {
    let hide_env = !ex.has_query("show_env");
    let needs_body = fields
        .iter()
        .any(|f| matches!(f, Field::Form | Field::Data | Field::Files | Field::Json));
    let body = needs_body.then(|| parse_body(ex));

    let mut out = Map::new();
    for field in fields {
        let (key, value) = match field {
            Field::Url => ("url", Value::String(ex.url())),
            Field::Args => ("args", semiflatten(ex.query_pairs())),
            Field::Origin => ("origin", Value::String(ex.origin())),
            Field::Headers => ("headers", headers_json(&ex.headers, hide_env)),
            Field::Form => ("form", body.as_ref().map_or(Value::Null, |b| b.form.clone())),
            Field::Files => ("files", body.as_ref().map_or(Value::Null, |b| b.files.clone())),
            Field::Data => (
                "data",
                Value::String(body.as_ref().map(|b| b.data.clone()).unwrap_or_default()),
            ),
            Field::Json => {
                let data = body.as_ref().map(|b| b.data.as_bytes()).unwrap_or_default();
                ("json", serde_json::from_slice(data).unwrap_or(Value::Null))
            }
        };
        out.insert(key.to_string(), value);
    }
    out
}

/// `GET /ip`
pub async fn ip(ex: Exchange) -> HandlerResult {
    Ok(response::json(&json!({ "origin": ex.origin() })))
}

/// `GET /headers`
pub async fn headers(ex: Exchange) -> HandlerResult {
    let hide_env = !ex.has_query("show_env");
    Ok(response::json(&json!({ "headers": headers_json(&ex.headers, hide_env) })))
}

/// `GET /user-agent`
pub async fn user_agent(ex: Exchange) -> HandlerResult {
    let agent = ex.header(header::USER_AGENT).unwrap_or("");
    Ok(response::json(&json!({ "user-agent": agent })))
}

/// `GET /get`
pub async fn get(ex: Exchange) -> HandlerResult {
    let dict = get_dict(&ex, &[Field::Url, Field::Args, Field::Headers, Field::Origin]);
    Ok(response::json(&Value::Object(dict)))
}

/// `POST /post`, `PUT /put`, `PATCH /patch`, `DELETE /delete`
pub async fn method_echo(ex: Exchange) -> HandlerResult {
    let dict = get_dict(
        &ex,
        &[
            Field::Url,
            Field::Args,
            Field::Form,
            Field::Data,
            Field::Origin,
            Field::Headers,
            Field::Files,
            Field::Json,
        ],
    );
    Ok(response::json(&Value::Object(dict)))
}

async fn encoded_echo(ex: Exchange, encoding: Encoding) -> HandlerResult {
    let mut dict = get_dict(&ex, &[Field::Origin, Field::Headers]);
    dict.insert("method".to_string(), Value::String(ex.method.to_string()));
    let flag = match encoding {
        Encoding::Gzip => "gzipped",
        Encoding::Deflate => "deflated",
    };
    dict.insert(flag.to_string(), Value::Bool(true));

    let plain = response::json(&Value::Object(dict));
    Ok(compression::encode(plain, encoding).await)
}

/// `GET /gzip`
pub async fn gzip(ex: Exchange) -> HandlerResult {
    encoded_echo(ex, Encoding::Gzip).await
}

/// `GET /deflate`
pub async fn deflate(ex: Exchange) -> HandlerResult {
    encoded_echo(ex, Encoding::Deflate).await
}
