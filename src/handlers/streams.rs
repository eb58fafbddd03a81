//! Streaming, random-byte and byte-range endpoints.
//!
//! # Data Flow
//! ```text
//! query (n, chunk_size, duration, delay, seed)
//!     → limits from LimitsConfig
//!     → BodyProducer (unit_fn, chunk size, pacing)
//!     → Body::from_stream
//! ```
//!
//! # Design Decisions
//! - Every body is produced lazily; nothing is buffered ahead of the consumer
//! - `/range` content depends on byte position only, never on a seed
//! - `/bytes` and `/stream-bytes` use the request's random source

use std::time::Duration;

use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::Response;
use serde_json::Value;

use crate::error::HandlerError;
use crate::handlers::inspect::{get_dict, Field};
use crate::handlers::HandlerResult;
use crate::http::{response, Exchange};
use crate::range::{clamp_length, deterministic_byte, resolve, ByteRange, RangeResolution};
use crate::streaming::{BodyProducer, Pacing};

fn int_param(ex: &Exchange, name: &str) -> Result<u64, HandlerError> {
    ex.params
        .int(name)
        .ok_or_else(|| HandlerError::Internal(format!("route has no '{}' placeholder", name)))
}

/// Seconds as a `Duration`; negatives are zero, overflow saturates.
pub(crate) fn seconds(value: f64) -> Duration {
    Duration::try_from_secs_f64(value.max(0.0)).unwrap_or(Duration::MAX)
}

fn streaming(status: StatusCode, content_type: &'static str, body: Body) -> Response {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

/// `GET /stream/<n>`: `n` JSON documents, one per line.
pub async fn stream_messages(ex: Exchange) -> HandlerResult {
    let n = int_param(&ex, "n")?.min(ex.ctx.config.limits.max_stream_messages);
    let base = get_dict(&ex, &[Field::Url, Field::Args, Field::Headers, Field::Origin]);

    let producer = BodyProducer::new(n, move |id| {
        let mut doc = base.clone();
        doc.insert("id".to_string(), Value::from(id));
        let mut line = Value::Object(doc).to_string();
        line.push('\n');
        line
    })
    .with_label("stream");

    Ok(streaming(StatusCode::OK, response::JSON, producer.into_body()))
}

/// `GET /drip?numbytes=&duration=&delay=&code=`
pub async fn drip(ex: Exchange) -> HandlerResult {
    let limits = &ex.ctx.config.limits;
    let numbytes: u64 = ex.query_or("numbytes", 10)?;
    let duration: f64 = ex.query_or("duration", 2.0)?;
    let delay: f64 = ex.query_or("delay", 0.0)?;
    let code: u16 = ex.query_or("code", 200)?;

    if numbytes == 0 {
        return Err(HandlerError::bad_request("number of bytes must be positive"));
    }
    let numbytes = numbytes.min(limits.max_drip_bytes);
    let status = StatusCode::from_u16(code)
        .map_err(|_| HandlerError::bad_request(format!("invalid status code: {}", code)))?;

    let producer = BodyProducer::new(numbytes, |_| *b"*")
        .with_pacing(Pacing::Spread(seconds(duration)))
        .with_initial_delay(seconds(delay.min(limits.max_delay_secs)))
        .with_label("drip");

    tracing::debug!(numbytes, duration, delay, code, "Dripping body");

    let mut response = streaming(status, response::OCTET_STREAM, producer.into_body());
    response
        .headers_mut()
        .insert(header::CONTENT_LENGTH, HeaderValue::from(numbytes));
    Ok(response)
}

/// `GET /bytes/<n>`
pub async fn random_bytes(ex: Exchange) -> HandlerResult {
    let n = clamp_length(int_param(&ex, "n")?, ex.ctx.config.limits.max_bytes);
    let mut rng = ex.random()?;

    let mut bytes = vec![0u8; n as usize];
    rng.fill(&mut bytes);
    Ok(response::with_type(StatusCode::OK, response::OCTET_STREAM, bytes))
}

/// `GET /stream-bytes/<n>?chunk_size=`
pub async fn stream_bytes(ex: Exchange) -> HandlerResult {
    let limits = &ex.ctx.config.limits;
    let n = clamp_length(int_param(&ex, "n")?, limits.max_bytes);
    let chunk_size: u64 = ex.query_or("chunk_size", limits.default_chunk_size)?;
    let mut rng = ex.random()?;

    let producer = BodyProducer::new(n, move |_| {
        let mut byte = [0u8; 1];
        rng.fill(&mut byte);
        byte
    })
    .with_chunk_size(chunk_size)
    .with_label("stream-bytes");

    Ok(streaming(StatusCode::OK, response::OCTET_STREAM, producer.into_body()))
}

/// `GET /range/<numbytes>?chunk_size=&duration=`
pub async fn range(ex: Exchange) -> HandlerResult {
    let limits = &ex.ctx.config.limits;
    let requested = int_param(&ex, "numbytes")?;
    let total = clamp_length(requested, limits.max_bytes);

    let etag = response::header_value(&format!("range{}", total))?;
    let base = |status: StatusCode, body: Body| {
        let mut r = streaming(status, response::OCTET_STREAM, body);
        let headers = r.headers_mut();
        headers.insert(header::ETAG, etag.clone());
        headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));
        r
    };

    if total == 0 {
        return Ok(base(StatusCode::NOT_FOUND, Body::empty()));
    }

    let chunk_size: u64 = ex.query_or("chunk_size", limits.default_chunk_size)?;
    let duration: f64 = ex.query_or("duration", 0.0)?;

    let (status, window) = match resolve(ex.header(header::RANGE), total) {
        RangeResolution::Unsatisfiable => {
            let mut r = base(StatusCode::RANGE_NOT_SATISFIABLE, Body::empty());
            r.headers_mut().insert(
                header::CONTENT_RANGE,
                response::header_value(&RangeResolution::unsatisfied_content_range(total))?,
            );
            return Ok(r);
        }
        RangeResolution::NoRangeRequested => (
            StatusCode::OK,
            ByteRange {
                first: 0,
                last: total - 1,
            },
        ),
        RangeResolution::Satisfiable(window) if window.is_full(total) => (StatusCode::OK, window),
        RangeResolution::Satisfiable(window) => (StatusCode::PARTIAL_CONTENT, window),
    };

    tracing::debug!(
        total,
        first = window.first,
        last = window.last,
        status = status.as_u16(),
        "Serving byte range"
    );

    let producer = BodyProducer::over(window.positions(), |pos| [deterministic_byte(pos)])
        .with_chunk_size(chunk_size)
        .with_pacing(Pacing::PerUnit(seconds(duration / total as f64)))
        .with_label("range");

    let mut r = base(status, producer.into_body());
    let headers = r.headers_mut();
    headers.insert(
        header::CONTENT_RANGE,
        response::header_value(&window.content_range(total))?,
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(window.len()));
    Ok(r)
}
