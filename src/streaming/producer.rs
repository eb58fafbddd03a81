//! Pull-based chunk producer.

use std::convert::Infallible;
use std::ops::Range;
use std::time::Duration;

use axum::body::{Body, Bytes};
use futures_util::stream::{self, Stream};

/// How emission is spread over time.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Pacing {
    /// Emit as fast as the consumer pulls.
    #[default]
    Immediate,
    /// Fixed delay per unit.
    PerUnit(Duration),
    /// Total duration divided evenly across all units.
    Spread(Duration),
}

impl Pacing {
    fn per_unit(&self, total_units: u64) -> Duration {
        match *self {
            Pacing::Immediate => Duration::ZERO,
            Pacing::PerUnit(d) => d,
            Pacing::Spread(total) => {
                if total_units == 0 {
                    Duration::ZERO
                } else {
                    total.div_f64(total_units as f64)
                }
            }
        }
    }
}

/// One emitted piece of the body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Position of this chunk in the production run, starting at 0.
    pub seq: u64,
    /// Index of the first unit contained in `data`.
    pub first_unit: u64,
    pub data: Bytes,
    /// Delay honored before this chunk was produced, if any.
    pub delay: Option<Duration>,
}

/// Turns "emit these units with this pacing" into a lazy chunk sequence.
///
/// `unit_fn` receives the absolute unit index and returns that unit's bytes.
/// Units are grouped `chunk_size` at a time; the last chunk may be shorter.
/// A producer is single-use: once started it cannot be rewound.
pub struct BodyProducer<F> {
    units: Range<u64>,
    next_unit: u64,
    unit_fn: F,
    chunk_size: u64,
    per_unit: Duration,
    initial_delay: Option<Duration>,
    seq: u64,
    label: &'static str,
}

impl<F, U> BodyProducer<F>
where
    F: FnMut(u64) -> U,
    U: AsRef<[u8]>,
{
    /// Produce units `0..total_units`.
    pub fn new(total_units: u64, unit_fn: F) -> Self {
        Self::over(0..total_units, unit_fn)
    }

    /// Produce the units in `units` (absolute indices).
    pub fn over(units: Range<u64>, unit_fn: F) -> Self {
        Self {
            next_unit: units.start,
            units,
            unit_fn,
            chunk_size: 1,
            per_unit: Duration::ZERO,
            initial_delay: None,
            seq: 0,
            label: "body",
        }
    }

    /// Units per chunk. Values below 1 are treated as 1.
    pub fn with_chunk_size(mut self, chunk_size: u64) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.per_unit = pacing.per_unit(self.total_units());
        self
    }

    /// Delay honored once, before the first chunk.
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = (!delay.is_zero()).then_some(delay);
        self
    }

    /// Name used in log lines.
    pub fn with_label(mut self, label: &'static str) -> Self {
        self.label = label;
        self
    }

    pub fn total_units(&self) -> u64 {
        self.units.end.saturating_sub(self.units.start)
    }

    pub fn remaining_units(&self) -> u64 {
        self.units.end.saturating_sub(self.next_unit)
    }

    pub fn is_finished(&self) -> bool {
        self.remaining_units() == 0
    }

    /// Pull the next chunk, sleeping for its pacing delay first.
    ///
    /// Returns `None` once every unit has been emitted.
    pub async fn next_chunk(&mut self) -> Option<Chunk> {
        if self.is_finished() {
            return None;
        }

        let count = self.remaining_units().min(self.chunk_size);
        let mut delay = self
            .per_unit
            .saturating_mul(u32::try_from(count).unwrap_or(u32::MAX));
        if let Some(initial) = self.initial_delay.take() {
            delay += initial;
        }

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        Some(self.build_chunk(count, (!delay.is_zero()).then_some(delay)))
    }

    fn build_chunk(&mut self, count: u64, delay: Option<Duration>) -> Chunk {
        let first_unit = self.next_unit;
        let mut data = Vec::new();
        for index in first_unit..first_unit + count {
            data.extend_from_slice((self.unit_fn)(index).as_ref());
        }
        self.next_unit += count;

        let chunk = Chunk {
            seq: self.seq,
            first_unit,
            data: Bytes::from(data),
            delay,
        };
        self.seq += 1;
        chunk
    }
}

impl<F, U> BodyProducer<F>
where
    F: FnMut(u64) -> U + Send + 'static,
    U: AsRef<[u8]>,
{
    /// Adapt into a `Stream` of body frames.
    pub fn into_stream(self) -> impl Stream<Item = Result<Bytes, Infallible>> + Send + 'static {
        stream::unfold(self, |mut producer| async move {
            let chunk = producer.next_chunk().await?;
            Some((Ok(chunk.data), producer))
        })
    }

    /// Adapt into a streaming response body.
    pub fn into_body(self) -> Body {
        Body::from_stream(self.into_stream())
    }
}

impl<F> Drop for BodyProducer<F> {
    fn drop(&mut self) {
        let remaining = self.units.end.saturating_sub(self.next_unit);
        if remaining > 0 && self.next_unit > self.units.start {
            tracing::debug!(
                body = self.label,
                emitted_units = self.next_unit - self.units.start,
                remaining_units = remaining,
                "Streaming body cancelled by consumer"
            );
        }
    }
}
