//! Request body accumulation and materialization.

use bytes::Bytes;
use std::time::Duration;

use crate::source::ChunkSource;

mod accumulate;
mod error;
mod materialize;

pub use accumulate::Accumulate;
pub use error::BodyError;

/// A completed request body: the ordered byte ranges of exactly the
/// declared content length.
///
/// Ranges reproduce the original byte stream order, and their lengths sum
/// to the declared length once accumulation completes.
#[derive(Debug, Default)]
pub struct AccumulatedBody {
    ranges: Vec<Bytes>,
    len: u64,
}

impl AccumulatedBody {
    /// A body with no bytes.
    pub const fn empty() -> Self {
        Self { ranges: Vec::new(), len: 0 }
    }

    /// Accumulate exactly `declared` bytes from `source`.
    ///
    /// The returned future suspends once per chunk and waits for the source
    /// indefinitely, see [`accumulate_with_deadline`][Self::accumulate_with_deadline]
    /// for a bounded wait.
    pub fn accumulate<S: ChunkSource>(source: S, declared: u64) -> Accumulate<S> {
        Accumulate::new(source, declared, None)
    }

    /// Accumulate exactly `declared` bytes from `source`, failing with a
    /// timeout error if the source has not delivered them within `timeout`.
    ///
    /// Requires a tokio runtime.
    pub fn accumulate_with_deadline<S: ChunkSource>(
        source: S,
        declared: u64,
        timeout: Duration,
    ) -> Accumulate<S> {
        Accumulate::new(source, declared, Some(timeout))
    }

    /// Total bytes accumulated so far.
    pub fn len(&self) -> u64 {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The accumulated byte ranges, in arrival order.
    pub fn ranges(&self) -> &[Bytes] {
        &self.ranges
    }

    fn push(&mut self, chunk: Bytes) {
        self.len += chunk.len() as u64;
        self.ranges.push(chunk);
    }
}
