//! Asynchronous request body chunk delivery.

use bytes::Bytes;
use http_body::Body as _;
use std::{
    pin::Pin,
    task::{Context, Poll, ready},
};

/// An asynchronous source of request body chunks.
///
/// Repeated polls yield further chunks of the same logical body, in arrival
/// order. `None` is returned only at end-of-stream; a source that ends before
/// the declared content length is reached is a truncated request.
pub trait ChunkSource {
    type Error: std::error::Error + Send + Sync + 'static;

    fn poll_chunk(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Bytes, Self::Error>>>;
}

// ===== Fixed =====

/// In-memory [`ChunkSource`] for a body that is already fully available.
#[derive(Debug, Default)]
pub enum Fixed {
    Full(Bytes),
    #[default]
    Empty,
}

impl From<Bytes> for Fixed {
    fn from(value: Bytes) -> Self {
        if value.is_empty() { Self::Empty } else { Self::Full(value) }
    }
}

impl ChunkSource for Fixed {
    type Error = std::convert::Infallible;

    fn poll_chunk(
        self: Pin<&mut Self>,
        _: &mut Context<'_>,
    ) -> Poll<Option<Result<Bytes, Self::Error>>> {
        let ok = match self.get_mut() {
            Fixed::Full(bytes) if bytes.is_empty() => None,
            Fixed::Full(bytes) => Some(std::mem::take(bytes)),
            Fixed::Empty => None,
        };

        Poll::Ready(ok.map(Ok))
    }
}

// ===== Hyper =====

/// Data frames pass through as chunks, trailer frames carry no body bytes
/// and are skipped.
impl ChunkSource for hyper::body::Incoming {
    type Error = hyper::Error;

    fn poll_chunk(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Bytes, Self::Error>>> {
        loop {
            let Some(frame) = ready!(self.as_mut().poll_frame(cx)?) else {
                return Poll::Ready(None);
            };

            if let Ok(data) = frame.into_data() {
                return Poll::Ready(Some(Ok(data)));
            }
        }
    }
}
