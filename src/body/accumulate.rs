use std::{
    pin::Pin,
    task::{Context, Poll, ready},
    time::Duration,
};
use tokio::time::Sleep;

use super::{AccumulatedBody, BodyError};
use crate::source::ChunkSource;

pin_project_lite::pin_project! {
    /// Future that drives a [`ChunkSource`] until exactly the declared
    /// number of body bytes has arrived.
    ///
    /// Suspends once per chunk: the future is pending exactly when the
    /// source is. A declared length of zero resolves on the first poll
    /// without touching the source.
    #[derive(Debug)]
    pub struct Accumulate<S> {
        #[pin]
        source: S,
        declared: u64,
        #[pin]
        deadline: Option<Sleep>,
        body: Option<AccumulatedBody>,
    }
}

impl<S: ChunkSource> Accumulate<S> {
    pub(super) fn new(source: S, declared: u64, timeout: Option<Duration>) -> Self {
        Self {
            source,
            declared,
            deadline: timeout.map(tokio::time::sleep),
            body: Some(AccumulatedBody::empty()),
        }
    }
}

impl<S: ChunkSource> Future for Accumulate<S> {
    type Output = Result<AccumulatedBody, BodyError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut me = self.project();

        if *me.declared == 0 {
            return Poll::Ready(Ok(me.body.take().expect("poll after complete")));
        }

        loop {
            if let Some(deadline) = me.deadline.as_mut().as_pin_mut() {
                if deadline.poll(cx).is_ready() {
                    return Poll::Ready(Err(BodyError::timeout()));
                }
            }

            let Some(chunk) = ready!(me.source.as_mut().poll_chunk(cx)) else {
                let read = me.body.as_ref().expect("poll after complete").len();
                return Poll::Ready(Err(BodyError::short_body(read, *me.declared)));
            };

            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(err) => return Poll::Ready(Err(BodyError::source(err))),
            };

            // zero-length data chunks carry nothing
            if chunk.is_empty() {
                continue;
            }

            let body = me.body.as_mut().expect("poll after complete");

            if body.len() + chunk.len() as u64 > *me.declared {
                return Poll::Ready(Err(BodyError::overrun(*me.declared)));
            }

            body.push(chunk);

            if body.len() == *me.declared {
                return Poll::Ready(Ok(me.body.take().expect("poll after complete")));
            }
        }
    }
}
