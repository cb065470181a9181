use std::{fmt, str::Utf8Error};

use crate::common::BoxError;

/// Error while accumulating or materializing a request body.
pub struct BodyError {
    kind: Kind,
}

enum Kind {
    ShortBody { read: u64, declared: u64 },
    Overrun { declared: u64 },
    Timeout,
    Source(BoxError),
    Utf8(Utf8Error),
}

impl BodyError {
    pub(super) fn short_body(read: u64, declared: u64) -> Self {
        Self { kind: Kind::ShortBody { read, declared } }
    }

    pub(super) fn overrun(declared: u64) -> Self {
        Self { kind: Kind::Overrun { declared } }
    }

    pub(super) fn timeout() -> Self {
        Self { kind: Kind::Timeout }
    }

    pub(super) fn source(error: impl Into<BoxError>) -> Self {
        Self { kind: Kind::Source(error.into()) }
    }

    pub(super) fn utf8(error: Utf8Error) -> Self {
        Self { kind: Kind::Utf8(error) }
    }

    /// The source ended before the declared content length was reached.
    pub fn is_short_body(&self) -> bool {
        matches!(self.kind, Kind::ShortBody { .. })
    }

    /// A chunk would have pushed the running total past the declared length.
    pub fn is_overrun(&self) -> bool {
        matches!(self.kind, Kind::Overrun { .. })
    }

    /// The accumulation deadline elapsed.
    pub fn is_timeout(&self) -> bool {
        matches!(self.kind, Kind::Timeout)
    }

    /// The accumulated bytes are not valid UTF-8.
    pub fn is_utf8(&self) -> bool {
        matches!(self.kind, Kind::Utf8(_))
    }
}

impl std::error::Error for BodyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            Kind::Source(error) => Some(error.as_ref()),
            Kind::Utf8(error) => Some(error),
            _ => None,
        }
    }
}

impl fmt::Debug for BodyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut f = f.debug_tuple("BodyError");
        match &self.kind {
            Kind::ShortBody { read, declared } => f.field(&format_args!(
                "ShortBody {{ read: {read}, declared: {declared} }}"
            )),
            Kind::Overrun { declared } => {
                f.field(&format_args!("Overrun {{ declared: {declared} }}"))
            }
            Kind::Timeout => f.field(&"Timeout"),
            Kind::Source(error) => f.field(&error),
            Kind::Utf8(error) => f.field(&error),
        }
        .finish()
    }
}

impl fmt::Display for BodyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            Kind::ShortBody { read, declared } => {
                write!(f, "body ended after {read} of {declared} declared bytes")
            }
            Kind::Overrun { declared } => {
                write!(f, "body exceeded the declared length of {declared} bytes")
            }
            Kind::Timeout => f.write_str("timed out reading body"),
            Kind::Source(error) => error.fmt(f),
            Kind::Utf8(error) => error.fmt(f),
        }
    }
}
