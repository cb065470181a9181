//! JSON body binding for asynchronous HTTP method invocations.
//!
//! Buffers exactly `Content-Length` bytes of a chunked request body,
//! decodes the buffered bytes as JSON onto the positional arguments of a
//! pending invocation, and serializes the invocation's outcome back into
//! a JSON response body.

#![warn(missing_debug_implementations)]

mod common;

pub mod source;

pub mod body;

pub mod invocation;

pub mod serialize;

pub use source::ChunkSource;

pub use body::{AccumulatedBody, BodyError};

pub use invocation::{BindError, Failure, InvocationDescriptor, Outcome, Param, bind_from_json};

pub use serialize::{Payload, SerializationMode, respond};
