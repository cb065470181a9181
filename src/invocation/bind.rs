use serde::Deserialize;
use serde_json::{Deserializer, Value};
use std::{fmt, time::Duration};

use super::{Failure, InvocationDescriptor, ParamSource};
use crate::{
    body::{AccumulatedBody, BodyError},
    source::ChunkSource,
};

impl InvocationDescriptor {
    /// Decode `buffer` and write the decoded values into the body-sourced
    /// argument slots.
    ///
    /// A single body-sourced parameter is decoded from one bare JSON value;
    /// bytes after that value are left unread. Two or more are decoded from
    /// a JSON array, one element per parameter in declared order. Extra
    /// array elements are ignored, missing ones are an arity error.
    ///
    /// Slots of non-body parameters are never touched.
    pub fn bind_json(&mut self, buffer: &str) -> Result<(), BindError> {
        let positions: Vec<usize> = self
            .params
            .iter()
            .enumerate()
            .filter(|(_, param)| param.source() == ParamSource::Body)
            .map(|(position, _)| position)
            .collect();

        match positions.as_slice() {
            [] => Ok(()),
            [position] => {
                let mut de = Deserializer::from_str(buffer);
                let value = Value::deserialize(&mut de)?;
                self.write_slot(*position, value)
            }
            positions => {
                let elements = Vec::<Value>::deserialize(&mut Deserializer::from_str(buffer))?;
                if elements.len() < positions.len() {
                    return Err(BindError::Arity {
                        expected: positions.len(),
                        got: elements.len(),
                    });
                }
                for (position, element) in positions.iter().zip(elements) {
                    self.write_slot(*position, element)?;
                }
                Ok(())
            }
        }
    }

    fn write_slot(&mut self, position: usize, value: Value) -> Result<(), BindError> {
        let decode = self.params[position].decoder().expect("body-sourced parameter");
        self.slots[position] = Some(decode(value)?);
        Ok(())
    }
}

/// Buffer the request body from `source` and bind the body-sourced
/// parameters of `descriptor` from it.
///
/// Reads nothing when the descriptor has no body-sourced parameters or
/// `content_length` is zero. `deadline` bounds the whole accumulation;
/// `None` waits on the source indefinitely.
///
/// Any error aborts binding for this request; callers convert it into the
/// serialized failure response, never into a partial invocation.
pub async fn bind_from_json<S>(
    descriptor: &mut InvocationDescriptor,
    source: S,
    content_length: u64,
    deadline: Option<Duration>,
) -> Result<(), BindError>
where
    S: ChunkSource,
{
    let has_body_params = descriptor
        .params()
        .iter()
        .any(|param| param.source() == ParamSource::Body);

    if content_length == 0 || !has_body_params {
        return Ok(());
    }

    let body = match deadline {
        Some(timeout) => {
            AccumulatedBody::accumulate_with_deadline(source, content_length, timeout).await?
        }
        None => AccumulatedBody::accumulate(source, content_length).await?,
    };

    descriptor.bind_json(&body.materialize()?)
}

// ===== Error =====

/// Error while binding body-sourced arguments.
#[derive(Debug)]
pub enum BindError {
    /// The body could not be accumulated or materialized.
    Body(BodyError),
    /// The buffer does not decode as the expected shape.
    Decode(serde_json::Error),
    /// The body array holds fewer elements than there are body-sourced
    /// parameters.
    Arity { expected: usize, got: usize },
}

impl From<BodyError> for BindError {
    fn from(error: BodyError) -> Self {
        Self::Body(error)
    }
}

impl From<serde_json::Error> for BindError {
    fn from(error: serde_json::Error) -> Self {
        Self::Decode(error)
    }
}

impl From<BindError> for Failure {
    fn from(error: BindError) -> Self {
        Self::new(error)
    }
}

impl std::error::Error for BindError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Body(error) => Some(error),
            Self::Decode(error) => Some(error),
            Self::Arity { .. } => None,
        }
    }
}

impl fmt::Display for BindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Body(error) => error.fmt(f),
            Self::Decode(error) => error.fmt(f),
            Self::Arity { expected, got } => {
                write!(f, "expected a body array of {expected} elements, got {got}")
            }
        }
    }
}

#[cfg(test)]
mod test {
    use bytes::Bytes;
    use serde::Deserialize;
    use std::{
        collections::VecDeque,
        convert::Infallible,
        pin::Pin,
        task::{Context, Poll},
    };

    use super::{BindError, bind_from_json};
    use crate::{
        invocation::{InvocationDescriptor, Param},
        source::{ChunkSource, Fixed},
    };

    #[derive(Debug, Deserialize, PartialEq)]
    struct Point {
        x: i32,
        y: i32,
    }

    struct Chunks(VecDeque<&'static [u8]>);

    impl ChunkSource for Chunks {
        type Error = Infallible;

        fn poll_chunk(
            self: Pin<&mut Self>,
            _: &mut Context<'_>,
        ) -> Poll<Option<Result<Bytes, Infallible>>> {
            Poll::Ready(self.get_mut().0.pop_front().map(Bytes::from_static).map(Ok))
        }
    }

    struct Untouchable;

    impl ChunkSource for Untouchable {
        type Error = Infallible;

        fn poll_chunk(
            self: Pin<&mut Self>,
            _: &mut Context<'_>,
        ) -> Poll<Option<Result<Bytes, Infallible>>> {
            panic!("source polled")
        }
    }

    #[test]
    fn single_param_decodes_one_bare_value() {
        let mut descriptor = InvocationDescriptor::new(vec![Param::body::<Point>("point")]);

        descriptor.bind_json(r#"{"x":1,"y":2}"#).unwrap();

        assert_eq!(descriptor.argument::<Point>(0), Some(&Point { x: 1, y: 2 }));
    }

    #[test]
    fn single_param_leaves_trailing_bytes_unread() {
        let mut descriptor = InvocationDescriptor::new(vec![Param::body::<u32>("n")]);

        descriptor.bind_json("42 whatever follows").unwrap();

        assert_eq!(descriptor.argument::<u32>(0), Some(&42));
    }

    #[test]
    fn multiple_params_decode_from_an_array() {
        let mut descriptor = InvocationDescriptor::new(vec![
            Param::body::<i32>("a"),
            Param::body::<String>("b"),
        ]);

        descriptor.bind_json(r#"[1,"hi"]"#).unwrap();

        assert_eq!(descriptor.argument::<i32>(0), Some(&1));
        assert_eq!(descriptor.argument::<String>(1).unwrap(), "hi");
    }

    #[test]
    fn slots_keep_their_declared_positions() {
        let mut descriptor = InvocationDescriptor::new(vec![
            Param::context("id"),
            Param::body::<i32>("a"),
            Param::context("session"),
            Param::body::<String>("b"),
        ]);

        descriptor.set_argument(0, 7usize);
        descriptor.bind_json(r#"[3,"three"]"#).unwrap();

        assert_eq!(descriptor.argument::<usize>(0), Some(&7));
        assert_eq!(descriptor.argument::<i32>(1), Some(&3));
        assert!(descriptor.argument::<String>(2).is_none());
        assert_eq!(descriptor.argument::<String>(3).unwrap(), "three");
    }

    #[test]
    fn missing_array_elements_are_an_arity_error() {
        let mut descriptor = InvocationDescriptor::new(vec![
            Param::body::<i32>("a"),
            Param::body::<String>("b"),
        ]);

        let err = descriptor.bind_json("[1]").unwrap_err();

        assert!(matches!(err, BindError::Arity { expected: 2, got: 1 }));
    }

    #[test]
    fn type_mismatch_is_a_decode_error() {
        let mut descriptor = InvocationDescriptor::new(vec![Param::body::<u32>("n")]);

        assert!(matches!(
            descriptor.bind_json(r#""not a number""#),
            Err(BindError::Decode(_)),
        ));
    }

    #[test]
    fn malformed_json_is_a_decode_error() {
        let mut descriptor = InvocationDescriptor::new(vec![
            Param::body::<i32>("a"),
            Param::body::<i32>("b"),
        ]);

        assert!(matches!(descriptor.bind_json("[1,"), Err(BindError::Decode(_))));
    }

    #[tokio::test]
    async fn chunked_body_binds_in_declared_order() {
        // thirteen bytes split as five plus eight
        let source = Chunks([b"[1,\"h".as_slice(), b"i\",true]".as_slice()].into());
        let mut descriptor = InvocationDescriptor::new(vec![
            Param::body::<i32>("a"),
            Param::body::<String>("b"),
        ]);

        bind_from_json(&mut descriptor, source, 13, None).await.unwrap();

        assert_eq!(descriptor.argument::<i32>(0), Some(&1));
        assert_eq!(descriptor.argument::<String>(1).unwrap(), "hi");
    }

    #[tokio::test]
    async fn zero_content_length_skips_the_source() {
        let mut descriptor = InvocationDescriptor::new(vec![Param::body::<u32>("n")]);

        bind_from_json(&mut descriptor, Untouchable, 0, None).await.unwrap();

        assert!(descriptor.argument::<u32>(0).is_none());
    }

    #[tokio::test]
    async fn no_body_params_skips_the_source() {
        let mut descriptor = InvocationDescriptor::new(vec![Param::context("id")]);

        bind_from_json(&mut descriptor, Untouchable, 64, None).await.unwrap();
    }

    #[tokio::test]
    async fn truncated_body_aborts_without_touching_slots() {
        let source = Chunks([b"[1,\"".as_slice()].into());
        let mut descriptor = InvocationDescriptor::new(vec![
            Param::body::<i32>("a"),
            Param::body::<String>("b"),
        ]);

        let err = bind_from_json(&mut descriptor, source, 13, None).await.unwrap_err();

        match err {
            BindError::Body(body) => assert!(body.is_short_body()),
            other => panic!("expected a short body error, got {other:?}"),
        }
        assert!(descriptor.argument::<i32>(0).is_none());
        assert!(descriptor.argument::<String>(1).is_none());
    }

    #[tokio::test]
    async fn fixed_source_round_trip() {
        let source = Fixed::from(Bytes::from_static(b"[4,\"quad\"]"));
        let mut descriptor = InvocationDescriptor::new(vec![
            Param::body::<i32>("a"),
            Param::body::<String>("b"),
        ]);

        bind_from_json(&mut descriptor, source, 10, None).await.unwrap();

        assert_eq!(descriptor.take_argument::<i32>(0), Some(4));
        assert_eq!(descriptor.take_argument::<String>(1).unwrap(), "quad");
    }
}
