//! Invocation metadata: formal parameters, argument slots, and outcomes.

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::{any::Any, fmt};

use crate::common::BoxError;

mod bind;

pub use bind::{BindError, bind_from_json};

/// A resolved argument value.
pub type ArgValue = Box<dyn Any + Send>;

type DecodeFn = fn(Value) -> Result<ArgValue, serde_json::Error>;

fn decode_as<T>(value: Value) -> Result<ArgValue, serde_json::Error>
where
    T: DeserializeOwned + Send + 'static,
{
    serde_json::from_value::<T>(value).map(|value| Box::new(value) as ArgValue)
}

// ===== Param =====

/// Where a formal parameter's value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamSource {
    /// Decoded from the JSON request body.
    Body,
    /// Populated elsewhere: route, query, shared state.
    Context,
}

/// A formal parameter of the target method.
pub struct Param {
    name: &'static str,
    kind: Kind,
}

enum Kind {
    Body(DecodeFn),
    Context,
}

impl Param {
    /// A parameter decoded from the request body as `T`.
    pub fn body<T>(name: &'static str) -> Self
    where
        T: DeserializeOwned + Send + 'static,
    {
        Self { name, kind: Kind::Body(decode_as::<T>) }
    }

    /// A parameter resolved outside of body binding.
    pub fn context(name: &'static str) -> Self {
        Self { name, kind: Kind::Context }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn source(&self) -> ParamSource {
        match self.kind {
            Kind::Body(_) => ParamSource::Body,
            Kind::Context => ParamSource::Context,
        }
    }

    fn decoder(&self) -> Option<DecodeFn> {
        match self.kind {
            Kind::Body(decode) => Some(decode),
            Kind::Context => None,
        }
    }
}

impl fmt::Debug for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Param")
            .field("name", &self.name)
            .field("source", &self.source())
            .finish()
    }
}

// ===== InvocationDescriptor =====

/// A pending method call: its formal parameters, the slots its resolved
/// arguments are written into, and, after execution, its outcome.
///
/// Slot order is the parameter's position among *all* parameters, so
/// route- or query-bound arguments keep their slots across body binding.
pub struct InvocationDescriptor {
    params: Vec<Param>,
    slots: Vec<Option<ArgValue>>,
    outcome: Outcome,
}

impl InvocationDescriptor {
    pub fn new(params: Vec<Param>) -> Self {
        let slots = params.iter().map(|_| None).collect();
        Self { params, slots, outcome: Outcome::Pending }
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// Typed view of a resolved argument slot.
    pub fn argument<T: 'static>(&self, position: usize) -> Option<&T> {
        self.slots.get(position)?.as_ref()?.downcast_ref()
    }

    /// Remove and return a resolved argument.
    ///
    /// The slot is left untouched when it holds a value of another type.
    pub fn take_argument<T: 'static>(&mut self, position: usize) -> Option<T> {
        let slot = self.slots.get_mut(position)?;
        match slot.take()?.downcast::<T>() {
            Ok(value) => Some(*value),
            Err(other) => {
                *slot = Some(other);
                None
            }
        }
    }

    /// Store an argument resolved outside of body binding.
    ///
    /// # Panics
    ///
    /// Panics when `position` is out of bounds.
    pub fn set_argument<T: Send + 'static>(&mut self, position: usize, value: T) {
        self.slots[position] = Some(Box::new(value));
    }

    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    /// Record the invocation's outcome.
    pub fn set_outcome(&mut self, outcome: Outcome) {
        self.outcome = outcome;
    }

    pub fn into_outcome(self) -> Outcome {
        self.outcome
    }
}

impl fmt::Debug for InvocationDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvocationDescriptor")
            .field("params", &self.params)
            .field("resolved", &self.slots.iter().filter(|s| s.is_some()).count())
            .field("outcome", &self.outcome)
            .finish()
    }
}

// ===== Outcome =====

/// The result of attempting the target method: a produced value or a
/// captured failure, never both.
#[derive(Debug, Default)]
pub enum Outcome {
    /// The method has not run yet.
    #[default]
    Pending,
    /// The method returned without a value; no response body is produced.
    Unit,
    /// The method produced a value, captured as JSON.
    Value(Value),
    /// The method raised a failure.
    Failure(Failure),
}

impl Outcome {
    /// Capture a return value.
    ///
    /// A `null` return is treated as a void success.
    pub fn value<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        Ok(match serde_json::to_value(value)? {
            Value::Null => Self::Unit,
            value => Self::Value(value),
        })
    }

    /// Capture a failure.
    pub fn failure(failure: Failure) -> Self {
        Self::Failure(failure)
    }
}

// ===== Failure =====

/// A captured invocation failure.
pub struct Failure {
    error: BoxError,
    wrapped: bool,
}

impl Failure {
    /// A failure raised directly, reported as-is.
    pub fn new(error: impl Into<BoxError>) -> Self {
        Self { error: error.into(), wrapped: false }
    }

    /// A failure raised inside the target method, carried by one level of
    /// invocation wrapper whose [`source`][std::error::Error::source] is
    /// the underlying cause.
    pub fn invocation(error: impl Into<BoxError>) -> Self {
        Self { error: error.into(), wrapped: true }
    }

    /// The message to report, with the invocation wrapper stripped.
    pub fn root_message(&self) -> String {
        match (self.wrapped, self.error.source()) {
            (true, Some(cause)) => cause.to_string(),
            _ => self.error.to_string(),
        }
    }
}

impl fmt::Debug for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut f = f.debug_tuple("Failure");
        if self.wrapped {
            f.field(&format_args!("wrapped"));
        }
        f.field(&self.error).finish()
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.root_message())
    }
}
