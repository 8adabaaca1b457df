//! Entry-point handler types.
//!
//! A [`Handler`] is the opaque invocation handle attached to every
//! [`Signature`](crate::Signature). Once the matcher has selected a
//! signature, the runner hands its handler the [`BoundArgs`]: every
//! parameter name mapped to its coerced value, in declaration order.
//!
//! # Core Types
//!
//! - [`BoundArgs`]: The arguments bound to the selected signature
//! - [`HandlerResult`]: The result type for handlers (`Result<(), anyhow::Error>`)
//! - [`Handler`]: Trait for entry points (`&mut self`)
//! - [`FnHandler`]: Adapter turning a closure into a [`Handler`]

use crate::value::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Arguments bound to one signature.
///
/// Values are kept in the order the parameters were declared. Named keys
/// absorbed by a catch-all parameter live in [`extra`](BoundArgs::extra).
///
/// # Example
///
/// ```rust
/// use mainsig::{
///     match_candidates, CandidateSet, Capture, DispatchOutcome, ParamSpec, Signature, ValueType,
/// };
///
/// let candidates: CandidateSet = vec![Signature::from_fn(|_| Ok(()))
///     .param(ParamSpec::positional("count", ValueType::Integer))]
///     .into();
///
/// let capture = Capture::new().with_positional("3");
/// let DispatchOutcome::Matched { bound, .. } = match_candidates(&capture, &candidates) else {
///     panic!("expected a match");
/// };
/// assert_eq!(bound.get_int("count"), Some(3));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundArgs {
    values: Vec<(String, Value)>,
    extra: BTreeMap<String, Value>,
}

impl BoundArgs {
    /// Creates an empty set of bound arguments.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, name: impl Into<String>, value: Value) {
        self.values.push((name.into(), value));
    }

    pub(crate) fn insert_extra(&mut self, name: impl Into<String>, value: Value) {
        self.extra.insert(name.into(), value);
    }

    /// Gets the value bound to `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    /// Returns true if a value is bound to `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn get_int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_int)
    }

    pub fn get_float(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Value::as_float)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    pub fn get_list(&self, name: &str) -> Option<&[Value]> {
        self.get(name).and_then(Value::as_list)
    }

    /// Named values absorbed by a catch-all parameter.
    pub fn extra(&self) -> &BTreeMap<String, Value> {
        &self.extra
    }

    /// Iterates over bound `(name, value)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Number of bound parameters, not counting catch-all extras.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.extra.is_empty()
    }

    /// Renders the arguments as a JSON object, extras under `"extra"`.
    pub fn to_json(&self) -> serde_json::Value {
        let mut object = serde_json::Map::new();
        for (name, value) in &self.values {
            object.insert(name.clone(), value_to_json(value));
        }
        if !self.extra.is_empty() {
            let extra = self
                .extra
                .iter()
                .map(|(name, value)| (name.clone(), value_to_json(value)))
                .collect();
            object.insert("extra".into(), serde_json::Value::Object(extra));
        }
        serde_json::Value::Object(object)
    }
}

fn value_to_json(value: &Value) -> serde_json::Value {
    serde_json::to_value(value).unwrap_or(serde_json::Value::Null)
}

/// The result type for handlers.
///
/// Enables use of the `?` operator for error propagation. An `Err` is an
/// invocation failure: the runner reports it with exit code 1 and never
/// retries.
pub type HandlerResult = Result<(), anyhow::Error>;

/// Trait for entry-point handlers.
///
/// Handlers take `&mut self` allowing direct mutation of internal state.
/// This is the common case for CLI applications which are single-threaded.
///
/// # Example
///
/// ```rust
/// use mainsig::{BoundArgs, Handler, HandlerResult};
///
/// struct Counter { count: u32 }
///
/// impl Handler for Counter {
///     fn handle(&mut self, _args: &BoundArgs) -> HandlerResult {
///         self.count += 1;
///         Ok(())
///     }
/// }
/// ```
pub trait Handler {
    /// Execute the handler with the bound arguments.
    fn handle(&mut self, args: &BoundArgs) -> HandlerResult;
}

/// A wrapper that implements Handler for FnMut closures.
///
/// The closure may return any `Result<(), E>` where `E` converts into
/// [`anyhow::Error`].
///
/// # Example
///
/// ```rust
/// use mainsig::{BoundArgs, FnHandler, Handler};
///
/// let mut handler = FnHandler::new(|args: &BoundArgs| {
///     println!("hello {}", args.get_str("name").unwrap_or("world"));
///     Ok::<_, anyhow::Error>(())
/// });
/// assert!(handler.handle(&BoundArgs::new()).is_ok());
/// ```
pub struct FnHandler<F, E = anyhow::Error> {
    f: F,
    _phantom: std::marker::PhantomData<fn() -> E>,
}

impl<F, E> FnHandler<F, E>
where
    F: FnMut(&BoundArgs) -> Result<(), E>,
    E: Into<anyhow::Error>,
{
    /// Creates a new FnHandler wrapping the given FnMut closure.
    pub fn new(f: F) -> Self {
        Self {
            f,
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<F, E> Handler for FnHandler<F, E>
where
    F: FnMut(&BoundArgs) -> Result<(), E>,
    E: Into<anyhow::Error>,
{
    fn handle(&mut self, args: &BoundArgs) -> HandlerResult {
        (self.f)(args).map_err(Into::into)
    }
}

impl<F, E> fmt::Debug for FnHandler<F, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnHandler").finish_non_exhaustive()
    }
}
