//! Parameter and signature declarations.
//!
//! A [`Signature`] is one overload candidate: an ordered list of
//! [`ParamSpec`]s plus the [`Handler`] to invoke when it is selected. A
//! [`CandidateSet`] keeps signatures in registration order, which is the
//! order used both for tie-breaking and for usage listings.
//!
//! Parameter constraints are plain data; nothing here inspects Rust types.
//!
//! # Example
//!
//! ```
//! use mainsig::{CandidateSet, ParamSpec, Signature, ValueType};
//!
//! let candidates: CandidateSet = vec![
//!     Signature::from_fn(|_| Ok(())),
//!     Signature::from_fn(|_| Ok(()))
//!         .param(ParamSpec::positional("name", ValueType::String))
//!         .param(ParamSpec::flag("verbose").with_short('v')),
//! ]
//! .into();
//!
//! assert_eq!(candidates.len(), 2);
//! assert!(candidates.declares_flag("verbose"));
//! assert_eq!(candidates.short_alias('v'), Some("verbose"));
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::handler::{BoundArgs, FnHandler, Handler, HandlerResult};
use crate::value::{Value, ValueType};

/// How a parameter receives its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Bound from the next positional value.
    Positional,
    /// Trailing positional that absorbs every remaining positional value
    /// into a [`Value::List`].
    Variadic,
    /// Bound from `--name` by name.
    Named,
    /// Absorbs every named key no other parameter declares.
    CatchAll,
}

impl ParamKind {
    /// Returns true for kinds fed from the positional sequence.
    pub fn is_positional(self) -> bool {
        matches!(self, ParamKind::Positional | ParamKind::Variadic)
    }
}

/// A named `where`-clause over a coerced value.
#[derive(Clone)]
pub struct Predicate {
    name: String,
    check: Rc<dyn Fn(&Value) -> bool>,
}

impl Predicate {
    /// Creates a predicate. `name` is shown in mismatch messages.
    pub fn new<F>(name: impl Into<String>, check: F) -> Self
    where
        F: Fn(&Value) -> bool + 'static,
    {
        Self {
            name: name.into(),
            check: Rc::new(check),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Evaluates the predicate.
    pub fn test(&self, value: &Value) -> bool {
        (self.check)(value)
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Predicate")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Declaration of one parameter.
///
/// A required parameter never carries a default: [`required`](Self::required)
/// clears the default and [`with_default`](Self::with_default) clears the
/// required mark.
#[derive(Debug, Clone)]
pub struct ParamSpec {
    name: String,
    kind: ParamKind,
    value_type: ValueType,
    required: bool,
    default: Option<Value>,
    description: Option<String>,
    short: Option<char>,
    predicate: Option<Predicate>,
}

impl ParamSpec {
    fn new(
        name: impl Into<String>,
        kind: ParamKind,
        value_type: ValueType,
        required: bool,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            value_type,
            required,
            default: None,
            description: None,
            short: None,
            predicate: None,
        }
    }

    /// A required positional parameter.
    pub fn positional(name: impl Into<String>, value_type: ValueType) -> Self {
        Self::new(name, ParamKind::Positional, value_type, true)
    }

    /// A trailing positional collecting all remaining positionals.
    ///
    /// `value_type` constrains each item. Optional by default, in which
    /// case an empty list is bound when nothing remains.
    pub fn variadic(name: impl Into<String>, value_type: ValueType) -> Self {
        Self::new(name, ParamKind::Variadic, value_type, false)
    }

    /// An optional named parameter (`--name=value`).
    pub fn named(name: impl Into<String>, value_type: ValueType) -> Self {
        Self::new(name, ParamKind::Named, value_type, false)
    }

    /// A Boolean named parameter defaulting to `false`.
    pub fn flag(name: impl Into<String>) -> Self {
        Self::named(name, ValueType::Boolean).with_default(false)
    }

    /// A sink for named keys no other parameter declares.
    pub fn catch_all(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::CatchAll, ValueType::Any, false)
    }

    /// Marks the parameter as required, dropping any default.
    ///
    /// A required flag is only satisfied by `true`; `--no-flag` leaves it
    /// missing.
    pub fn required(mut self) -> Self {
        self.required = true;
        self.default = None;
        self
    }

    /// Marks the parameter as optional without a default.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Sets the default value, which also makes the parameter optional.
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self.required = false;
        self
    }

    /// Adds a description shown under the usage line.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Declares a single-character alias (`-v` for `--verbose`).
    pub fn with_short(mut self, short: char) -> Self {
        self.short = Some(short);
        self
    }

    /// Attaches a `where`-clause checked after coercion.
    ///
    /// For variadic parameters the predicate sees the whole list.
    pub fn satisfying<F>(mut self, name: impl Into<String>, check: F) -> Self
    where
        F: Fn(&Value) -> bool + 'static,
    {
        self.predicate = Some(Predicate::new(name, check));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ParamKind {
        self.kind
    }

    pub fn value_type(&self) -> &ValueType {
        &self.value_type
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn short(&self) -> Option<char> {
        self.short
    }

    pub fn predicate(&self) -> Option<&Predicate> {
        self.predicate.as_ref()
    }

    /// Returns true for Boolean named parameters, which take no value token.
    pub fn is_flag(&self) -> bool {
        self.kind == ParamKind::Named && self.value_type.is_boolean()
    }

    /// How the parameter is referred to in messages: `<name>` or `--name`.
    pub fn display_name(&self) -> String {
        match self.kind {
            ParamKind::Positional | ParamKind::Variadic => format!("<{}>", self.name),
            ParamKind::Named => format!("--{}", self.name),
            ParamKind::CatchAll => format!("--<{}>", self.name),
        }
    }
}

/// One overload candidate.
///
/// Cloning is cheap: the handler is shared.
#[derive(Clone)]
pub struct Signature {
    label: Option<String>,
    params: Vec<ParamSpec>,
    hidden: bool,
    handler: Rc<RefCell<dyn Handler>>,
}

impl Signature {
    /// Creates a signature with no parameters invoking `handler`.
    pub fn new<H: Handler + 'static>(handler: H) -> Self {
        Self {
            label: None,
            params: Vec::new(),
            hidden: false,
            handler: Rc::new(RefCell::new(handler)),
        }
    }

    /// Creates a signature from a closure.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: FnMut(&BoundArgs) -> HandlerResult + 'static,
    {
        Self::new(FnHandler::new(f))
    }

    /// Appends a parameter.
    pub fn param(mut self, spec: ParamSpec) -> Self {
        self.params.push(spec);
        self
    }

    /// Excludes the signature from usage text. It can still be matched.
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Names the signature in log output.
    pub fn labeled(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Invokes the handler with the bound arguments.
    ///
    /// A handler that re-enters its own signature gets an error instead of
    /// a second mutable borrow.
    pub fn invoke(&self, args: &BoundArgs) -> HandlerResult {
        let mut handler = self
            .handler
            .try_borrow_mut()
            .map_err(|_| anyhow::anyhow!("handler is already running"))?;
        handler.handle(args)
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signature")
            .field("label", &self.label)
            .field("params", &self.params)
            .field("hidden", &self.hidden)
            .finish_non_exhaustive()
    }
}

/// Ordered overload candidates for one dispatch.
#[derive(Debug, Clone, Default)]
pub struct CandidateSet {
    signatures: Vec<Signature>,
}

impl CandidateSet {
    /// Creates an empty candidate set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a candidate after all existing ones.
    pub fn push(&mut self, signature: Signature) {
        self.signatures.push(signature);
    }

    pub fn get(&self, index: usize) -> Option<&Signature> {
        self.signatures.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Signature> {
        self.signatures.iter()
    }

    /// Candidates that appear in usage text, in declaration order.
    pub fn visible(&self) -> impl Iterator<Item = &Signature> {
        self.signatures.iter().filter(|sig| !sig.is_hidden())
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }

    /// Returns true if any candidate declares `name` as a Boolean named
    /// parameter, so a bare `--name` takes no value token.
    pub fn declares_flag(&self, name: &str) -> bool {
        self.named_params().any(|p| p.is_flag() && p.name() == name)
    }

    /// Resolves a short alias declared on a named parameter.
    pub fn short_alias(&self, short: char) -> Option<&str> {
        self.named_params()
            .find(|p| p.short() == Some(short))
            .map(ParamSpec::name)
    }

    fn named_params(&self) -> impl Iterator<Item = &ParamSpec> {
        self.signatures
            .iter()
            .flat_map(|sig| sig.params().iter())
            .filter(|p| p.kind() == ParamKind::Named)
    }
}

impl From<Vec<Signature>> for CandidateSet {
    fn from(signatures: Vec<Signature>) -> Self {
        Self { signatures }
    }
}

impl FromIterator<Signature> for CandidateSet {
    fn from_iter<I: IntoIterator<Item = Signature>>(iter: I) -> Self {
        Self {
            signatures: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a CandidateSet {
    type Item = &'a Signature;
    type IntoIter = std::slice::Iter<'a, Signature>;

    fn into_iter(self) -> Self::IntoIter {
        self.signatures.iter()
    }
}
