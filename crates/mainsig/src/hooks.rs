//! Hooks replacing the default capture and usage steps.
//!
//! Hooks let an embedding program take over two points of the pipeline
//! without touching the rest of it:
//!
//! ```text
//! argv
//!   → CAPTURE HOOK ← (special-case tokens, read the environment, delegate)
//!   → matcher
//!   → handler                      on a match
//!   → USAGE HOOK   ← (custom help, near-miss hints, delegate)   on failure
//! ```
//!
//! Each hook receives a bound reference to the default implementation
//! ([`DefaultCapture`], [`DefaultUsage`]) so it can delegate whatever it
//! does not want to handle itself.
//!
//! # Failure
//!
//! A capture hook returning [`HookError::Parse`] is treated exactly like a
//! parse failure of the default builder: usage text and exit code 2. Any
//! other [`HookError`] is not handled by the runner and is returned to its
//! caller unchanged.

use std::fmt;
use std::rc::Rc;
use thiserror::Error;

use crate::capture::{build_capture, Capture, ParseError};
use crate::config::{ParsePolicy, UsageFormat};
use crate::handler::BoundArgs;
use crate::matcher::DispatchFailure;
use crate::signature::{CandidateSet, Signature};
use crate::usage::{describe_failure, synthesize, UsageError};

/// The hook in which an error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookPhase {
    Capture,
    Usage,
}

impl fmt::Display for HookPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookPhase::Capture => write!(f, "capture"),
            HookPhase::Usage => write!(f, "usage"),
        }
    }
}

/// Error returned by a hook.
#[derive(Debug, Error)]
pub enum HookError {
    /// Argument parsing failed; routed to usage like any parse error.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The hook itself failed; propagated to the runner's caller.
    #[error("hook error ({phase}): {message}")]
    Failed {
        message: String,
        phase: HookPhase,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },
}

impl HookError {
    /// Creates a failure for the capture hook.
    pub fn capture(message: impl Into<String>) -> Self {
        HookError::Failed {
            message: message.into(),
            phase: HookPhase::Capture,
            source: None,
        }
    }

    /// Creates a failure for the usage hook.
    pub fn usage(message: impl Into<String>) -> Self {
        HookError::Failed {
            message: message.into(),
            phase: HookPhase::Usage,
            source: None,
        }
    }

    /// Sets the source error. Has no effect on [`HookError::Parse`].
    pub fn with_source<E>(self, err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    {
        match self {
            HookError::Failed { message, phase, .. } => HookError::Failed {
                message,
                phase,
                source: Some(err.into()),
            },
            parse => parse,
        }
    }

    /// The phase of a hook failure, `None` for parse errors.
    pub fn phase(&self) -> Option<HookPhase> {
        match self {
            HookError::Parse(_) => None,
            HookError::Failed { phase, .. } => Some(*phase),
        }
    }
}

impl From<UsageError> for HookError {
    fn from(err: UsageError) -> Self {
        HookError::usage(err.to_string()).with_source(err)
    }
}

/// The default capture builder, bound to the active policy.
#[derive(Debug, Clone, Copy)]
pub struct DefaultCapture<'a> {
    policy: &'a ParsePolicy,
}

impl<'a> DefaultCapture<'a> {
    pub fn new(policy: &'a ParsePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &'a ParsePolicy {
        self.policy
    }

    /// Runs [`build_capture`] with the bound policy.
    pub fn build(&self, candidates: &CandidateSet, argv: &[String]) -> Result<Capture, ParseError> {
        build_capture(candidates, argv, self.policy)
    }
}

/// What a usage hook knows about the failed dispatch.
#[derive(Debug, Clone, Copy)]
pub struct UsageContext<'a> {
    pub failure: &'a DispatchFailure,
    pub candidates: &'a CandidateSet,
    /// The help flag appeared in argv.
    pub help_requested: bool,
}

impl<'a> UsageContext<'a> {
    /// The near-miss signature, or `None` for parse failures.
    pub fn failed_signature(&self) -> Option<&'a Signature> {
        self.failure
            .closest()
            .and_then(|miss| self.candidates.get(miss.index))
    }

    /// Arguments bound to the near-miss signature before it failed.
    pub fn attempted(&self) -> Option<&'a BoundArgs> {
        self.failure.closest().map(|miss| &miss.attempted)
    }
}

/// The default usage generator, bound to program name and format.
#[derive(Debug, Clone, Copy)]
pub struct DefaultUsage<'a> {
    program: &'a str,
    candidates: &'a CandidateSet,
    format: &'a UsageFormat,
}

impl<'a> DefaultUsage<'a> {
    pub fn new(program: &'a str, candidates: &'a CandidateSet, format: &'a UsageFormat) -> Self {
        Self {
            program,
            candidates,
            format,
        }
    }

    /// Usage lines only, as [`synthesize`] renders them.
    pub fn synthesize(&self) -> Result<String, UsageError> {
        synthesize(self.program, self.candidates, self.format)
    }

    /// The default text for a failed dispatch: an `error:` line followed
    /// by usage, or usage alone when help was requested.
    pub fn generate(&self, ctx: &UsageContext<'_>) -> Result<String, UsageError> {
        let usage = self.synthesize()?;
        if ctx.help_requested {
            Ok(usage)
        } else {
            Ok(format!("{}\n{}", describe_failure(ctx.failure), usage))
        }
    }
}

/// Capture hook signature.
pub type CaptureFn =
    Rc<dyn Fn(&CandidateSet, &[String], &DefaultCapture<'_>) -> Result<Capture, HookError>>;

/// Usage hook signature.
pub type UsageFn = Rc<dyn Fn(&UsageContext<'_>, &DefaultUsage<'_>) -> Result<String, HookError>>;

/// The hooks installed on a runner. Unset hooks fall back to the defaults.
#[derive(Clone, Default)]
pub struct Hooks {
    capture: Option<CaptureFn>,
    usage: Option<UsageFn>,
}

impl Hooks {
    /// Creates a new empty hooks configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if no hooks are registered.
    pub fn is_empty(&self) -> bool {
        self.capture.is_none() && self.usage.is_none()
    }

    /// Replaces capture building.
    ///
    /// # Example
    ///
    /// ```rust
    /// use mainsig::{Hooks, Value};
    ///
    /// // Treat `@file` tokens as `--input=file`, leave the rest to the default.
    /// let hooks = Hooks::new().capture(|candidates, argv, default| {
    ///     let (files, rest): (Vec<String>, Vec<String>) =
    ///         argv.iter().cloned().partition(|arg| arg.starts_with('@'));
    ///     let mut capture = default.build(candidates, &rest)?;
    ///     if let Some(file) = files.first() {
    ///         capture.named.insert("input".into(), Value::from(&file[1..]));
    ///     }
    ///     Ok(capture)
    /// });
    /// assert!(!hooks.is_empty());
    /// ```
    pub fn capture<F>(mut self, f: F) -> Self
    where
        F: Fn(&CandidateSet, &[String], &DefaultCapture<'_>) -> Result<Capture, HookError>
            + 'static,
    {
        self.capture = Some(Rc::new(f));
        self
    }

    /// Replaces usage generation.
    pub fn usage<F>(mut self, f: F) -> Self
    where
        F: Fn(&UsageContext<'_>, &DefaultUsage<'_>) -> Result<String, HookError> + 'static,
    {
        self.usage = Some(Rc::new(f));
        self
    }

    /// Runs the capture hook, or the default builder when none is set.
    pub fn run_capture(
        &self,
        candidates: &CandidateSet,
        argv: &[String],
        default: &DefaultCapture<'_>,
    ) -> Result<Capture, HookError> {
        match &self.capture {
            Some(hook) => hook(candidates, argv, default),
            None => Ok(default.build(candidates, argv)?),
        }
    }

    /// Runs the usage hook, or the default generator when none is set.
    pub fn run_usage(
        &self,
        ctx: &UsageContext<'_>,
        default: &DefaultUsage<'_>,
    ) -> Result<String, HookError> {
        match &self.usage {
            Some(hook) => hook(ctx, default),
            None => Ok(default.generate(ctx)?),
        }
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("capture", &self.capture.is_some())
            .field("usage", &self.usage.is_some())
            .finish()
    }
}
