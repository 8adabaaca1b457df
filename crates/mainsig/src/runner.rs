//! The dispatch pipeline.
//!
//! A [`Runner`] owns the candidates, the configuration and the hooks for one
//! program, and runs a single linear pass per call:
//!
//! ```text
//! Start ──capture──▶ CaptureBuilt ──match──▶ Dispatched ──▶ Done (exit 0 / 1)
//!   │                     │
//!   └── parse error ──────┴── no match ──▶ DispatchFailed ──usage──▶ Done (exit 2)
//! ```
//!
//! [`Runner::run`] performs the pass and returns a [`RunResult`] without
//! printing anything. [`Runner::execute`] additionally writes usage text to
//! the right stream and returns the exit code.
//!
//! # Example
//!
//! ```rust
//! use mainsig::{exitcode, ParamSpec, Runner, Signature, ValueType};
//!
//! let runner = Runner::builder("greet")
//!     .signature(Signature::from_fn(|_| Ok(())))
//!     .signature(
//!         Signature::from_fn(|args| {
//!             assert_eq!(args.get_str("name"), Some("Liz"));
//!             Ok(())
//!         })
//!         .param(ParamSpec::positional("name", ValueType::String)),
//!     )
//!     .build();
//!
//! let result = runner.run(["Liz"]).unwrap();
//! assert_eq!(result.matched_index(), Some(1));
//! assert_eq!(result.exit_code(), exitcode::OK);
//!
//! let result = runner.run(["a", "b"]).unwrap();
//! assert_eq!(result.exit_code(), exitcode::USAGE);
//! ```

use std::io::Write;
use thiserror::Error;
use tracing::{debug, warn};

use crate::capture::{help_requested, Capture};
use crate::config::{DispatchConfig, ParsePolicy, UsageFormat};
use crate::exitcode;
use crate::hooks::{DefaultCapture, DefaultUsage, HookError, Hooks, UsageContext};
use crate::matcher::{match_candidates, DispatchFailure, DispatchOutcome};
use crate::output::UsageStream;
use crate::signature::{CandidateSet, Signature};
use crate::usage::{synthesize, UsageError};

/// Outcome of one pass through the pipeline.
#[derive(Debug)]
pub enum RunResult {
    /// The selected handler returned `Ok`.
    Completed { index: usize },
    /// The selected handler returned an error.
    InvocationFailed { index: usize, error: anyhow::Error },
    /// Nothing was invoked; `text` is the usage to show.
    Usage {
        text: String,
        stream: UsageStream,
        failure: DispatchFailure,
    },
}

impl RunResult {
    /// The process exit code for this outcome.
    pub fn exit_code(&self) -> i32 {
        match self {
            RunResult::Completed { .. } => exitcode::OK,
            RunResult::InvocationFailed { .. } => exitcode::INVOCATION_FAILURE,
            RunResult::Usage { .. } => exitcode::USAGE,
        }
    }

    /// Returns true if a handler ran successfully.
    pub fn is_completed(&self) -> bool {
        matches!(self, RunResult::Completed { .. })
    }

    /// Index of the invoked candidate, whether or not it succeeded.
    pub fn matched_index(&self) -> Option<usize> {
        match self {
            RunResult::Completed { index } | RunResult::InvocationFailed { index, .. } => {
                Some(*index)
            }
            RunResult::Usage { .. } => None,
        }
    }

    /// The usage text, if dispatch failed.
    pub fn usage_text(&self) -> Option<&str> {
        match self {
            RunResult::Usage { text, .. } => Some(text),
            _ => None,
        }
    }

    /// The handler's error, if the invocation failed.
    pub fn error(&self) -> Option<&anyhow::Error> {
        match self {
            RunResult::InvocationFailed { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// Errors from [`Runner::execute`].
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Hook(#[from] HookError),

    #[error("failed to write usage: {0}")]
    Io(#[from] std::io::Error),
}

/// Orchestrates capture, matching, invocation and usage for one program.
#[derive(Debug, Clone)]
pub struct Runner {
    program: String,
    candidates: CandidateSet,
    config: DispatchConfig,
    hooks: Hooks,
}

impl Runner {
    /// Starts building a runner for `program` (the name shown in usage).
    pub fn builder(program: impl Into<String>) -> RunnerBuilder {
        RunnerBuilder::new(program)
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn candidates(&self) -> &CandidateSet {
        &self.candidates
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Usage text for every visible candidate.
    pub fn usage(&self) -> Result<String, UsageError> {
        synthesize(&self.program, &self.candidates, &self.config.usage)
    }

    /// Builds the capture through the capture hook or the default builder.
    pub fn capture(&self, argv: &[String]) -> Result<Capture, HookError> {
        let default = DefaultCapture::new(&self.config.parse);
        self.hooks.run_capture(&self.candidates, argv, &default)
    }

    /// Runs one pass over `argv` (program name excluded).
    ///
    /// Hook failures other than parse errors are returned as `Err`.
    pub fn run<I, S>(&self, argv: I) -> Result<RunResult, HookError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let argv: Vec<String> = argv.into_iter().map(Into::into).collect();
        debug!(program = %self.program, argc = argv.len(), "building capture");

        let failure = match self.capture(&argv) {
            Ok(capture) => {
                debug!(
                    positional = capture.positional.len(),
                    named = capture.named.len(),
                    "capture built"
                );
                match match_candidates(&capture, &self.candidates) {
                    DispatchOutcome::Matched {
                        index,
                        signature,
                        bound,
                    } => return Ok(invoke(index, &signature, &bound)),
                    DispatchOutcome::NoMatch { misses } => DispatchFailure::NoMatch { misses },
                }
            }
            Err(HookError::Parse(err)) => DispatchFailure::Parse(err),
            Err(err) => return Err(err),
        };

        debug!(error = %failure, "dispatch failed");
        let help = help_requested(&argv, &self.config.parse);
        let ctx = UsageContext {
            failure: &failure,
            candidates: &self.candidates,
            help_requested: help,
        };
        let default = DefaultUsage::new(&self.program, &self.candidates, &self.config.usage);
        let text = self.hooks.run_usage(&ctx, &default)?;

        Ok(RunResult::Usage {
            text,
            stream: UsageStream::for_request(help),
            failure,
        })
    }

    /// Runs one pass and writes usage text, if any, to `stdout` or
    /// `stderr`. Returns the exit code.
    pub fn execute<I, S, O, E>(
        &self,
        argv: I,
        stdout: &mut O,
        stderr: &mut E,
    ) -> Result<i32, RunError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        O: Write + ?Sized,
        E: Write + ?Sized,
    {
        let result = self.run(argv)?;
        if let RunResult::Usage { text, stream, .. } = &result {
            stream.write_text(text, stdout, stderr)?;
        }
        Ok(result.exit_code())
    }
}

fn invoke(index: usize, signature: &Signature, bound: &crate::handler::BoundArgs) -> RunResult {
    debug!(index, label = signature.label(), args = %bound.to_json(), "invoking candidate");
    match signature.invoke(bound) {
        Ok(()) => RunResult::Completed { index },
        Err(error) => {
            warn!(index, label = signature.label(), error = %error, "handler failed");
            RunResult::InvocationFailed { index, error }
        }
    }
}

/// Builder for [`Runner`].
#[derive(Debug, Clone)]
pub struct RunnerBuilder {
    program: String,
    candidates: CandidateSet,
    config: DispatchConfig,
    hooks: Hooks,
}

impl RunnerBuilder {
    fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            candidates: CandidateSet::new(),
            config: DispatchConfig::default(),
            hooks: Hooks::new(),
        }
    }

    /// Registers a candidate after all previously registered ones.
    pub fn signature(mut self, signature: Signature) -> Self {
        self.candidates.push(signature);
        self
    }

    /// Registers every candidate of `candidates`, in order.
    pub fn candidates(mut self, candidates: impl IntoIterator<Item = Signature>) -> Self {
        for signature in candidates {
            self.candidates.push(signature);
        }
        self
    }

    pub fn config(mut self, config: DispatchConfig) -> Self {
        self.config = config;
        self
    }

    pub fn policy(mut self, policy: ParsePolicy) -> Self {
        self.config.parse = policy;
        self
    }

    pub fn usage_format(mut self, format: UsageFormat) -> Self {
        self.config.usage = format;
        self
    }

    pub fn hooks(mut self, hooks: Hooks) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn build(self) -> Runner {
        Runner {
            program: self.program,
            candidates: self.candidates,
            config: self.config,
            hooks: self.hooks,
        }
    }
}
