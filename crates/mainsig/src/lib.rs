//! Signature-driven argument dispatch.
//!
//! `mainsig` turns a program's entry points into its command-line
//! interface. Each entry point is a [`Signature`]: an ordered list of typed
//! parameters plus a handler. Given argv, the runner picks the first
//! declared signature the arguments fit, binds typed values, and invokes
//! it. When nothing fits, it prints usage text synthesized from the
//! declared signatures.
//!
//! # Features
//!
//! - **Overloads**: several signatures per program, resolved in declaration order
//! - **Typed binding**: String, Integer, Float, Boolean, List and Choice values
//!   with defaults and predicates
//! - **Usage synthesis**: one usage line per visible signature, with
//!   optional parameter descriptions
//! - **Hooks**: replace capture or usage while delegating to the defaults
//! - **Config**: parse policy and usage format from YAML or JSON
//!
//! # Pipeline
//!
//! ```text
//! argv → capture (hook) → matcher → handler          exit 0 / 1
//!                       ↘ usage (hook) → stderr/stdout  exit 2
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use mainsig::{ParamSpec, Runner, Signature, ValueType};
//!
//! let runner = Runner::builder("greet")
//!     .signature(Signature::from_fn(|_| {
//!         println!("hello world");
//!         Ok(())
//!     }))
//!     .signature(
//!         Signature::from_fn(|args| {
//!             let name = args.get_str("name").unwrap_or_default();
//!             let times = args.get_int("times").unwrap_or(1);
//!             for _ in 0..times {
//!                 println!("hello {name}");
//!             }
//!             Ok(())
//!         })
//!         .param(ParamSpec::positional("name", ValueType::String))
//!         .param(ParamSpec::named("times", ValueType::Integer).with_default(1i64)),
//!     )
//!     .build();
//!
//! let code = runner
//!     .execute(["--times=2", "Liz"], &mut std::io::stdout(), &mut std::io::stderr())
//!     .unwrap();
//! assert_eq!(code, 0);
//! ```
//!
//! # Exit Codes
//!
//! See [`exitcode`]: `0` when the handler succeeds, `1` when it returns an
//! error, `2` when no signature matched or argv could not be parsed.

mod capture;
mod config;
pub mod exitcode;
mod handler;
mod hooks;
mod matcher;
mod output;
mod runner;
mod signature;
mod usage;
mod value;

pub use value::{Value, ValueType};

pub use handler::{BoundArgs, FnHandler, Handler, HandlerResult};

pub use signature::{CandidateSet, ParamKind, ParamSpec, Predicate, Signature};

pub use config::{
    ConfigError, DescriptionLayout, DispatchConfig, DuplicatePolicy, ParsePolicy, UsageFormat,
};

pub use capture::{build_capture, help_requested, Capture, ParseError};

pub use matcher::{
    bind, match_candidates, CandidateMiss, DispatchFailure, DispatchOutcome, Mismatch,
};

pub use usage::{describe_failure, param_token, synthesize, usage_line, UsageError};

pub use hooks::{
    CaptureFn, DefaultCapture, DefaultUsage, HookError, HookPhase, Hooks, UsageContext, UsageFn,
};

pub use output::UsageStream;

pub use runner::{RunError, RunResult, Runner, RunnerBuilder};
