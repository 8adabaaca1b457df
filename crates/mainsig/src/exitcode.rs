//! Process exit codes produced by the runner.

/// A handler ran to completion.
pub const OK: i32 = 0;

/// The selected handler returned an error.
pub const INVOCATION_FAILURE: i32 = 1;

/// No signature matched, or the arguments could not be parsed.
pub const USAGE: i32 = 2;
