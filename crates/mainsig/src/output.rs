//! Destination of usage text.
//!
//! Usage produced by a failed dispatch goes to stderr; usage the user
//! explicitly asked for with the help flag goes to stdout.

use std::io::Write;

/// Stream that receives usage text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UsageStream {
    /// Requested help.
    Stdout,
    /// Dispatch or parse failure.
    #[default]
    Stderr,
}

impl UsageStream {
    /// Picks the stream for a failed dispatch.
    pub fn for_request(help_requested: bool) -> Self {
        if help_requested {
            UsageStream::Stdout
        } else {
            UsageStream::Stderr
        }
    }

    /// Writes `content` plus a trailing newline to the selected writer.
    pub fn write_text<O, E>(
        &self,
        content: &str,
        stdout: &mut O,
        stderr: &mut E,
    ) -> std::io::Result<()>
    where
        O: Write + ?Sized,
        E: Write + ?Sized,
    {
        match self {
            UsageStream::Stdout => {
                writeln!(stdout, "{}", content)?;
                stdout.flush()
            }
            UsageStream::Stderr => {
                writeln!(stderr, "{}", content)?;
                stderr.flush()
            }
        }
    }
}
