//! Argument capture: raw argv into positional and named values.
//!
//! The builder only splits and labels tokens. Type coercion is left to the
//! matcher, so a token that does not fit one candidate can still fit
//! another.
//!
//! # Token Grammar
//!
//! ```text
//! --name=value        named[name] = "value"
//! --name value        named[name] = "value"   (next token consumed)
//! --flag              named[flag] = true       (flag declared Boolean)
//! --no-flag           named[flag] = false
//! --no-flag=value     error
//! -x                  resolved through aliases, then as above
//! --                  every later token is positional
//! -, -5, -.5, other   positional
//! ```

use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::config::{DuplicatePolicy, ParsePolicy};
use crate::signature::CandidateSet;
use crate::value::Value;

/// One parsed invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Capture {
    pub positional: Vec<Value>,
    pub named: BTreeMap<String, Value>,
}

impl Capture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a positional value.
    pub fn with_positional(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Sets a named value.
    pub fn with_named(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.named.insert(name.into(), value.into());
        self
    }

    /// Returns true if no arguments were captured.
    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.named.is_empty()
    }
}

/// Malformed or policy-violating argument token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("named argument after positional start: {token}")]
    NamedAfterPositional { token: String },

    #[error("missing value for --{name}")]
    MissingValue { name: String },

    #[error("unknown option: -{alias}")]
    UnknownAlias { alias: String },

    #[error("duplicate named argument: --{name}")]
    DuplicateNamed { name: String },

    #[error("malformed argument: {token}")]
    EmptyName { token: String },

    #[error("negated flag takes no value: {token}")]
    NegatedFlagValue { token: String },
}

enum Token<'a> {
    Long {
        name: &'a str,
        inline: Option<&'a str>,
    },
    Short {
        alias: &'a str,
        inline: Option<&'a str>,
    },
    Plain,
}

fn classify(token: &str) -> Token<'_> {
    if let Some(rest) = token.strip_prefix("--") {
        let (name, inline) = split_inline(rest);
        return Token::Long { name, inline };
    }
    match token.strip_prefix('-') {
        Some(rest) if !rest.is_empty() && !looks_numeric(rest) => {
            let (alias, inline) = split_inline(rest);
            Token::Short { alias, inline }
        }
        _ => Token::Plain,
    }
}

fn split_inline(rest: &str) -> (&str, Option<&str>) {
    match rest.split_once('=') {
        Some((name, value)) => (name, Some(value)),
        None => (rest, None),
    }
}

fn looks_numeric(rest: &str) -> bool {
    rest.starts_with(|c: char| c.is_ascii_digit() || c == '.')
}

/// Builds a [`Capture`] from `argv` (program name excluded).
///
/// `candidates` decides which bare `--name` tokens are Boolean flags and
/// supplies short aliases declared on parameters.
///
/// # Example
///
/// ```
/// use mainsig::{build_capture, CandidateSet, Capture, ParsePolicy};
///
/// let argv: Vec<String> = ["5", "--c=2", "3"].iter().map(|s| s.to_string()).collect();
/// let candidates = CandidateSet::new();
///
/// assert!(build_capture(&candidates, &argv, &ParsePolicy::new()).is_err());
///
/// let policy = ParsePolicy::new().named_anywhere(true);
/// let capture = build_capture(&candidates, &argv, &policy).unwrap();
/// let expected = Capture::new()
///     .with_positional("5")
///     .with_positional("3")
///     .with_named("c", "2");
/// assert_eq!(capture, expected);
/// ```
pub fn build_capture(
    candidates: &CandidateSet,
    argv: &[String],
    policy: &ParsePolicy,
) -> Result<Capture, ParseError> {
    let mut capture = Capture::default();
    let mut tokens = argv.iter().peekable();
    let mut positional_started = false;
    let mut named_closed = false;

    while let Some(token) = tokens.next() {
        if named_closed {
            capture.positional.push(Value::String(token.clone()));
            continue;
        }
        if token == "--" {
            named_closed = true;
            continue;
        }

        let (name, inline) = match classify(token) {
            Token::Plain => {
                capture.positional.push(Value::String(token.clone()));
                positional_started = true;
                continue;
            }
            _ if positional_started && !policy.named_anywhere => {
                return Err(ParseError::NamedAfterPositional {
                    token: token.clone(),
                });
            }
            Token::Long { name, inline } => (name, inline),
            Token::Short { alias, inline } => (resolve_alias(candidates, policy, alias)?, inline),
        };

        if name.is_empty() {
            return Err(ParseError::EmptyName {
                token: token.clone(),
            });
        }

        let is_flag = |n: &str| n == policy.help_flag || candidates.declares_flag(n);
        let is_negated = |n: &str| !is_flag(n) && n.strip_prefix("no-").is_some_and(is_flag);

        let (key, value) = match inline {
            Some(_) if is_negated(name) => {
                return Err(ParseError::NegatedFlagValue {
                    token: token.clone(),
                });
            }
            Some(value) => (name, Value::String(value.to_string())),
            None if is_flag(name) => (name, Value::Boolean(true)),
            None => match name.strip_prefix("no-") {
                Some(base) if is_flag(base) => (base, Value::Boolean(false)),
                _ => match tokens.next_if(|next| matches!(classify(next.as_str()), Token::Plain)) {
                    Some(next) => (name, Value::String(next.clone())),
                    None => {
                        return Err(ParseError::MissingValue {
                            name: name.to_string(),
                        })
                    }
                },
            },
        };

        insert_named(&mut capture, key, value, policy.duplicates)?;
    }

    Ok(capture)
}

fn resolve_alias<'a>(
    candidates: &'a CandidateSet,
    policy: &'a ParsePolicy,
    alias: &str,
) -> Result<&'a str, ParseError> {
    if let Some(long) = policy.aliases.get(alias) {
        return Ok(long);
    }

    let mut chars = alias.chars();
    let declared = match (chars.next(), chars.next()) {
        (Some(short), None) => candidates.short_alias(short),
        _ => None,
    };
    declared.ok_or_else(|| ParseError::UnknownAlias {
        alias: alias.to_string(),
    })
}

fn insert_named(
    capture: &mut Capture,
    key: &str,
    value: Value,
    duplicates: DuplicatePolicy,
) -> Result<(), ParseError> {
    if duplicates == DuplicatePolicy::Reject && capture.named.contains_key(key) {
        return Err(ParseError::DuplicateNamed {
            name: key.to_string(),
        });
    }
    capture.named.insert(key.to_string(), value);
    Ok(())
}

/// Returns true if `argv` asks for help (`--help`, or a short alias of it)
/// before any `--` terminator.
pub fn help_requested(argv: &[String], policy: &ParsePolicy) -> bool {
    argv.iter()
        .take_while(|token| token.as_str() != "--")
        .any(|token| match classify(token) {
            Token::Long { name, inline: None } => name == policy.help_flag,
            Token::Short {
                alias,
                inline: None,
            } => policy
                .aliases
                .get(alias)
                .is_some_and(|long| *long == policy.help_flag),
            _ => false,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::{ParamSpec, Signature};
    use crate::value::ValueType;

    fn argv(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    fn verbose_candidates() -> CandidateSet {
        vec![Signature::from_fn(|_| Ok(()))
            .param(ParamSpec::positional("file", ValueType::String))
            .param(ParamSpec::flag("verbose").with_short('v'))
            .param(ParamSpec::named("level", ValueType::Integer).with_short('l'))]
        .into()
    }

    fn build(tokens: &[&str]) -> Result<Capture, ParseError> {
        build_capture(&verbose_candidates(), &argv(tokens), &ParsePolicy::new())
    }

    #[test]
    fn test_positionals_in_order() {
        let capture = build(&["a", "b", "c"]).unwrap();
        assert_eq!(
            capture.positional,
            vec![Value::from("a"), Value::from("b"), Value::from("c")]
        );
        assert!(capture.named.is_empty());
    }

    #[test]
    fn test_named_inline_and_separate() {
        let capture = build(&["--level=3", "--name", "Liz"]).unwrap();
        assert_eq!(capture.named.get("level"), Some(&Value::from("3")));
        assert_eq!(capture.named.get("name"), Some(&Value::from("Liz")));
        assert!(capture.positional.is_empty());
    }

    #[test]
    fn test_boolean_flag_and_negation() {
        let capture = build(&["--verbose"]).unwrap();
        assert_eq!(capture.named.get("verbose"), Some(&Value::Boolean(true)));

        let capture = build(&["--no-verbose"]).unwrap();
        assert_eq!(capture.named.get("verbose"), Some(&Value::Boolean(false)));
    }

    #[test]
    fn test_flag_does_not_consume_next_token() {
        let capture = build(&["--verbose", "file.txt"]).unwrap();
        assert_eq!(capture.named.get("verbose"), Some(&Value::Boolean(true)));
        assert_eq!(capture.positional, vec![Value::from("file.txt")]);
    }

    #[test]
    fn test_short_aliases() {
        let capture = build(&["-v", "-l", "2"]).unwrap();
        assert_eq!(capture.named.get("verbose"), Some(&Value::Boolean(true)));
        assert_eq!(capture.named.get("level"), Some(&Value::from("2")));
    }

    #[test]
    fn test_policy_alias_takes_precedence() {
        let policy = ParsePolicy::new().alias("v", "version");
        let capture =
            build_capture(&verbose_candidates(), &argv(&["-v", "1.0"]), &policy).unwrap();
        assert_eq!(capture.named.get("version"), Some(&Value::from("1.0")));
    }

    #[test]
    fn test_unknown_alias() {
        assert_eq!(
            build(&["-x"]),
            Err(ParseError::UnknownAlias { alias: "x".into() })
        );
    }

    #[test]
    fn test_negative_numbers_are_positional() {
        let capture = build(&["-5", "-.25", "-"]).unwrap();
        assert_eq!(
            capture.positional,
            vec![Value::from("-5"), Value::from("-.25"), Value::from("-")]
        );
    }

    #[test]
    fn test_named_value_may_be_negative_number() {
        let capture = build(&["--level", "-3"]).unwrap();
        assert_eq!(capture.named.get("level"), Some(&Value::from("-3")));
    }

    #[test]
    fn test_missing_value() {
        assert_eq!(
            build(&["--level"]),
            Err(ParseError::MissingValue {
                name: "level".into()
            })
        );
        assert_eq!(
            build(&["--level", "--verbose"]),
            Err(ParseError::MissingValue {
                name: "level".into()
            })
        );
    }

    #[test]
    fn test_named_after_positional_rejected_by_default() {
        assert_eq!(
            build(&["5", "--c=2", "3"]),
            Err(ParseError::NamedAfterPositional {
                token: "--c=2".into()
            })
        );
    }

    #[test]
    fn test_short_alias_after_positional_is_rejected_before_lookup() {
        assert_eq!(
            build(&["5", "-x"]),
            Err(ParseError::NamedAfterPositional { token: "-x".into() })
        );
    }

    #[test]
    fn test_negated_flag_with_inline_value() {
        assert_eq!(
            build(&["--no-verbose=true"]),
            Err(ParseError::NegatedFlagValue {
                token: "--no-verbose=true".into()
            })
        );
    }

    #[test]
    fn test_named_anywhere_strips_named() {
        let policy = ParsePolicy::new().named_anywhere(true);
        let capture =
            build_capture(&CandidateSet::new(), &argv(&["5", "--c=2", "3"]), &policy).unwrap();
        assert_eq!(capture.positional, vec![Value::from("5"), Value::from("3")]);
        assert_eq!(capture.named.get("c"), Some(&Value::from("2")));
    }

    #[test]
    fn test_double_dash_ends_named() {
        let capture = build(&["--", "--verbose", "-v"]).unwrap();
        assert!(capture.named.is_empty());
        assert_eq!(
            capture.positional,
            vec![Value::from("--verbose"), Value::from("-v")]
        );
    }

    #[test]
    fn test_duplicates_last_wins() {
        let capture = build(&["--level=1", "--level=2"]).unwrap();
        assert_eq!(capture.named.get("level"), Some(&Value::from("2")));
    }

    #[test]
    fn test_duplicates_rejected() {
        let policy = ParsePolicy::new().duplicates(DuplicatePolicy::Reject);
        let result = build_capture(
            &verbose_candidates(),
            &argv(&["--level=1", "--level=2"]),
            &policy,
        );
        assert_eq!(
            result,
            Err(ParseError::DuplicateNamed {
                name: "level".into()
            })
        );
    }

    #[test]
    fn test_empty_name() {
        assert_eq!(
            build(&["--=x"]),
            Err(ParseError::EmptyName {
                token: "--=x".into()
            })
        );
    }

    #[test]
    fn test_help_is_always_a_flag() {
        let capture = build_capture(
            &CandidateSet::new(),
            &argv(&["--help"]),
            &ParsePolicy::new(),
        )
        .unwrap();
        assert_eq!(capture.named.get("help"), Some(&Value::Boolean(true)));
    }

    #[test]
    fn test_help_requested() {
        let policy = ParsePolicy::new();
        assert!(help_requested(&argv(&["x", "--help"]), &policy));
        assert!(help_requested(&argv(&["-h"]), &policy));
        assert!(!help_requested(&argv(&["--", "--help"]), &policy));
        assert!(!help_requested(&argv(&["--helpful"]), &policy));
    }
}
