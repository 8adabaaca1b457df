//! Usage text synthesized from declared signatures.
//!
//! Every non-hidden signature becomes one line, in declaration order:
//!
//! ```text
//! usage: prog <name> [<greeting>] <files>... --count=<Integer> --verbose
//! ```
//!
//! | Parameter | Rendering |
//! |-----------|-----------|
//! | required positional | `<name>` |
//! | positional with a default, or optional | `[<name>]` |
//! | variadic | `<name>...` when required, else `[<name>...]` |
//! | named | `--name=<Type>` |
//! | Boolean named | `--name` |
//! | catch-all | `[--<key>=<value>...]` |
//!
//! Parameter descriptions are placed according to
//! [`DescriptionLayout`]: below each usage line (`PerCandidate`), or in a
//! single `parameters:` block after all lines (`Global`).
//!
//! Lines and tokens are computed here; the final layout is a minijinja
//! template (`usage.txt`), which [`UsageFormat::template`] can replace. The
//! template sees:
//!
//! - `prefix`, `program` and `indent` (the indentation as a string)
//! - `blocks`: one per visible signature, with `usage` (the full line),
//!   `tokens`, `label` and `params` (described parameters under
//!   `PerCandidate`)
//! - `parameters`: described parameters under `Global`
//!
//! Each described parameter has `name`, `description` and `padding`, the
//! spaces aligning its description with the others in the same list.
//!
//! Nothing in this module prints; callers decide where the text goes.

use minijinja::Environment;
use serde::Serialize;
use std::collections::HashSet;
use thiserror::Error;

use crate::config::{DescriptionLayout, UsageFormat};
use crate::matcher::DispatchFailure;
use crate::signature::{CandidateSet, ParamKind, ParamSpec, Signature};

/// Failure to render usage text.
#[derive(Debug, Error)]
pub enum UsageError {
    #[error("invalid usage template: {0}")]
    Template(#[from] minijinja::Error),
}

#[derive(Serialize)]
struct UsageData {
    prefix: String,
    program: String,
    indent: String,
    blocks: Vec<UsageBlock>,
    parameters: Vec<ParamEntry>,
}

#[derive(Serialize)]
struct UsageBlock {
    usage: String,
    tokens: Vec<String>,
    label: Option<String>,
    params: Vec<ParamEntry>,
}

#[derive(Serialize)]
struct ParamEntry {
    name: String,
    description: String,
    padding: String,
}

/// Renders usage text for every non-hidden candidate.
///
/// With no visible candidates the result is the bare `usage: <program>`.
///
/// # Example
///
/// ```
/// use mainsig::{synthesize, CandidateSet, ParamSpec, Signature, UsageFormat, ValueType};
///
/// let candidates: CandidateSet = vec![
///     Signature::from_fn(|_| Ok(())),
///     Signature::from_fn(|_| Ok(())).param(ParamSpec::positional("name", ValueType::String)),
/// ]
/// .into();
///
/// assert_eq!(
///     synthesize("prog", &candidates, &UsageFormat::default()).unwrap(),
///     "usage: prog\nusage: prog <name>"
/// );
/// ```
pub fn synthesize(
    program: &str,
    candidates: &CandidateSet,
    format: &UsageFormat,
) -> Result<String, UsageError> {
    let visible: Vec<&Signature> = candidates.visible().collect();

    let mut blocks: Vec<UsageBlock> = visible
        .iter()
        .map(|signature| UsageBlock {
            usage: usage_line(program, signature, format),
            tokens: signature.params().iter().map(param_token).collect(),
            label: signature.label().map(str::to_string),
            params: match format.descriptions {
                DescriptionLayout::PerCandidate => described(signature.params().iter()),
                DescriptionLayout::Global => Vec::new(),
            },
        })
        .collect();
    if blocks.is_empty() {
        blocks.push(UsageBlock {
            usage: format!("{} {}", format.prefix, program),
            tokens: Vec::new(),
            label: None,
            params: Vec::new(),
        });
    }

    let parameters = match format.descriptions {
        DescriptionLayout::PerCandidate => Vec::new(),
        DescriptionLayout::Global => {
            let mut seen = HashSet::new();
            described(
                visible
                    .iter()
                    .flat_map(|sig| sig.params().iter())
                    .filter(|p| p.description().is_none() || seen.insert(p.display_name())),
            )
        }
    };

    let data = UsageData {
        prefix: format.prefix.clone(),
        program: program.to_string(),
        indent: " ".repeat(format.indent),
        blocks,
        parameters,
    };
    render(&data, format)
}

fn render(data: &UsageData, format: &UsageFormat) -> Result<String, UsageError> {
    let source = format
        .template
        .as_deref()
        .unwrap_or(include_str!("usage.txt"));

    let mut env = Environment::new();
    env.add_template("usage", source)?;
    Ok(env.get_template("usage")?.render(data)?)
}

/// Renders the single usage line for one signature.
pub fn usage_line(program: &str, signature: &Signature, format: &UsageFormat) -> String {
    let mut parts = vec![format.prefix.clone(), program.to_string()];
    parts.extend(signature.params().iter().map(param_token));
    parts.retain(|part| !part.is_empty());
    parts.join(" ")
}

/// How one parameter appears in a usage line.
pub fn param_token(spec: &ParamSpec) -> String {
    let name = spec.name();
    let optional = !spec.is_required() || spec.default_value().is_some();
    match spec.kind() {
        ParamKind::Positional if optional => format!("[<{name}>]"),
        ParamKind::Positional => format!("<{name}>"),
        ParamKind::Variadic if optional => format!("[<{name}>...]"),
        ParamKind::Variadic => format!("<{name}>..."),
        ParamKind::Named if spec.value_type().is_boolean() => format!("--{name}"),
        ParamKind::Named => format!("--{name}=<{}>", spec.value_type()),
        ParamKind::CatchAll => "[--<key>=<value>...]".to_string(),
    }
}

fn described<'a>(params: impl Iterator<Item = &'a ParamSpec>) -> Vec<ParamEntry> {
    let entries: Vec<(String, &str)> = params
        .filter_map(|p| p.description().map(|d| (p.display_name(), d)))
        .collect();
    let width = entries.iter().map(|(name, _)| name.len()).max().unwrap_or(0);

    entries
        .into_iter()
        .map(|(name, description)| ParamEntry {
            padding: " ".repeat(width - name.len()),
            name,
            description: description.to_string(),
        })
        .collect()
}

/// One-line summary of why dispatch failed, led by `error:`.
///
/// No-match failures report the near-miss candidate's reason.
pub fn describe_failure(failure: &DispatchFailure) -> String {
    match failure {
        DispatchFailure::Parse(err) => format!("error: {err}"),
        DispatchFailure::NoMatch { .. } => match failure.closest() {
            Some(miss) => format!("error: {}", miss.reason),
            None => "error: no entry points are registered".to_string(),
        },
    }
}
