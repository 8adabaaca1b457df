//! Overload resolution over a [`CandidateSet`].
//!
//! Each candidate is bound independently against the same [`Capture`]:
//!
//! 1. positional values fill `Positional` parameters in order; a `Variadic`
//!    parameter absorbs whatever remains;
//! 2. named values fill `Named` parameters by name; unknown keys go to a
//!    `CatchAll` parameter if one is declared;
//! 3. every value is coerced to the declared type and checked against the
//!    parameter's predicate;
//! 4. unbound parameters take their default, fail if required, or stay
//!    absent.
//!
//! Binding is pure, so the earliest-declared candidate that binds is the
//! one selected; later candidates are not attempted. When nothing binds,
//! every candidate reports the first condition it failed.

use std::collections::HashMap;
use thiserror::Error;
use tracing::trace;

use crate::capture::{Capture, ParseError};
use crate::handler::BoundArgs;
use crate::signature::{CandidateSet, ParamKind, ParamSpec, Signature};
use crate::value::Value;

/// Why a single candidate did not bind.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Mismatch {
    #[error("missing required argument {param}")]
    MissingRequired { param: String },

    #[error("invalid value for {param}: expected {expected}, got {found:?}")]
    TypeMismatch {
        param: String,
        expected: String,
        found: String,
    },

    #[error("value {found:?} for {param} does not satisfy {predicate}")]
    PredicateFailed {
        param: String,
        predicate: String,
        found: String,
    },

    #[error("unrecognized option --{name}")]
    UnrecognizedNamed { name: String },

    #[error("too many arguments: {count} unexpected, starting at {first:?}")]
    ExcessPositional { count: usize, first: String },
}

/// A candidate that failed to bind.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateMiss {
    /// Position of the candidate in its set.
    pub index: usize,
    pub reason: Mismatch,
    /// What the candidate had bound before failing.
    pub attempted: BoundArgs,
}

/// Result of matching one capture against a candidate set.
#[derive(Debug, Clone)]
pub enum DispatchOutcome {
    Matched {
        index: usize,
        signature: Signature,
        bound: BoundArgs,
    },
    NoMatch {
        misses: Vec<CandidateMiss>,
    },
}

impl DispatchOutcome {
    pub fn is_matched(&self) -> bool {
        matches!(self, DispatchOutcome::Matched { .. })
    }

    /// Index of the selected candidate, if any.
    pub fn matched_index(&self) -> Option<usize> {
        match self {
            DispatchOutcome::Matched { index, .. } => Some(*index),
            DispatchOutcome::NoMatch { .. } => None,
        }
    }
}

/// Why a run ended in usage text instead of an invocation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DispatchFailure {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("no matching signature")]
    NoMatch { misses: Vec<CandidateMiss> },
}

impl DispatchFailure {
    /// The near-miss: the candidate that bound the most arguments before
    /// failing, earliest declared on ties. `None` for parse failures.
    pub fn closest(&self) -> Option<&CandidateMiss> {
        match self {
            DispatchFailure::Parse(_) => None,
            DispatchFailure::NoMatch { misses } => {
                misses.iter().fold(None, |best: Option<&CandidateMiss>, miss| match best {
                    Some(b) if b.attempted.len() >= miss.attempted.len() => Some(b),
                    _ => Some(miss),
                })
            }
        }
    }

    pub fn is_parse_error(&self) -> bool {
        matches!(self, DispatchFailure::Parse(_))
    }
}

/// Selects the first candidate, in declaration order, that binds `capture`.
pub fn match_candidates(capture: &Capture, candidates: &CandidateSet) -> DispatchOutcome {
    let mut misses = Vec::new();

    for (index, signature) in candidates.iter().enumerate() {
        match bind(capture, signature) {
            Ok(bound) => {
                trace!(index, label = signature.label(), "candidate bound");
                return DispatchOutcome::Matched {
                    index,
                    signature: signature.clone(),
                    bound,
                };
            }
            Err((reason, attempted)) => {
                trace!(index, label = signature.label(), %reason, "candidate rejected");
                misses.push(CandidateMiss {
                    index,
                    reason,
                    attempted,
                });
            }
        }
    }

    DispatchOutcome::NoMatch { misses }
}

/// Binds `capture` to one signature.
///
/// On failure, returns the first unmet condition together with the
/// arguments bound up to that point.
pub fn bind(capture: &Capture, signature: &Signature) -> Result<BoundArgs, (Mismatch, BoundArgs)> {
    let mut binding = Binding::new(signature);
    match binding.bind_all(capture) {
        Ok(()) => Ok(binding.finish()),
        Err(reason) => Err((reason, binding.finish())),
    }
}

struct Binding<'a> {
    signature: &'a Signature,
    values: HashMap<&'a str, Value>,
    extra: Vec<(String, Value)>,
}

impl<'a> Binding<'a> {
    fn new(signature: &'a Signature) -> Self {
        Self {
            signature,
            values: HashMap::new(),
            extra: Vec::new(),
        }
    }

    fn bind_all(&mut self, capture: &Capture) -> Result<(), Mismatch> {
        self.bind_positional(&capture.positional)?;
        self.bind_named(capture)?;
        self.fill_unbound()
    }

    fn bind_positional(&mut self, positional: &[Value]) -> Result<(), Mismatch> {
        let mut remaining = positional.iter();

        for spec in self.params().filter(|p| p.kind().is_positional()) {
            match spec.kind() {
                ParamKind::Variadic => {
                    let rest: Vec<&Value> = remaining.by_ref().collect();
                    if rest.is_empty() {
                        continue;
                    }
                    let items = rest
                        .into_iter()
                        .map(|raw| coerce(spec, raw))
                        .collect::<Result<Vec<_>, _>>()?;
                    self.insert(spec, check(spec, Value::List(items))?);
                }
                _ => match remaining.next() {
                    Some(raw) => {
                        let value = check(spec, coerce(spec, raw)?)?;
                        self.insert(spec, value);
                    }
                    None => continue,
                },
            }
        }

        let excess: Vec<&Value> = remaining.collect();
        match excess.first() {
            Some(first) => Err(Mismatch::ExcessPositional {
                count: excess.len(),
                first: first.to_string(),
            }),
            None => Ok(()),
        }
    }

    fn bind_named(&mut self, capture: &Capture) -> Result<(), Mismatch> {
        let has_catch_all = self.params().any(|p| p.kind() == ParamKind::CatchAll);

        for (name, raw) in &capture.named {
            let spec = self
                .params()
                .find(|p| p.kind() == ParamKind::Named && p.name() == name);
            match spec {
                Some(spec) => {
                    let value = check(spec, coerce(spec, raw)?)?;
                    if spec.is_required() && spec.is_flag() && value == Value::Boolean(false) {
                        return Err(Mismatch::MissingRequired {
                            param: spec.display_name(),
                        });
                    }
                    self.insert(spec, value);
                }
                None if has_catch_all => self.extra.push((name.clone(), raw.clone())),
                None => {
                    return Err(Mismatch::UnrecognizedNamed { name: name.clone() });
                }
            }
        }
        Ok(())
    }

    fn fill_unbound(&mut self) -> Result<(), Mismatch> {
        for spec in self.params().filter(|p| p.kind() != ParamKind::CatchAll) {
            if self.values.contains_key(spec.name()) {
                continue;
            }
            if let Some(default) = spec.default_value() {
                self.insert(spec, default.clone());
            } else if spec.is_required() {
                return Err(Mismatch::MissingRequired {
                    param: spec.display_name(),
                });
            } else if spec.kind() == ParamKind::Variadic {
                self.insert(spec, Value::List(Vec::new()));
            }
        }
        Ok(())
    }

    fn params(&self) -> std::slice::Iter<'a, ParamSpec> {
        self.signature.params().iter()
    }

    fn insert(&mut self, spec: &'a ParamSpec, value: Value) {
        self.values.insert(spec.name(), value);
    }

    /// Orders bound values by declaration.
    fn finish(mut self) -> BoundArgs {
        let mut bound = BoundArgs::new();
        for spec in self.signature.params() {
            if let Some(value) = self.values.remove(spec.name()) {
                bound.push(spec.name(), value);
            }
        }
        for (name, value) in self.extra {
            bound.insert_extra(name, value);
        }
        bound
    }
}

fn coerce(spec: &ParamSpec, raw: &Value) -> Result<Value, Mismatch> {
    spec.value_type()
        .coerce(raw)
        .ok_or_else(|| Mismatch::TypeMismatch {
            param: spec.display_name(),
            expected: spec.value_type().to_string(),
            found: raw.to_string(),
        })
}

fn check(spec: &ParamSpec, value: Value) -> Result<Value, Mismatch> {
    match spec.predicate() {
        Some(predicate) if !predicate.test(&value) => Err(Mismatch::PredicateFailed {
            param: spec.display_name(),
            predicate: predicate.name().to_string(),
            found: value.to_string(),
        }),
        _ => Ok(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ValueType;

    fn sig() -> Signature {
        Signature::from_fn(|_| Ok(()))
    }

    fn expect_match(capture: &Capture, candidates: &CandidateSet) -> (usize, BoundArgs) {
        match match_candidates(capture, candidates) {
            DispatchOutcome::Matched { index, bound, .. } => (index, bound),
            DispatchOutcome::NoMatch { misses } => panic!("expected a match, got {misses:?}"),
        }
    }

    fn expect_reasons(capture: &Capture, candidates: &CandidateSet) -> Vec<Mismatch> {
        match match_candidates(capture, candidates) {
            DispatchOutcome::NoMatch { misses } => misses.into_iter().map(|m| m.reason).collect(),
            DispatchOutcome::Matched { index, .. } => panic!("unexpected match on {index}"),
        }
    }

    #[test]
    fn test_scenario_no_args_and_name() {
        let candidates: CandidateSet = vec![
            sig(),
            sig().param(ParamSpec::positional("name", ValueType::String)),
        ]
        .into();

        let (index, bound) = expect_match(&Capture::new(), &candidates);
        assert_eq!(index, 0);
        assert!(bound.is_empty());

        let (index, bound) = expect_match(&Capture::new().with_positional("Liz"), &candidates);
        assert_eq!(index, 1);
        assert_eq!(bound.get_str("name"), Some("Liz"));
    }

    #[test]
    fn test_required_flag_demands_true() {
        let candidates: CandidateSet = vec![
            sig().param(ParamSpec::flag("version").required()),
            sig().param(ParamSpec::flag("version")),
        ]
        .into();

        let capture = Capture::new().with_named("version", true);
        let (index, bound) = expect_match(&capture, &candidates);
        assert_eq!(index, 0);
        assert_eq!(bound.get_bool("version"), Some(true));

        let capture = Capture::new().with_named("version", false);
        let (index, _) = expect_match(&capture, &candidates);
        assert_eq!(index, 1);

        let only: CandidateSet = vec![sig().param(ParamSpec::flag("version").required())].into();
        assert_eq!(
            expect_reasons(&capture, &only),
            vec![Mismatch::MissingRequired {
                param: "--version".into()
            }]
        );
    }

    #[test]
    fn test_declaration_order_breaks_ties() {
        let candidates: CandidateSet = vec![
            sig().param(ParamSpec::positional("a", ValueType::String)),
            sig()
                .param(ParamSpec::positional("a", ValueType::String))
                .param(ParamSpec::positional("b", ValueType::String).with_default("x")),
        ]
        .into();

        let (index, _) = expect_match(&Capture::new().with_positional("1"), &candidates);
        assert_eq!(index, 0);
    }

    #[test]
    fn test_narrow_type_declared_first_wins() {
        let candidates: CandidateSet = vec![
            sig().param(ParamSpec::positional("n", ValueType::Integer)),
            sig().param(ParamSpec::positional("s", ValueType::String)),
        ]
        .into();

        let (index, bound) = expect_match(&Capture::new().with_positional("12"), &candidates);
        assert_eq!(index, 0);
        assert_eq!(bound.get_int("n"), Some(12));

        let (index, bound) = expect_match(&Capture::new().with_positional("abc"), &candidates);
        assert_eq!(index, 1);
        assert_eq!(bound.get_str("s"), Some("abc"));
    }

    #[test]
    fn test_all_defaulted_matches_empty_capture() {
        let candidates: CandidateSet = vec![sig()
            .param(ParamSpec::positional("count", ValueType::Integer).with_default(3i64))
            .param(ParamSpec::named("mode", ValueType::String).with_default("fast"))
            .param(ParamSpec::flag("dry-run"))]
        .into();

        let (_, bound) = expect_match(&Capture::new(), &candidates);
        assert_eq!(bound.get_int("count"), Some(3));
        assert_eq!(bound.get_str("mode"), Some("fast"));
        assert_eq!(bound.get_bool("dry-run"), Some(false));
    }

    #[test]
    fn test_optional_without_default_stays_absent() {
        let candidates: CandidateSet =
            vec![sig().param(ParamSpec::named("limit", ValueType::Integer))].into();
        let (_, bound) = expect_match(&Capture::new(), &candidates);
        assert!(!bound.contains("limit"));
    }

    #[test]
    fn test_missing_required() {
        let candidates: CandidateSet = vec![
            sig().param(ParamSpec::positional("file", ValueType::String)),
            sig().param(ParamSpec::named("out", ValueType::String).required()),
        ]
        .into();

        assert_eq!(
            expect_reasons(&Capture::new(), &candidates),
            vec![
                Mismatch::MissingRequired {
                    param: "<file>".into()
                },
                Mismatch::MissingRequired {
                    param: "--out".into()
                },
            ]
        );
    }

    #[test]
    fn test_excess_positional() {
        let candidates: CandidateSet =
            vec![sig().param(ParamSpec::positional("a", ValueType::String))].into();
        let capture = Capture::new()
            .with_positional("1")
            .with_positional("2")
            .with_positional("3");

        assert_eq!(
            expect_reasons(&capture, &candidates),
            vec![Mismatch::ExcessPositional {
                count: 2,
                first: "2".into()
            }]
        );
    }

    #[test]
    fn test_variadic_absorbs_excess() {
        let candidates: CandidateSet = vec![sig()
            .param(ParamSpec::positional("op", ValueType::choice(["sum"])))
            .param(ParamSpec::variadic("numbers", ValueType::Integer))]
        .into();

        let capture = Capture::new()
            .with_positional("sum")
            .with_positional("1")
            .with_positional("2");
        let (_, bound) = expect_match(&capture, &candidates);
        assert_eq!(bound.get("numbers"), Some(&Value::from(vec![1i64, 2])));

        let (_, bound) = expect_match(&Capture::new().with_positional("sum"), &candidates);
        assert_eq!(bound.get_list("numbers").map(<[Value]>::len), Some(0));
    }

    #[test]
    fn test_required_variadic_needs_one_value() {
        let candidates: CandidateSet =
            vec![sig().param(ParamSpec::variadic("files", ValueType::String).required())].into();
        assert_eq!(
            expect_reasons(&Capture::new(), &candidates),
            vec![Mismatch::MissingRequired {
                param: "<files>".into()
            }]
        );
    }

    #[test]
    fn test_unrecognized_named() {
        let candidates: CandidateSet = vec![sig()].into();
        assert_eq!(
            expect_reasons(&Capture::new().with_named("color", "red"), &candidates),
            vec![Mismatch::UnrecognizedNamed {
                name: "color".into()
            }]
        );
    }

    #[test]
    fn test_catch_all_absorbs_unknown_named() {
        let candidates: CandidateSet = vec![sig()
            .param(ParamSpec::named("name", ValueType::String))
            .param(ParamSpec::catch_all("options"))]
        .into();

        let capture = Capture::new()
            .with_named("name", "x")
            .with_named("color", "red");
        let (_, bound) = expect_match(&capture, &candidates);
        assert_eq!(bound.get_str("name"), Some("x"));
        assert_eq!(bound.extra().get("color"), Some(&Value::from("red")));
    }

    #[test]
    fn test_type_mismatch() {
        let candidates: CandidateSet =
            vec![sig().param(ParamSpec::named("count", ValueType::Integer))].into();
        assert_eq!(
            expect_reasons(&Capture::new().with_named("count", "many"), &candidates),
            vec![Mismatch::TypeMismatch {
                param: "--count".into(),
                expected: "Integer".into(),
                found: "many".into(),
            }]
        );
    }

    #[test]
    fn test_predicate_failure() {
        let candidates: CandidateSet = vec![sig().param(
            ParamSpec::positional("port", ValueType::Integer)
                .satisfying("port < 65536", |v| v.as_int().is_some_and(|n| n < 65536)),
        )]
        .into();

        let (_, bound) = expect_match(&Capture::new().with_positional("8080"), &candidates);
        assert_eq!(bound.get_int("port"), Some(8080));

        assert_eq!(
            expect_reasons(&Capture::new().with_positional("70000"), &candidates),
            vec![Mismatch::PredicateFailed {
                param: "<port>".into(),
                predicate: "port < 65536".into(),
                found: "70000".into(),
            }]
        );
    }

    #[test]
    fn test_flag_value_rejected_by_string_param() {
        let candidates: CandidateSet =
            vec![sig().param(ParamSpec::named("verbose", ValueType::String))].into();
        let reasons = expect_reasons(&Capture::new().with_named("verbose", true), &candidates);
        assert!(matches!(reasons[0], Mismatch::TypeMismatch { .. }));
    }

    #[test]
    fn test_bound_args_follow_declaration_order() {
        let candidates: CandidateSet = vec![sig()
            .param(ParamSpec::named("z", ValueType::String).with_default("1"))
            .param(ParamSpec::positional("a", ValueType::String))
            .param(ParamSpec::named("m", ValueType::String))]
        .into();

        let capture = Capture::new().with_positional("x").with_named("m", "y");
        let (_, bound) = expect_match(&capture, &candidates);
        let names: Vec<&str> = bound.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_closest_miss_prefers_most_bound() {
        let candidates: CandidateSet = vec![
            sig().param(ParamSpec::positional("a", ValueType::Integer)),
            sig()
                .param(ParamSpec::positional("a", ValueType::String))
                .param(ParamSpec::positional("b", ValueType::String)),
        ]
        .into();

        let DispatchOutcome::NoMatch { misses } =
            match_candidates(&Capture::new().with_positional("x"), &candidates)
        else {
            panic!("expected no match");
        };

        let failure = DispatchFailure::NoMatch { misses };
        let closest = failure.closest().unwrap();
        assert_eq!(closest.index, 1);
        assert_eq!(closest.attempted.get_str("a"), Some("x"));
    }

    #[test]
    fn test_closest_miss_ties_go_to_earliest() {
        let candidates: CandidateSet = vec![
            sig().param(ParamSpec::positional("a", ValueType::Integer)),
            sig().param(ParamSpec::positional("b", ValueType::Float)),
        ]
        .into();

        let DispatchOutcome::NoMatch { misses } =
            match_candidates(&Capture::new().with_positional("x"), &candidates)
        else {
            panic!("expected no match");
        };
        let failure = DispatchFailure::NoMatch { misses };
        assert_eq!(failure.closest().map(|m| m.index), Some(0));
    }

    #[test]
    fn test_empty_candidate_set_never_matches() {
        let outcome = match_candidates(&Capture::new(), &CandidateSet::new());
        assert!(!outcome.is_matched());
        assert_eq!(outcome.matched_index(), None);
    }
}
