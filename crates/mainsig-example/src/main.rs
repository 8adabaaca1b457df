//! `greet`: a small mainsig CLI.
//!
//! ```text
//! greet                          hello world
//! greet Liz --times=2 --shout    HELLO LIZ (twice)
//! greet sum 1 2 3.5              6.5
//! greet --version                (hidden)
//! ```
//!
//! Set `RUST_LOG=mainsig=debug` to see dispatch decisions on stderr, and
//! `GREET_CONFIG=path.yaml` to load a dispatch configuration.

use anyhow::Context;
use mainsig::{DispatchConfig, ParamSpec, Runner, Signature, ValueType};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

const CONFIG_ENV: &str = "GREET_CONFIG";

fn main() {
    setup_logging();

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(mainsig::exitcode::INVOCATION_FAILURE);
        }
    };

    let runner = build_runner(config);
    let code = match runner.execute(
        std::env::args().skip(1),
        &mut std::io::stdout(),
        &mut std::io::stderr(),
    ) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            mainsig::exitcode::INVOCATION_FAILURE
        }
    };
    std::process::exit(code);
}

fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let fmt_layer = fmt::layer().with_writer(std::io::stderr).with_target(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

fn load_config() -> anyhow::Result<DispatchConfig> {
    match std::env::var(CONFIG_ENV) {
        Ok(path) => DispatchConfig::load(&path)
            .with_context(|| format!("loading {CONFIG_ENV}={path}")),
        Err(_) => Ok(DispatchConfig::default()),
    }
}

fn build_runner(config: DispatchConfig) -> Runner {
    Runner::builder("greet")
        .config(config)
        .signature(
            Signature::from_fn(|_| {
                println!("{}", env!("CARGO_PKG_VERSION"));
                Ok(())
            })
            .labeled("version")
            .param(ParamSpec::flag("version").required())
            .hidden(),
        )
        .signature(
            Signature::from_fn(|_| {
                println!("hello world");
                Ok(())
            })
            .labeled("hello"),
        )
        .signature(
            Signature::from_fn(|args| {
                let numbers = args.get_list("numbers").unwrap_or_default();
                let total: f64 = numbers.iter().filter_map(|n| n.as_float()).sum();
                println!("{total}");
                Ok(())
            })
            .labeled("sum")
            .param(ParamSpec::positional("command", ValueType::choice(["sum"])))
            .param(
                ParamSpec::variadic("numbers", ValueType::Float)
                    .required()
                    .with_description("values to add"),
            ),
        )
        .signature(
            Signature::from_fn(|args| {
                let name = args.get_str("name").context("name is bound")?;
                let times = args.get_int("times").unwrap_or(1);
                let line = format!("hello {name}");
                let line = if args.get_bool("shout").unwrap_or(false) {
                    line.to_uppercase()
                } else {
                    line
                };
                for _ in 0..times {
                    println!("{line}");
                }
                Ok(())
            })
            .labeled("greet")
            .param(
                ParamSpec::positional("name", ValueType::String).with_description("who to greet"),
            )
            .param(
                ParamSpec::named("times", ValueType::Integer)
                    .with_default(1i64)
                    .with_short('n')
                    .satisfying("times >= 0", |v| v.as_int().is_some_and(|n| n >= 0))
                    .with_description("how many times"),
            )
            .param(
                ParamSpec::flag("shout")
                    .with_short('s')
                    .with_description("use capitals"),
            ),
        )
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mainsig::exitcode;

    fn run(argv: &[&str]) -> (i32, String, String) {
        let runner = build_runner(DispatchConfig::default());
        let mut out = Vec::new();
        let mut err = Vec::new();
        let code = runner
            .execute(argv.iter().copied(), &mut out, &mut err)
            .unwrap();
        (
            code,
            String::from_utf8(out).unwrap(),
            String::from_utf8(err).unwrap(),
        )
    }

    #[test]
    fn test_dispatch_targets() {
        let runner = build_runner(DispatchConfig::default());
        let label = |argv: &[&str]| {
            runner
                .run(argv.iter().copied())
                .unwrap()
                .matched_index()
                .and_then(|i| runner.candidates().get(i))
                .and_then(|sig| sig.label().map(str::to_string))
        };

        assert_eq!(label(&[]).as_deref(), Some("hello"));
        assert_eq!(label(&["--version"]).as_deref(), Some("version"));
        assert_eq!(label(&["--no-version"]), None);
        assert_eq!(label(&["sum", "1", "2"]).as_deref(), Some("sum"));
        assert_eq!(label(&["Liz", "-n", "2"]), None);
        assert_eq!(label(&["-n", "2", "Liz"]).as_deref(), Some("greet"));
        // "sum" alone fails the sum candidate, so it is greeted.
        assert_eq!(label(&["sum"]).as_deref(), Some("greet"));
    }

    #[test]
    fn test_negative_times_is_rejected() {
        let (code, out, err) = run(&["--times=-1", "Liz"]);
        assert_eq!(code, exitcode::USAGE);
        assert!(out.is_empty());
        assert!(
            err.starts_with("error: value \"-1\" for --times does not satisfy times >= 0\n")
        );
    }

    #[test]
    fn test_negated_version_does_not_print_version() {
        let (code, out, err) = run(&["--no-version"]);
        assert_eq!(code, exitcode::USAGE);
        assert!(out.is_empty());
        assert!(err.starts_with("error: "));
    }

    #[test]
    fn test_help_lists_visible_signatures() {
        let (code, out, err) = run(&["-h"]);
        assert_eq!(code, exitcode::USAGE);
        assert!(err.is_empty());
        assert_eq!(
            out,
            "usage: greet\n\
             usage: greet <command> <numbers>...\n\
             \x20   <numbers>  values to add\n\
             usage: greet <name> --times=<Integer> --shout\n\
             \x20   <name>   who to greet\n\
             \x20   --times  how many times\n\
             \x20   --shout  use capitals\n"
        );
    }
}
