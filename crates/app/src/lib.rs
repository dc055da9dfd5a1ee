//! vareval command line
//!
//! Wires the file-backed adapters to the resolution engine:
//!
//! ```text
//! vareval --variables vars.json eval 'Bearer ${token}'
//! vareval --variables vars.json request request.json
//! vareval --variables vars.json context --set host=localhost
//! vareval functions
//! ```

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tokio::sync::Mutex;
use tracing::debug;
use vareval_application::variable_resolver::Builtin;
use vareval_application::{
    Clock, EvaluateValue, EvaluateValueInput, ExpressionEvaluator, ProcessRequest,
    ProcessRequestInput, VariableProvider, VariablesEvaluator,
};
use vareval_domain::{OverrideMap, RequestRecord, Value, parse_assignment};
use vareval_infrastructure::{
    ConcatEvaluator, JsonFileVariableProvider, SettingsRepository, StaticVariableProvider,
    SystemClock, from_json_bytes, to_json_stable,
};

/// Resolve `${...}` expressions, functions and variables.
#[derive(Debug, Parser)]
#[command(name = "vareval")]
#[command(version, about)]
pub struct Cli {
    /// JSON file with the current variables (`[{"name", "value", "enabled"}]`)
    #[arg(long, env = "VAREVAL_VARIABLES", global = true)]
    pub variables: Option<PathBuf>,

    /// Settings file (defaults to the user config directory)
    #[arg(long, env = "VAREVAL_SETTINGS", global = true)]
    pub settings: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Evaluate a single value and print the result
    Eval {
        /// Value to evaluate, e.g. 'Bearer ${token}'
        value: String,

        /// Override a variable for this evaluation
        #[arg(long = "set", value_name = "NAME=VALUE", value_parser = parse_assignment)]
        set: Vec<(String, String)>,
    },

    /// Resolve a request record read from a JSON file
    Request {
        /// Request file with `url`, `method`, `headers`, `payload` and `config`
        file: PathBuf,

        /// Override a variable for this request
        #[arg(long = "set", value_name = "NAME=VALUE", value_parser = parse_assignment)]
        set: Vec<(String, String)>,
    },

    /// Print the resolved variables context
    Context {
        /// Override a variable in the context
        #[arg(long = "set", value_name = "NAME=VALUE", value_parser = parse_assignment)]
        set: Vec<(String, String)>,
    },

    /// List the available functions
    Functions,
}

fn overrides(set: Vec<(String, String)>) -> Option<OverrideMap> {
    if set.is_empty() {
        None
    } else {
        Some(set.into_iter().collect())
    }
}

async fn open_session(cli: &Cli) -> anyhow::Result<Arc<Mutex<VariablesEvaluator>>> {
    let repository = cli
        .settings
        .as_ref()
        .map_or_else(SettingsRepository::new, SettingsRepository::at);
    let settings = repository.load().await.context("failed to load settings")?;
    debug!(?settings, "settings loaded");

    let provider: Arc<dyn VariableProvider> = match &cli.variables {
        Some(path) => Arc::new(JsonFileVariableProvider::new(path)),
        None => Arc::new(StaticVariableProvider::declined()),
    };
    let evaluator: Arc<dyn ExpressionEvaluator> = Arc::new(ConcatEvaluator::new());
    let clock: Arc<dyn Clock> = Arc::new(SystemClock::new());

    Ok(Arc::new(Mutex::new(VariablesEvaluator::with_settings(
        provider, evaluator, clock, settings,
    ))))
}

/// Runs a parsed command line, writing results to `out`.
///
/// # Errors
/// Returns an error when a file cannot be read or parsed, or when
/// evaluation fails.
pub async fn run<W: Write>(cli: Cli, out: &mut W) -> anyhow::Result<()> {
    if matches!(cli.command, Command::Functions) {
        for info in Builtin::available() {
            writeln!(out, "{:<20} {}", info.name, info.description)?;
            writeln!(out, "{:<20} e.g. {}", "", info.example)?;
        }
        return Ok(());
    }

    let session = open_session(&cli).await?;
    match cli.command {
        Command::Eval { value, set } => {
            let input = EvaluateValueInput {
                overrides: overrides(set),
                ..EvaluateValueInput::text(value)
            };
            let result = EvaluateValue::new(session)
                .execute(input)
                .await
                .context("evaluation failed")?;
            match result {
                Value::Text(text) => writeln!(out, "{text}")?,
                other => write!(out, "{}", to_json_stable(&other)?)?,
            }
        }
        Command::Request { file, set } => {
            let content = tokio::fs::read(&file)
                .await
                .with_context(|| format!("failed to read {}", file.display()))?;
            let request: RequestRecord = from_json_bytes(&content)
                .with_context(|| format!("invalid request file {}", file.display()))?;
            let output = ProcessRequest::new(session)
                .execute(ProcessRequestInput {
                    request,
                    overrides: overrides(set),
                })
                .await
                .context("request processing failed")?;
            write!(out, "{}", to_json_stable(&output.request)?)?;
        }
        Command::Context { set } => {
            let context = session
                .lock()
                .await
                .build_context(overrides(set).as_ref())
                .await
                .context("failed to build context")?;
            write!(out, "{}", to_json_stable(&context)?)?;
        }
        Command::Functions => {}
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parses_eval_with_overrides() {
        let cli = Cli::try_parse_from([
            "vareval",
            "eval",
            "${a}",
            "--set",
            "a=1",
            "--set",
            "b=x=y",
        ])
        .unwrap();
        let Command::Eval { value, set } = cli.command else {
            panic!("expected eval");
        };
        assert_eq!(value, "${a}");
        assert_eq!(
            set,
            vec![
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), "x=y".to_string())
            ]
        );
    }

    #[test]
    fn test_rejects_bad_assignment() {
        assert!(Cli::try_parse_from(["vareval", "context", "--set", "novalue"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["vareval", "functions", "--variables", "v.json"]).unwrap();
        assert_eq!(cli.variables, Some(PathBuf::from("v.json")));
    }

    #[test]
    fn test_overrides_empty_is_none() {
        assert!(overrides(Vec::new()).is_none());
        assert_eq!(
            overrides(vec![("a".to_string(), "1".to_string())]).unwrap()["a"],
            "1"
        );
    }
}
