use std::path::{Component, Path, PathBuf};
use std::process::ExitCode;
use std::sync::Once;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::debug;
use twig_core::call::callable;
use twig_core::interp::{EvalConfig, EvaluationContext, Stack};
use twig_core::module::ModuleRegistry;
use twig_core::val::{FunctionValue, Value};

#[cfg(test)]
mod main_test;

static TRACE_INIT: Once = Once::new();
const DEFAULT_TRACE_FILTER: &str = "twig=debug";

#[derive(Debug, Parser)]
#[command(name = "twig", author, version, about = "CLI for twig", long_about = None)]
struct CliArgs {
    #[command(subcommand)]
    command: Commands,

    /// Evaluator settings (TOML)
    #[arg(long, global = true, value_name = "FILE", value_parser = parse_sanitized_path)]
    config: Option<PathBuf>,

    /// How results are printed
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Call a library function, e.g. `twig call data.get_in '{"a":[1]}' '["a",0]'`.
    Call {
        /// `module.function`
        function: String,
        /// Arguments, each a JSON document
        #[arg(value_name = "ARGS", allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// List registered modules, or the functions of one module.
    List { module: Option<String> },
    /// Load a JSON, YAML or TOML document and print it as a value.
    Inspect {
        #[arg(value_name = "FILE", value_parser = parse_sanitized_path)]
        file: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Inspect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DocumentFormat {
    Json,
    Yaml,
    Toml,
}

impl DocumentFormat {
    fn from_path(path: &Path) -> Result<Self> {
        let ext = path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("json") => Ok(DocumentFormat::Json),
            Some("yaml") | Some("yml") => Ok(DocumentFormat::Yaml),
            Some("toml") => Ok(DocumentFormat::Toml),
            _ => Err(anyhow!(
                "cannot tell the document format of '{}': expected .json, .yaml, .yml or .toml",
                path.display()
            )),
        }
    }

    fn parse(self, text: &str) -> Result<Value> {
        match self {
            DocumentFormat::Json => serde_json::from_str::<Value>(text).context("invalid JSON document"),
            DocumentFormat::Yaml => serde_yaml::from_str::<Value>(text).context("invalid YAML document"),
            DocumentFormat::Toml => toml::from_str::<Value>(text).context("invalid TOML document"),
        }
    }
}

fn read_file_content(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| anyhow!("Failed to read file '{}': {}", path.display(), e))
}

fn sanitize_path(raw: &str) -> Result<PathBuf> {
    let p = Path::new(raw);

    for comp in p.components() {
        if matches!(comp, Component::ParentDir) {
            return Err(anyhow!("Parent directory components ('..') are not allowed in file paths."));
        }
    }

    Ok(p.to_path_buf())
}

fn parse_sanitized_path(raw: &str) -> Result<PathBuf, String> {
    sanitize_path(raw).map_err(|e| e.to_string())
}

fn env_toggle_enabled(raw: &str) -> bool {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return false;
    }
    !(trimmed.eq_ignore_ascii_case("0") || trimmed.eq_ignore_ascii_case("false") || trimmed.eq_ignore_ascii_case("off"))
}

fn filter_expr_from(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty()
        || trimmed.eq_ignore_ascii_case("1")
        || trimmed.eq_ignore_ascii_case("true")
        || trimmed.eq_ignore_ascii_case("on")
    {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// `TWIG_TRACE=1` logs evaluator events to stderr; any other non-off value is
/// used as the filter directive itself.
fn maybe_init_tracing() {
    let raw = match std::env::var("TWIG_TRACE") {
        Ok(value) => value,
        Err(_) => return,
    };

    if !env_toggle_enabled(&raw) {
        return;
    }

    TRACE_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        use tracing_subscriber::fmt;

        let filter_expr = filter_expr_from(&raw).or_else(|| std::env::var("RUST_LOG").ok());

        let builder = fmt().with_writer(std::io::stderr);

        let builder = match filter_expr.and_then(|expr| EnvFilter::try_new(expr).ok()) {
            Some(filter) => builder.with_env_filter(filter),
            None => builder.with_env_filter(DEFAULT_TRACE_FILTER),
        };

        let _ = builder.try_init();
    });
}

fn load_config(path: Option<&Path>) -> Result<EvalConfig> {
    match path {
        Some(path) => EvalConfig::load(path),
        None => Ok(EvalConfig::default()),
    }
}

fn parse_argument(raw: &str) -> Result<Value> {
    serde_json::from_str::<Value>(raw).with_context(|| format!("argument {} is not valid JSON", raw))
}

fn call_function(registry: &ModuleRegistry, config: EvalConfig, path: &str, raw_args: &[String]) -> Result<Value> {
    let callee = registry.resolve(path)?;
    let function = callable(&callee)?.clone();
    let positional = raw_args.iter().map(|raw| parse_argument(raw)).collect::<Result<Vec<_>>>()?;
    let args = function.bind_arguments(positional, Vec::new())?;
    let context = EvaluationContext::from_registry(registry, config)?;
    let mut stack = Stack::new();
    debug!(target: "twig::cli", function = path, args = args.len(), "calling");
    function.invoke(&mut stack, &context, args)
}

fn render(value: &Value, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string(&value.to_json()?)?),
        OutputFormat::Inspect => Ok(value.to_string()),
    }
}

/// `name(a: long, b = nil) -> list`
fn describe_function(name: &str, function: &FunctionValue) -> String {
    let signature = function.signature();
    let params: Vec<String> = signature
        .params
        .iter()
        .map(|p| match &p.default {
            Some(default) => format!("{}: {} = {}", p.name, p.declared_type, default),
            None => format!("{}: {}", p.name, p.declared_type),
        })
        .collect();
    format!("{}({}) -> {}", name, params.join(", "), signature.return_type)
}

fn list_lines(registry: &ModuleRegistry, module: Option<&str>) -> Result<Vec<String>> {
    match module {
        None => registry
            .module_names()
            .into_iter()
            .map(|name| {
                let description = registry.get_module(&name)?.description().to_string();
                Ok(format!("{:<12}{}", name, description))
            })
            .collect(),
        Some(name) => {
            let mut exports = registry.get_module(name)?.exports();
            exports.sort_by(|a, b| a.0.cmp(&b.0));
            Ok(exports
                .iter()
                .map(|(member, value)| match value {
                    Value::Function(f) => describe_function(member, f),
                    other => format!("{} = {}", member, other),
                })
                .collect())
        }
    }
}

fn run(args: CliArgs) -> Result<()> {
    let mut registry = ModuleRegistry::new();
    twig_stdlib::register_stdlib_modules(&mut registry)?;

    match args.command {
        Commands::Call { function, args: raw_args } => {
            let config = load_config(args.config.as_deref())?;
            let result = call_function(&registry, config, &function, &raw_args)?;
            println!("{}", render(&result, args.format)?);
        }
        Commands::List { module } => {
            for line in list_lines(&registry, module.as_deref())? {
                println!("{}", line);
            }
        }
        Commands::Inspect { file } => {
            let format = DocumentFormat::from_path(&file)?;
            let text = read_file_content(&file)?;
            let value = format.parse(&text)?;
            debug!(target: "twig::cli", file = %file.display(), "loaded document");
            println!("{}", value);
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    maybe_init_tracing();

    match run(CliArgs::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
