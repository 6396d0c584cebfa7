use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::Parser;
use scriptargs::{ArgRegistry, ArgSpec, ArgType, Value};
use serde::Deserialize;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser)]
#[command(name = "scriptargs")]
#[command(
    version,
    about = "Inspect how an R-style invocation parses against a JSON argument schema",
    long_about = None
)]
struct Cli {
    /// Path to the JSON argument schema
    #[arg(short, long, value_name = "FILE")]
    schema: PathBuf,

    /// Raw invocation tokens, starting with the interpreter path
    #[arg(
        value_name = "TOKEN",
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    tokens: Vec<String>,
}

#[derive(Deserialize)]
struct Schema {
    name: Option<String>,
    #[serde(default)]
    args: Vec<SchemaArg>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct SchemaArg {
    name: String,
    flag: Option<String>,
    #[serde(rename = "type", default)]
    arg_type: SchemaType,
    #[serde(default = "default_nargs")]
    nargs: i32,
    #[serde(default)]
    required: bool,
    #[serde(default)]
    choices: Vec<serde_json::Value>,
    default: Option<serde_json::Value>,
    #[serde(default)]
    help: String,
}

fn default_nargs() -> i32 {
    1
}

#[derive(Deserialize, Clone, Copy, Default)]
#[serde(rename_all = "kebab-case")]
enum SchemaType {
    Boolean,
    PresenceTrue,
    PresenceFalse,
    #[default]
    String,
    Numeric,
    Integer,
    Double,
}

impl From<SchemaType> for ArgType {
    fn from(ty: SchemaType) -> Self {
        match ty {
            SchemaType::Boolean => Self::Bool,
            SchemaType::PresenceTrue => Self::StoreTrue,
            SchemaType::PresenceFalse => Self::StoreFalse,
            SchemaType::String => Self::Str,
            SchemaType::Numeric => Self::Numeric,
            SchemaType::Integer => Self::Integer,
            SchemaType::Double => Self::Double,
        }
    }
}

fn main() -> Result<ExitCode> {
    init_tracing();
    let cli = Cli::parse();

    let raw = fs::read_to_string(&cli.schema)
        .with_context(|| format!("failed to read {}", cli.schema.display()))?;
    let schema: Schema = serde_json::from_str(&raw)
        .with_context(|| format!("invalid schema in {}", cli.schema.display()))?;

    let mut registry = match schema.name {
        Some(name) => ArgRegistry::with_name(name),
        None => ArgRegistry::new(),
    }
    .exit_on_help(false);

    for def in &schema.args {
        registry.register(build_spec(def)?);
    }

    tracing::debug!(arguments = schema.args.len(), "loaded schema");
    let results = registry.parse_arguments(Some(cli.tokens))?;
    let all_ok = results.values().all(|ok| *ok);

    if registry.help_requested() {
        return Ok(ExitCode::SUCCESS);
    }

    let mut ok = serde_json::Map::new();
    for (name, success) in &results {
        ok.insert(name.clone(), (*success).into());
    }
    let mut values = serde_json::Map::new();
    for (name, value) in registry.get_all() {
        values.insert(name, to_json(&value));
    }
    let report = serde_json::json!({
        "script": registry.filename(),
        "options": registry.options(),
        "ok": ok,
        "values": values,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(if all_ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn build_spec(def: &SchemaArg) -> Result<ArgSpec> {
    let arg_type = ArgType::from(def.arg_type);
    let mut spec = ArgSpec::new(def.name.clone())
        .arg_type(arg_type)
        .nargs(def.nargs)
        .required(def.required)
        .help(def.help.clone());
    if let Some(flag) = &def.flag {
        spec = spec.flag(flag.clone());
    }
    if !def.choices.is_empty() {
        let choices = def
            .choices
            .iter()
            .map(to_value)
            .collect::<Result<Vec<_>>>()
            .with_context(|| format!("invalid choices for argument '{}'", def.name))?;
        spec = spec.choices(choices.into_iter().map(|v| coerce(v, arg_type)));
    }
    if let Some(default) = &def.default {
        let default = to_value(default)
            .with_context(|| format!("invalid default for argument '{}'", def.name))?;
        spec = spec.default(coerce(default, arg_type));
    }
    Ok(spec)
}

fn to_value(raw: &serde_json::Value) -> Result<Value> {
    let value = match raw {
        serde_json::Value::Null => Value::None,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int(i)
            } else {
                Value::Float(n.as_f64().context("number out of range")?)
            }
        }
        serde_json::Value::String(s) => Value::Str(s.clone()),
        serde_json::Value::Array(items) => {
            Value::List(items.iter().map(to_value).collect::<Result<_>>()?)
        }
        serde_json::Value::Object(_) => bail!("objects are not valid argument values"),
    };
    Ok(value)
}

/// JSON integers stand in for numeric defaults and choices; align them
/// with the declared type so choice membership compares correctly.
fn coerce(value: Value, arg_type: ArgType) -> Value {
    match (arg_type, value) {
        (ArgType::Numeric | ArgType::Double, Value::Int(i)) => Value::Float(i as f64),
        (ty, Value::List(items)) => {
            Value::List(items.into_iter().map(|item| coerce(item, ty)).collect())
        }
        (_, other) => other,
    }
}

fn to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::None => serde_json::Value::Null,
        Value::Bool(b) => (*b).into(),
        Value::Str(s) => s.clone().into(),
        Value::Int(i) => (*i).into(),
        Value::Float(x) => serde_json::Number::from_f64(*x)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::List(items) => serde_json::Value::Array(items.iter().map(to_json).collect()),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // Diagnostics go to stderr; stdout carries only the JSON report.
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
