//! The registry: an ordered collection of specifications plus the
//! invocation metadata carved out of one raw token array.

use std::path::Path;

use indexmap::IndexMap;
use thiserror::Error;

use crate::engine;
use crate::spec::ArgSpec;
use crate::value::Value;

/// Separator between interpreter-level tokens and script arguments.
const ARGS_SEPARATOR: &str = "--args";
/// Prefix of the token naming the script file.
const FILE_PREFIX: &str = "--file=";

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("no invocation tokens available; pass them to parse_arguments")]
    NoInvocation,
}

/// Name-keyed, insertion-ordered registry of [`ArgSpec`]s for one
/// command invocation.
///
/// Lifecycle: construct, register specifications, parse once, then
/// query values any number of times. Re-parsing re-runs the whole
/// algorithm and overwrites prior results.
pub struct ArgRegistry {
    name: Option<String>,
    derived_name: Option<String>,
    cmdargs: Vec<String>,
    app: Option<String>,
    options: Vec<String>,
    filename: Option<String>,
    args: IndexMap<String, ArgSpec>,
    exit_on_help: bool,
    help_requested: bool,
}

impl Default for ArgRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ArgRegistry {
    /// A registry with a placeholder display name; the name is derived
    /// from the `--file=` token's base name during parsing.
    pub fn new() -> Self {
        Self {
            name: None,
            derived_name: None,
            cmdargs: Vec::new(),
            app: None,
            options: Vec::new(),
            filename: None,
            args: IndexMap::new(),
            exit_on_help: true,
            help_requested: false,
        }
    }

    /// A registry with an explicit display name for usage text.
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::new()
        }
    }

    /// Whether `--help`/`-h` terminates the process after printing
    /// usage. Defaults to true; hosts and tests disable it.
    pub fn exit_on_help(mut self, exit: bool) -> Self {
        self.exit_on_help = exit;
        self
    }

    /// Store a specification keyed by its name. An existing entry with
    /// the same name is silently replaced in place, keeping its
    /// original declaration order.
    pub fn register(&mut self, spec: ArgSpec) {
        self.args.insert(spec.name().to_string(), spec);
    }

    /// Parse one raw invocation token array.
    ///
    /// `tokens`, when given, replaces the stored raw array. The first
    /// token is the program path; a `--file=<path>` token populates the
    /// script filename and the interpreter options between the two; the
    /// trailing segment after `--args` is matched against every
    /// registered specification in declaration order. A failed match
    /// logs a diagnostic and records `false` for that argument; parsing
    /// always continues to the next one.
    pub fn parse_arguments(
        &mut self,
        tokens: Option<Vec<String>>,
    ) -> Result<IndexMap<String, bool>, ParseError> {
        if let Some(tokens) = tokens {
            self.cmdargs = tokens;
        }
        if self.cmdargs.is_empty() {
            return Err(ParseError::NoInvocation);
        }

        // Re-detect invocation metadata from scratch; a re-parse must
        // not carry anything over from a previous token array.
        self.app = self.cmdargs.first().cloned();
        self.filename = None;
        self.options = Vec::new();
        self.derived_name = None;

        if let Some(file_ix) = self.cmdargs.iter().position(|t| t.starts_with(FILE_PREFIX)) {
            let path = self.cmdargs[file_ix][FILE_PREFIX.len()..].to_string();
            self.derived_name = Path::new(&path)
                .file_name()
                .map(|base| base.to_string_lossy().into_owned());
            self.filename = Some(path);
            self.options = if file_ix > 1 {
                self.cmdargs[1..file_ix].to_vec()
            } else {
                Vec::new()
            };
        }

        self.help_requested = self.cmdargs.iter().any(|t| t == "--help" || t == "-h");
        if self.help_requested {
            eprint!("{}", self.usage());
            if self.exit_on_help {
                std::process::exit(0);
            }
        }

        let trailing: &[String] = match self.cmdargs.iter().position(|t| t == ARGS_SEPARATOR) {
            Some(ix) if ix + 1 < self.cmdargs.len() => &self.cmdargs[ix + 1..],
            _ => &[],
        };

        let mut results = IndexMap::with_capacity(self.args.len());
        for spec in self.args.values_mut() {
            let ok = match engine::match_spec(spec, trailing) {
                Ok(()) => true,
                Err(err) => {
                    tracing::warn!(argument = spec.name(), "{err}");
                    false
                }
            };
            results.insert(spec.name().to_string(), ok);
        }
        tracing::debug!(arguments = results.len(), "parsed invocation");
        Ok(results)
    }

    pub fn has(&self, name: &str) -> bool {
        self.args.contains_key(name)
    }

    /// Resolve the named argument's value through its action hook.
    ///
    /// # Panics
    ///
    /// Panics if no argument of that name was registered; looking up an
    /// undeclared argument is a programmer error.
    pub fn get(&self, name: &str) -> Value {
        match self.args.get(name) {
            Some(spec) => spec.resolve(),
            None => panic!("argument '{name}' is not registered"),
        }
    }

    /// Every registered argument's resolved value, in declaration
    /// order.
    pub fn get_all(&self) -> IndexMap<String, Value> {
        self.args
            .iter()
            .map(|(name, spec)| (name.clone(), spec.resolve()))
            .collect()
    }

    /// Display name: the explicit name, else the script base name
    /// detected while parsing, else a placeholder.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.derived_name.as_deref())
            .unwrap_or("script")
    }

    /// The program/interpreter path, once parsed.
    pub fn app(&self) -> Option<&str> {
        self.app.as_deref()
    }

    /// Interpreter-level options between the program and the `--file=`
    /// token.
    pub fn options(&self) -> &[String] {
        &self.options
    }

    /// The script path carried by the `--file=` token, if any.
    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    /// Whether the last parse saw `--help` or `-h` anywhere in the raw
    /// array.
    pub fn help_requested(&self) -> bool {
        self.help_requested
    }

    /// Render the usage text: a one-line synopsis followed by an
    /// aligned option listing.
    pub fn usage(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("Usage: {}", self.display_name()));
        for spec in self.args.values() {
            out.push(' ');
            out.push_str(&spec.usage_fragment());
        }
        out.push('\n');

        if self.args.is_empty() {
            return out;
        }

        out.push_str("\nOptions:\n");
        let rows: Vec<(String, String)> = self
            .args
            .values()
            .map(|spec| (format!("--{}", spec.flag), option_help(spec)))
            .collect();
        let width = rows.iter().map(|(left, _)| left.len()).max().unwrap_or(0);
        for (left, help) in rows {
            if help.is_empty() {
                out.push_str(&format!("  {left}\n"));
            } else {
                out.push_str(&format!("  {left:width$}  {help}\n"));
            }
        }
        out
    }

    /// An illustrative raw invocation built from the registered
    /// defaults, suitable for documentation output.
    pub fn example_invocation(&self) -> Vec<String> {
        let mut tokens = Vec::new();
        tokens.push(self.app.clone().unwrap_or_else(|| "Rscript".to_string()));
        tokens.push(format!(
            "{FILE_PREFIX}{}",
            self.filename.as_deref().unwrap_or("script.R")
        ));
        tokens.push(ARGS_SEPARATOR.to_string());
        for spec in self.args.values() {
            tokens.push(format!("--{}", spec.flag));
            if spec.arg_type.is_presence() {
                continue;
            }
            match &spec.default {
                Value::None => tokens.push(format!("<{}>", spec.arg_type.label())),
                Value::List(items) => tokens.extend(items.iter().map(ToString::to_string)),
                scalar => tokens.push(scalar.to_string()),
            }
        }
        tokens
    }
}

fn option_help(spec: &ArgSpec) -> String {
    let mut out = spec.help.trim().to_string();
    if spec.required {
        if out.is_empty() {
            out.push_str("required");
        } else {
            out.push_str(" (required)");
        }
    }
    if !spec.default.is_none() {
        let rendered = format!("[default: {}]", spec.default);
        if out.is_empty() {
            out.push_str(&rendered);
        } else {
            out.push_str(&format!(" {rendered}"));
        }
    }
    if !spec.choices.is_empty() {
        let allowed = spec
            .choices
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        if out.is_empty() {
            out.push_str(&format!("[choices: {allowed}]"));
        } else {
            out.push_str(&format!(" [choices: {allowed}]"));
        }
    }
    out
}
