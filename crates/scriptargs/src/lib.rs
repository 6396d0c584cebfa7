//! Declarative argparse-style parsing for R-style script invocations.
//!
//! An invocation line such as
//! `/usr/bin/R --slave --file=script.R --args --name alice --count 3`
//! carries three regions: interpreter options, a `--file=` token naming
//! the script, and the user arguments after the `--args` separator.
//! [`ArgRegistry`] holds declarative [`ArgSpec`] definitions and turns
//! that trailing segment into typed, validated [`Value`]s:
//!
//! ```
//! use scriptargs::{ArgRegistry, ArgSpec, ArgType, Value};
//!
//! let mut registry = ArgRegistry::new().exit_on_help(false);
//! registry.register(ArgSpec::new("name").required(true));
//! registry.register(ArgSpec::new("count").arg_type(ArgType::Integer).default(1i64));
//!
//! let tokens: Vec<String> = ["/usr/bin/R", "--file=script.R", "--args", "--name", "alice"]
//!     .iter()
//!     .map(|t| t.to_string())
//!     .collect();
//! let results = registry.parse_arguments(Some(tokens)).unwrap();
//! assert!(results["name"] && results["count"]);
//! assert_eq!(registry.get("name"), Value::Str("alice".into()));
//! assert_eq!(registry.get("count"), Value::Int(1));
//! ```

pub mod engine;
pub mod registry;
pub mod spec;
pub mod value;

pub use engine::{MatchError, match_spec};
pub use registry::{ArgRegistry, ParseError};
pub use spec::{ArgSpec, ArgType};
pub use value::Value;
