//! The matching/extraction algorithm: one specification against one
//! trailing token slice.

use thiserror::Error;

use crate::spec::{ArgSpec, ArgType};
use crate::value::Value;

/// Per-argument failure raised by [`match_spec`].
///
/// These are soft failures: the registry records them as a `false`
/// entry in its result map and keeps parsing the remaining arguments.
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("required flag --{flag} is missing")]
    RequiredMissing { flag: String },

    #[error("--{flag} expects {expected} value(s), found {found}")]
    NotEnoughValues {
        flag: String,
        expected: usize,
        found: usize,
    },

    #[error("invalid {expected} value '{token}' for --{flag}")]
    Conversion {
        flag: String,
        expected: &'static str,
        token: String,
    },

    #[error("invalid choice '{value}' for --{flag} (allowed: {allowed})")]
    InvalidChoice {
        flag: String,
        value: Value,
        allowed: String,
    },
}

/// A token matches a flag when one or more leading dashes are followed
/// by exactly the flag name.
fn matches_flag(token: &str, flag: &str) -> bool {
    token.starts_with('-') && token.trim_start_matches('-') == flag
}

/// Locate `spec`'s flag in `tokens`, extract its value window, convert
/// and validate it, and store the result in the spec's value slot.
///
/// The first occurrence of the flag wins. On any failure the value slot
/// is left untouched; when the flag is absent and the argument is not
/// required, the slot is reset to the declared default.
pub fn match_spec(spec: &mut ArgSpec, tokens: &[String]) -> Result<(), MatchError> {
    let Some(ix) = tokens.iter().position(|t| matches_flag(t, &spec.flag)) else {
        if spec.required {
            return Err(MatchError::RequiredMissing {
                flag: spec.flag.clone(),
            });
        }
        spec.value = spec.default.clone();
        return Ok(());
    };

    if spec.arg_type.is_presence() {
        spec.value = Value::Bool(spec.arg_type == ArgType::StoreTrue);
        return Ok(());
    }

    let rest = &tokens[ix + 1..];
    let window = if spec.nargs >= 0 {
        let wanted = spec.nargs as usize;
        if rest.len() < wanted {
            return Err(MatchError::NotEnoughValues {
                flag: spec.flag.clone(),
                expected: wanted,
                found: rest.len(),
            });
        }
        &rest[..wanted]
    } else {
        // Greedy: stop at the next token that looks like a flag. A bare
        // negative number also terminates the window; that limitation
        // is part of the invocation contract.
        let end = rest
            .iter()
            .position(|t| t.starts_with('-'))
            .unwrap_or(rest.len());
        &rest[..end]
    };

    let mut converted = Vec::with_capacity(window.len());
    for token in window {
        converted.push(convert(token, spec.arg_type, &spec.flag)?);
    }

    if !spec.choices.is_empty() {
        for value in &converted {
            if !spec.choices.contains(value) {
                return Err(MatchError::InvalidChoice {
                    flag: spec.flag.clone(),
                    value: value.clone(),
                    allowed: spec
                        .choices
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join(", "),
                });
            }
        }
    }

    spec.value = if converted.len() == 1 {
        converted.remove(0)
    } else {
        Value::List(converted)
    };
    Ok(())
}

fn convert(token: &str, arg_type: ArgType, flag: &str) -> Result<Value, MatchError> {
    const TRUTHY: [&str; 4] = ["TRUE", "YES", "T", "Y"];

    let value = match arg_type {
        ArgType::Bool => Value::Bool(TRUTHY.iter().any(|t| token.eq_ignore_ascii_case(t))),
        ArgType::StoreTrue => Value::Bool(true),
        ArgType::StoreFalse => Value::Bool(false),
        ArgType::Str => Value::Str(token.to_string()),
        ArgType::Integer => {
            Value::Int(token.parse().map_err(|_| MatchError::Conversion {
                flag: flag.to_string(),
                expected: arg_type.label(),
                token: token.to_string(),
            })?)
        }
        ArgType::Numeric | ArgType::Double => {
            Value::Float(token.parse().map_err(|_| MatchError::Conversion {
                flag: flag.to_string(),
                expected: arg_type.label(),
                token: token.to_string(),
            })?)
        }
    };
    Ok(value)
}
