use std::fmt;

use crate::value::Value;

/// The declared type of an argument's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArgType {
    /// `TRUE`/`YES`/`T`/`Y` (case-insensitive) convert to `true`;
    /// anything else converts to `false`.
    Bool,
    /// Presence flag: the flag alone sets the value to `true` and no
    /// trailing tokens are consumed.
    StoreTrue,
    /// Presence flag setting the value to `false`.
    StoreFalse,
    /// Tokens pass through verbatim.
    #[default]
    Str,
    Numeric,
    Integer,
    Double,
}

impl ArgType {
    /// Whether the flag's presence alone determines the value.
    pub fn is_presence(self) -> bool {
        matches!(self, Self::StoreTrue | Self::StoreFalse)
    }

    pub(crate) fn label(self) -> &'static str {
        match self {
            Self::Bool => "boolean",
            Self::StoreTrue | Self::StoreFalse => "flag",
            Self::Str => "string",
            Self::Numeric => "numeric",
            Self::Integer => "integer",
            Self::Double => "double",
        }
    }
}

/// Post-processing hook applied when a value is retrieved, not when it
/// is parsed.
pub type Action = Box<dyn Fn(&ArgSpec) -> Value>;

/// One declared argument: its matching flag, expected type, arity,
/// constraints, and the slot its resolved value lands in.
///
/// Everything but the value slot is fixed at registration time; the
/// slot is overwritten by at most one engine call per parse.
pub struct ArgSpec {
    pub(crate) name: String,
    pub(crate) flag: String,
    pub(crate) arg_type: ArgType,
    pub(crate) nargs: i32,
    pub(crate) required: bool,
    pub(crate) choices: Vec<Value>,
    pub(crate) default: Value,
    pub(crate) value: Value,
    pub(crate) action: Option<Action>,
    pub(crate) help: String,
}

impl ArgSpec {
    /// Create a specification for `name`. The matching flag defaults to
    /// the name itself; arity defaults to one string token.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let flag = name.trim_start_matches('-').to_string();
        Self {
            name,
            flag,
            arg_type: ArgType::Str,
            nargs: 1,
            required: false,
            choices: Vec::new(),
            default: Value::None,
            value: Value::None,
            action: None,
            help: String::new(),
        }
    }

    /// Override the matching flag. Leading dashes are stripped; they
    /// are only added back when matching tokens or rendering usage.
    pub fn flag(mut self, flag: impl Into<String>) -> Self {
        self.flag = flag.into().trim_start_matches('-').to_string();
        self
    }

    pub fn arg_type(mut self, arg_type: ArgType) -> Self {
        self.arg_type = arg_type;
        self
    }

    /// Number of trailing tokens the flag consumes. Negative means
    /// greedy: consume until the next flag-like token or end of input.
    pub fn nargs(mut self, nargs: i32) -> Self {
        self.nargs = nargs;
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Restrict converted values to this set.
    pub fn choices<I, V>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.choices = choices.into_iter().map(Into::into).collect();
        self
    }

    /// Value used when the flag is absent. Also seeds the value slot.
    pub fn default(mut self, default: impl Into<Value>) -> Self {
        self.default = default.into();
        self.value = self.default.clone();
        self
    }

    /// Install a post-processing hook; [`ArgSpec::resolve`] returns its
    /// result instead of the raw stored value.
    pub fn action(mut self, action: impl Fn(&ArgSpec) -> Value + 'static) -> Self {
        self.action = Some(Box::new(action));
        self
    }

    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = help.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The raw stored value, untouched by any action hook.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// The post-processed value: the action hook's result when one is
    /// installed, otherwise a clone of the stored value.
    pub fn resolve(&self) -> Value {
        match &self.action {
            Some(action) => action(self),
            None => self.value.clone(),
        }
    }

    /// Short usage token for help output, e.g. `[--count <integer>]`.
    pub fn usage_fragment(&self) -> String {
        if self.arg_type.is_presence() {
            format!("[--{}]", self.flag)
        } else {
            format!("[--{} <{}>]", self.flag, self.arg_type.label())
        }
    }
}

impl fmt::Debug for ArgSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArgSpec")
            .field("name", &self.name)
            .field("flag", &self.flag)
            .field("arg_type", &self.arg_type)
            .field("nargs", &self.nargs)
            .field("required", &self.required)
            .field("choices", &self.choices)
            .field("default", &self.default)
            .field("value", &self.value)
            .field("action", &self.action.is_some())
            .field("help", &self.help)
            .finish()
    }
}
