use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::literal::parse_literal;
use crate::config::node::{ConfigNode, Entry};
use crate::config::path::ConfigPath;
use crate::error::Result;

/// One `key=value` assignment taken from the command line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Override {
    pub key: ConfigPath,
    pub value: Value,
}

/// Ordered `key=value` assignments, applied on top of an existing tree.
///
/// Later assignments to the same key win because they are applied in order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    entries: Vec<Override>,
}

impl Overrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collects every argument of the form `key=value` whose key is a valid
    /// path. Anything else is skipped. Values go through
    /// [`parse_override_value`].
    pub fn parse<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut overrides = Self::new();
        for arg in args {
            let arg = arg.as_ref();
            let Some((key, raw)) = arg.split_once('=') else {
                tracing::debug!(arg, "skipping argument without '='");
                continue;
            };
            let Ok(key) = key.parse::<ConfigPath>() else {
                tracing::debug!(arg, "skipping argument with a malformed key");
                continue;
            };
            overrides.entries.push(Override {
                key,
                value: parse_override_value(raw),
            });
        }
        overrides
    }

    /// Process arguments after the program name.
    pub fn from_env() -> Self {
        Self::parse(std::env::args().skip(1))
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Result<Self> {
        self.entries.push(Override {
            key: key.parse()?,
            value: value.into(),
        });
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Override> {
        self.entries.iter()
    }

    /// Sets every key with auto-registration. Stops at the first tree error
    /// (a frozen node or a leaf in the way); assignments before it stay
    /// applied.
    pub fn apply(&self, config: &mut ConfigNode) -> Result<()> {
        for entry in &self.entries {
            tracing::debug!(key = %entry.key, value = %entry.value, "applying override");
            config.set_path(&entry.key, Entry::Value(entry.value.clone()), true)?;
        }
        Ok(())
    }
}

/// Literal if it parses as one, the raw text otherwise.
pub fn parse_override_value(raw: &str) -> Value {
    parse_literal(raw).unwrap_or_else(|_| Value::String(raw.to_owned()))
}

pub fn merge_args<I, S>(config: &mut ConfigNode, args: I) -> Result<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    Overrides::parse(args).apply(config)
}

pub fn merge_from_env_args(config: &mut ConfigNode) -> Result<()> {
    Overrides::from_env().apply(config)
}
