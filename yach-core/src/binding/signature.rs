use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::path::ConfigPath;
use crate::error::{Error, Result};

/// Leading marker on a path override meaning "relative to the binder's scope".
pub const SCOPE_MARKER: char = '.';

/// Declared parameter of a configurable callable.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    name: String,
    path: Option<String>,
    default: Option<Value>,
}

impl Param {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: None,
            default: None,
        }
    }

    /// Reads the value from `path` instead of `<scope>.<name>`. A path starting
    /// with [`SCOPE_MARKER`] (`.optim.lr`) stays relative to whichever scope
    /// the callable is bound under.
    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Used when the bound path is absent from the tree.
    #[must_use]
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path_override(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }
}

/// Static description of a callable: its identifying name and parameters in
/// declaration (positional) order.
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    name: String,
    params: Vec<Param>,
}

impl Signature {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
        }
    }

    /// Names the signature after `T` without its module path or generics,
    /// e.g. `Encoder` for `my_app::models::Encoder<f32>`.
    pub fn of<T: ?Sized>() -> Self {
        Self::new(short_type_name::<T>())
    }

    #[must_use]
    pub fn param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    #[must_use]
    pub fn arg(self, name: impl Into<String>) -> Self {
        self.param(Param::new(name))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Config("configurable name cannot be empty".to_owned()));
        }

        let mut seen = HashSet::new();
        for param in &self.params {
            if !seen.insert(param.name()) {
                return Err(Error::Config(format!(
                    "duplicate parameter '{}' in '{}'",
                    param.name(),
                    self.name
                )));
            }
        }
        Ok(())
    }
}

fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// Where a parameter's value lives in the tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "path", rename_all = "snake_case")]
pub enum BoundPath {
    /// Fixed at registration time.
    Absolute(ConfigPath),
    /// Prefixed with the binder's scope at call time.
    Scoped(ConfigPath),
}

impl BoundPath {
    /// Parses a user-supplied override, honouring [`SCOPE_MARKER`].
    pub fn parse_override(raw: &str) -> Result<Self> {
        match raw.strip_prefix(SCOPE_MARKER) {
            Some(relative) => Ok(Self::Scoped(relative.parse()?)),
            None => Ok(Self::Absolute(raw.parse()?)),
        }
    }

    pub fn resolve(&self, scope: Option<&ConfigPath>) -> ConfigPath {
        match (self, scope) {
            (Self::Absolute(path), _) => path.clone(),
            (Self::Scoped(path), Some(scope)) => scope.join(path),
            (Self::Scoped(path), None) => path.clone(),
        }
    }
}

/// Per-parameter binding kept by the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamBinding {
    pub name: String,
    pub path: BoundPath,
    /// `None` when the callable declared no default.
    pub default: Option<Value>,
}

/// Everything recorded when a callable is registered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BindingRecord {
    pub name: String,
    /// Scope the default paths were derived from; `None` when they were
    /// recorded bare (root) or scope-relative (deferred).
    pub scope: Option<String>,
    pub params: Vec<ParamBinding>,
}

impl BindingRecord {
    pub fn param(&self, name: &str) -> Option<&ParamBinding> {
        self.params.iter().find(|param| param.name == name)
    }

    pub fn positional_order(&self) -> impl Iterator<Item = &str> {
        self.params.iter().map(|param| param.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::{BoundPath, Param, Signature};
    use crate::config::path::ConfigPath;

    #[allow(dead_code)]
    struct Encoder<T>(T);

    #[test]
    fn type_signatures_use_the_short_name() {
        assert_eq!(Signature::of::<Encoder<f32>>().name(), "Encoder");
        assert_eq!(Signature::of::<String>().name(), "String");
    }

    #[test]
    fn validate_rejects_duplicate_params() {
        let signature = Signature::new("f").arg("a").param(Param::new("a").default_value(1));
        let error = signature.validate().expect_err("duplicate");
        assert!(error.to_string().contains("duplicate parameter 'a'"));
        assert!(Signature::new(" ").validate().is_err());
    }

    #[test]
    fn scope_marker_defers_resolution() {
        let scope: ConfigPath = "model_1".parse().expect("scope");

        let scoped = BoundPath::parse_override(".optim.lr").expect("scoped");
        assert!(matches!(scoped, BoundPath::Scoped(_)));
        assert_eq!(scoped.resolve(Some(&scope)).to_string(), "model_1.optim.lr");
        assert_eq!(scoped.resolve(None).to_string(), "optim.lr");

        let absolute = BoundPath::parse_override("shared.lr").expect("absolute");
        assert_eq!(absolute.resolve(Some(&scope)).to_string(), "shared.lr");

        assert!(BoundPath::parse_override(".").is_err());
    }
}
