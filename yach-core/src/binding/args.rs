use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Error, Result};

/// Arguments passed explicitly when calling a bound callable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallArgs {
    positional: Vec<Value>,
    keyword: IndexMap<String, Value>,
}

impl CallArgs {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    #[must_use]
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.keyword.insert(name.into(), value.into());
        self
    }

    pub fn positional(&self) -> &[Value] {
        &self.positional
    }

    pub fn keyword(&self) -> &IndexMap<String, Value> {
        &self.keyword
    }

    pub(crate) fn into_parts(self) -> (Vec<Value>, IndexMap<String, Value>) {
        (self.positional, self.keyword)
    }
}

/// Fully resolved arguments handed to the registered callable, in parameter
/// declaration order. Parameters with no explicit value, no config value and
/// no default are simply absent.
#[derive(Debug, Clone, PartialEq)]
pub struct Arguments {
    callable: String,
    values: IndexMap<String, Value>,
}

impl Arguments {
    pub(crate) fn new(callable: String, values: IndexMap<String, Value>) -> Self {
        Self { callable, values }
    }

    pub fn callable(&self) -> &str {
        &self.callable
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Deserializes the named argument, failing with `MissingArgument` when
    /// nothing supplied it.
    pub fn required<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let value = self.get(name).ok_or_else(|| Error::MissingArgument {
            callable: self.callable.clone(),
            param: name.to_owned(),
        })?;
        self.decode(name, value)
    }

    pub fn optional<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        self.get(name)
            .map(|value| self.decode(name, value))
            .transpose()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    fn decode<T: DeserializeOwned>(&self, name: &str, value: &Value) -> Result<T> {
        serde_json::from_value(value.clone()).map_err(|source| Error::InvalidArgument {
            callable: self.callable.clone(),
            param: name.to_owned(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;
    use serde_json::json;

    use super::{Arguments, CallArgs};
    use crate::error::Error;

    fn arguments() -> Arguments {
        let mut values = IndexMap::new();
        values.insert("depth".to_owned(), json!(4));
        values.insert("name".to_owned(), json!("enc"));
        Arguments::new("Encoder".to_owned(), values)
    }

    #[test]
    fn typed_access() {
        let args = arguments();
        assert_eq!(args.required::<u32>("depth").expect("depth"), 4);
        assert_eq!(args.optional::<String>("name").expect("name"), Some("enc".to_owned()));
        assert_eq!(args.optional::<String>("missing").expect("absent"), None);
        assert_eq!(args.iter().map(|(k, _)| k).collect::<Vec<_>>(), vec!["depth", "name"]);
    }

    #[test]
    fn missing_and_mistyped_arguments_fail() {
        let args = arguments();

        let error = args.required::<u32>("width").expect_err("missing");
        assert!(matches!(
            error,
            Error::MissingArgument { ref callable, ref param } if callable == "Encoder" && param == "width"
        ));

        let error = args.required::<u32>("name").expect_err("not a number");
        assert!(matches!(error, Error::InvalidArgument { .. }));
        assert!(error.to_string().contains("argument 'name' of 'Encoder'"));
    }

    #[test]
    fn call_args_keep_order() {
        let args = CallArgs::new().arg(1).arg("x").kwarg("c", 3).kwarg("c", 4);
        assert_eq!(args.positional(), &[json!(1), json!("x")]);
        assert_eq!(args.keyword().get("c"), Some(&json!(4)));
    }
}
