use indexmap::map::Entry as Slot;
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::config::path::ConfigPath;
use crate::error::{Error, Result};

/// What a key holds: a leaf value or a nested scope.
///
/// Only `Entry::Node` is a scope. A JSON object stored through `Entry::Value`
/// stays an opaque leaf and can not be descended into by a dotted path.
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    Value(Value),
    Node(ConfigNode),
}

impl Entry {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(value) => Some(value),
            Self::Node(_) => None,
        }
    }

    pub fn as_node(&self) -> Option<&ConfigNode> {
        match self {
            Self::Node(node) => Some(node),
            Self::Value(_) => None,
        }
    }

    pub fn as_node_mut(&mut self) -> Option<&mut ConfigNode> {
        match self {
            Self::Node(node) => Some(node),
            Self::Value(_) => None,
        }
    }

    pub fn is_node(&self) -> bool {
        matches!(self, Self::Node(_))
    }

    /// Nodes become JSON objects, recursively.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Value(value) => value.clone(),
            Self::Node(node) => node.to_value(),
        }
    }

    /// Seeding conversion: JSON objects turn into nested nodes.
    fn from_seed(value: Value) -> Self {
        match value {
            Value::Object(map) => Self::Node(ConfigNode::from_map(map)),
            other => Self::Value(other),
        }
    }
}

impl From<Value> for Entry {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<ConfigNode> for Entry {
    fn from(node: ConfigNode) -> Self {
        Self::Node(node)
    }
}

macro_rules! entry_from_scalar {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Entry {
                fn from(value: $ty) -> Self {
                    Self::Value(Value::from(value))
                }
            }
        )*
    };
}

entry_from_scalar!(bool, i32, i64, u32, u64, f64, &str, String, Vec<Value>);

impl Serialize for Entry {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Value(value) => value.serialize(serializer),
            Self::Node(node) => node.serialize(serializer),
        }
    }
}

/// One level of the configuration tree.
///
/// Keys keep insertion order. The frozen flag lives beside the entries, never
/// among them.
#[derive(Debug, Clone, Default)]
pub struct ConfigNode {
    entries: IndexMap<String, Entry>,
    frozen: bool,
}

/// Structural equality over entries; key order and the frozen flag are ignored.
impl PartialEq for ConfigNode {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl ConfigNode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a tree from a JSON object; nested objects become nested nodes.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self::from_map(map)),
            Value::Null => Ok(Self::new()),
            other => Err(Error::Config(format!(
                "config root must be a mapping, found {}",
                value_kind(&other)
            ))),
        }
    }

    fn from_map(map: Map<String, Value>) -> Self {
        map.into_iter()
            .map(|(key, value)| (key, Entry::from_seed(value)))
            .collect()
    }

    pub fn to_value(&self) -> Value {
        Value::Object(
            self.entries
                .iter()
                .map(|(key, entry)| (key.clone(), entry.to_value()))
                .collect(),
        )
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Sets the flag here and on every nested node currently present.
    pub fn freeze(&mut self, frozen: bool) {
        self.frozen = frozen;
        for entry in self.entries.values_mut() {
            if let Entry::Node(node) = entry {
                node.freeze(frozen);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Entry)> {
        self.entries.iter().map(|(key, entry)| (key.as_str(), entry))
    }

    pub fn get(&self, path: &str) -> Result<&Entry> {
        self.get_path(&path.parse()?)
    }

    pub fn get_path(&self, path: &ConfigPath) -> Result<&Entry> {
        let (leaf, parents) = path.split_last();
        self.descend(parents)
            .and_then(|node| node.entries.get(leaf))
            .ok_or_else(|| Error::NoSuchPath(path.to_string()))
    }

    pub fn get_value(&self, path: &str) -> Result<&Value> {
        match self.get(path)? {
            Entry::Value(value) => Ok(value),
            Entry::Node(_) => Err(Error::Config(format!(
                "'{path}' holds a config node, not a value"
            ))),
        }
    }

    pub fn get_node(&self, path: &str) -> Result<&ConfigNode> {
        self.get(path)?
            .as_node()
            .ok_or_else(|| Error::NotANode(path.to_owned()))
    }

    /// Mutable access to a nested node. Writes through it still honour that
    /// node's own frozen flag.
    pub fn get_node_mut(&mut self, path: &str) -> Result<&mut ConfigNode> {
        let path: ConfigPath = path.parse()?;
        let mut node = self;
        for (depth, segment) in path.segments().iter().enumerate() {
            node = match node.entries.get_mut(segment) {
                Some(Entry::Node(child)) => child,
                Some(Entry::Value(_)) => return Err(Error::NotANode(path.prefix(depth + 1))),
                None => return Err(Error::NoSuchPath(path.prefix(depth + 1))),
            };
        }
        Ok(node)
    }

    pub fn get_as<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        Ok(serde_json::from_value(self.get(path)?.to_value())?)
    }

    /// Never fails; malformed paths are reported as absent.
    pub fn has(&self, path: &str) -> bool {
        path.parse::<ConfigPath>()
            .map(|path| self.has_path(&path))
            .unwrap_or(false)
    }

    pub fn has_path(&self, path: &ConfigPath) -> bool {
        self.get_path(path).is_ok()
    }

    pub fn set(&mut self, path: &str, value: impl Into<Entry>, auto_register: bool) -> Result<()> {
        self.set_path(&path.parse()?, value.into(), auto_register)
    }

    /// `set` with auto-registration of missing intermediate nodes.
    pub fn insert(&mut self, path: &str, value: impl Into<Entry>) -> Result<()> {
        self.set(path, value, true)
    }

    /// Intermediate nodes created by `auto_register` are kept even when the
    /// assignment itself fails further down.
    pub fn set_path(&mut self, path: &ConfigPath, value: Entry, auto_register: bool) -> Result<()> {
        let (leaf, parents) = path.split_last();
        let node = self.walk_mut(path, parents, auto_register)?;
        node.entries.insert(leaf.to_owned(), value);
        Ok(())
    }

    /// Creates the nodes along `path`. Existing intermediate nodes are kept;
    /// the final segment always becomes a fresh, empty node.
    pub fn register(&mut self, path: &str) -> Result<&mut ConfigNode> {
        let path: ConfigPath = path.parse()?;
        let (leaf, parents) = path.split_last();
        let node = self.walk_mut(&path, parents, true)?;
        node.entries.insert(leaf.to_owned(), Entry::Node(ConfigNode::new()));
        node.entries
            .get_mut(leaf)
            .and_then(Entry::as_node_mut)
            .ok_or_else(|| Error::NoSuchPath(path.to_string()))
    }

    /// Removes and returns the entry at `path`.
    pub fn delete(&mut self, path: &str) -> Result<Entry> {
        let path: ConfigPath = path.parse()?;
        let (leaf, parents) = path.split_last();
        let node = self
            .walk_mut(&path, parents, false)
            .map_err(|err| match err {
                Error::NoSuchPath(missing) => Error::NoSuchKey(missing),
                other => other,
            })?;
        node.entries
            .shift_remove(leaf)
            .ok_or_else(|| Error::NoSuchKey(path.to_string()))
    }

    /// Single-key read; the key is never split on dots.
    pub fn attr(&self, key: &str) -> Result<&Entry> {
        self.get_path(&ConfigPath::single(key)?)
    }

    /// Single-key write with the same freeze rules as `set`.
    pub fn set_attr(&mut self, key: &str, value: impl Into<Entry>) -> Result<()> {
        self.set_path(&ConfigPath::single(key)?, value.into(), false)
    }

    fn descend(&self, segments: &[String]) -> Option<&ConfigNode> {
        segments
            .iter()
            .try_fold(self, |node, segment| node.entries.get(segment)?.as_node())
    }

    /// Walks `segments` for a mutation, returning the node that will be
    /// modified. Every node on the way must be unfrozen.
    fn walk_mut(
        &mut self,
        path: &ConfigPath,
        segments: &[String],
        create: bool,
    ) -> Result<&mut ConfigNode> {
        let mut node = self;
        for (depth, segment) in segments.iter().enumerate() {
            if node.frozen {
                return Err(Error::FrozenNode(path.to_string()));
            }
            let entry = match node.entries.entry(segment.clone()) {
                Slot::Occupied(slot) => slot.into_mut(),
                Slot::Vacant(slot) if create => slot.insert(Entry::Node(ConfigNode::new())),
                Slot::Vacant(_) => return Err(Error::NoSuchPath(path.prefix(depth + 1))),
            };
            node = match entry {
                Entry::Node(child) => child,
                Entry::Value(_) => return Err(Error::NotANode(path.prefix(depth + 1))),
            };
        }
        if node.frozen {
            return Err(Error::FrozenNode(path.to_string()));
        }
        Ok(node)
    }
}

impl<K, E> FromIterator<(K, E)> for ConfigNode
where
    K: Into<String>,
    E: Into<Entry>,
{
    fn from_iter<I: IntoIterator<Item = (K, E)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(key, entry)| (key.into(), entry.into()))
                .collect(),
            frozen: false,
        }
    }
}

impl TryFrom<Value> for ConfigNode {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        Self::from_value(value)
    }
}

impl Serialize for ConfigNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, entry) in &self.entries {
            map.serialize_entry(key, entry)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ConfigNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let map = Map::<String, Value>::deserialize(deserializer)?;
        Ok(Self::from_map(map))
    }
}

pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}
