use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::binding::args::Arguments;
use crate::binding::signature::BindingRecord;
use crate::config::node::{ConfigNode, Entry};
use crate::config::overrides::{merge_from_env_args, Overrides};
use crate::error::{Error, Result};

/// A registered callable, after argument resolution.
pub type Callable<R> = Arc<dyn Fn(Arguments) -> Result<R> + Send + Sync>;

/// Owns a configuration root together with the binding records and the
/// original callables registered against it.
///
/// Records and callables are kept apart from the tree, so they never show up
/// in dumps or path lookups. Clones share the same state.
#[derive(Clone, Default)]
pub struct Registry {
    inner: Arc<RwLock<RegistryState>>,
}

#[derive(Default)]
struct RegistryState {
    root: ConfigNode,
    records: HashMap<String, BindingRecord>,
    callables: HashMap<String, Box<dyn Any + Send + Sync>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root(root: ConfigNode) -> Self {
        Self {
            inner: Arc::new(RwLock::new(RegistryState {
                root,
                ..RegistryState::default()
            })),
        }
    }

    /// Runs `f` against the configuration root. `f` must not call back into
    /// this registry.
    pub fn read<T>(&self, f: impl FnOnce(&ConfigNode) -> Result<T>) -> Result<T> {
        f(&self.state()?.root)
    }

    /// Mutable counterpart of [`Registry::read`].
    pub fn write<T>(&self, f: impl FnOnce(&mut ConfigNode) -> Result<T>) -> Result<T> {
        f(&mut self.state_mut()?.root)
    }

    /// Deep copy of the current tree.
    pub fn snapshot(&self) -> Result<ConfigNode> {
        self.read(|root| Ok(root.clone()))
    }

    /// Swaps in a new tree and returns the previous one. Registrations stay.
    pub fn replace_root(&self, root: ConfigNode) -> Result<ConfigNode> {
        self.write(|current| Ok(std::mem::replace(current, root)))
    }

    pub fn get(&self, path: &str) -> Result<Entry> {
        self.read(|root| root.get(path).cloned())
    }

    /// `set` with auto-registration.
    pub fn set(&self, path: &str, value: impl Into<Entry>) -> Result<()> {
        self.write(|root| root.set(path, value, true))
    }

    pub fn merge_args<I, S>(&self, args: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let overrides = Overrides::parse(args);
        self.write(|root| overrides.apply(root))
    }

    /// [`Registry::merge_args`] over the process arguments after the program
    /// name.
    pub fn merge_env_args(&self) -> Result<()> {
        self.write(merge_from_env_args)
    }

    pub fn record(&self, name: &str) -> Result<Option<BindingRecord>> {
        Ok(self.state()?.records.get(name).cloned())
    }

    pub fn is_registered(&self, name: &str) -> Result<bool> {
        Ok(self.state()?.records.contains_key(name))
    }

    pub fn registered_names(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.state()?.records.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    /// Last registration under a name wins.
    pub(crate) fn insert<R: 'static>(&self, record: BindingRecord, callable: Callable<R>) -> Result<()> {
        let mut state = self.state_mut()?;
        state.callables.insert(record.name.clone(), Box::new(callable));
        state.records.insert(record.name.clone(), record);
        Ok(())
    }

    pub(crate) fn lookup_callable<R: 'static>(&self, name: &str) -> Result<(BindingRecord, Callable<R>)> {
        let state = self.state()?;
        let record = state
            .records
            .get(name)
            .ok_or_else(|| Error::UnknownRegistration(name.to_owned()))?;
        let callable = state
            .callables
            .get(name)
            .ok_or_else(|| Error::UnknownRegistration(name.to_owned()))?
            .downcast_ref::<Callable<R>>()
            .ok_or_else(|| Error::RegistrationTypeMismatch(name.to_owned()))?;
        Ok((record.clone(), Arc::clone(callable)))
    }

    fn state(&self) -> Result<RwLockReadGuard<'_, RegistryState>> {
        self.inner
            .read()
            .map_err(|_| Error::Registry("binding registry lock poisoned".to_owned()))
    }

    fn state_mut(&self) -> Result<RwLockWriteGuard<'_, RegistryState>> {
        self.inner
            .write()
            .map_err(|_| Error::Registry("binding registry lock poisoned".to_owned()))
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("Registry");
        match self.state() {
            Ok(state) => {
                let mut names: Vec<&String> = state.records.keys().collect();
                names.sort();
                debug.field("root", &state.root).field("registered", &names)
            }
            Err(_) => debug.field("state", &"<poisoned>"),
        };
        debug.finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::{Callable, Registry};
    use crate::binding::args::Arguments;
    use crate::binding::signature::BindingRecord;
    use crate::config::node::ConfigNode;
    use crate::error::Error;

    fn record(name: &str) -> BindingRecord {
        BindingRecord {
            name: name.to_owned(),
            scope: Some(name.to_owned()),
            params: Vec::new(),
        }
    }

    #[test]
    fn clones_share_the_tree() {
        let registry = Registry::new();
        let other = registry.clone();

        registry.set("model.depth", 3).expect("set");
        assert_eq!(other.get("model.depth").expect("get").to_value(), json!(3));

        let previous = other
            .replace_root(ConfigNode::from_iter([("fresh", true)]))
            .expect("replace");
        assert!(previous.has("model.depth"));
        assert!(!registry.snapshot().expect("snapshot").has("model"));
    }

    #[test]
    fn snapshots_are_detached() {
        let registry = Registry::new();
        registry.set("a", 1).expect("set");

        let mut snapshot = registry.snapshot().expect("snapshot");
        snapshot.set("a", 2, false).expect("set on snapshot");
        assert_eq!(registry.get("a").expect("get").to_value(), json!(1));
    }

    #[test]
    fn merge_args_goes_through_the_tree() {
        let registry = Registry::new();
        registry.merge_args(["x=1", "y.z=[1, 2]"]).expect("merge");
        assert_eq!(registry.get("y.z").expect("get").to_value(), json!([1, 2]));
    }

    #[test]
    fn callables_are_looked_up_by_name_and_type() {
        let registry = Registry::new();
        let callable: Callable<i64> = Arc::new(|_| Ok(7));
        registry.insert(record("seven"), callable).expect("insert");

        assert!(registry.is_registered("seven").expect("registered"));
        assert_eq!(registry.registered_names().expect("names"), vec!["seven".to_owned()]);

        let (found, callable) = registry.lookup_callable::<i64>("seven").expect("lookup");
        assert_eq!(found.name, "seven");
        let arguments = Arguments::new(found.name, Default::default());
        assert_eq!(callable(arguments).expect("call"), 7);

        assert!(matches!(
            registry.lookup_callable::<String>("seven"),
            Err(Error::RegistrationTypeMismatch(_))
        ));
        assert!(matches!(
            registry.lookup_callable::<i64>("missing"),
            Err(Error::UnknownRegistration(_))
        ));
    }

    #[test]
    fn records_stay_out_of_the_tree() {
        let registry = Registry::new();
        let callable: Callable<()> = Arc::new(|_| Ok(()));
        registry.insert(record("hidden"), callable).expect("insert");

        let root = registry.snapshot().expect("snapshot");
        assert!(root.is_empty());
        assert_eq!(root.pprint(None), "");
        assert!(format!("{registry:?}").contains("hidden"));
    }
}
