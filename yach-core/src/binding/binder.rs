use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;

use crate::binding::args::{Arguments, CallArgs};
use crate::binding::registry::{Callable, Registry};
use crate::binding::signature::{BindingRecord, BoundPath, Param, ParamBinding, Signature};
use crate::config::node::Entry;
use crate::config::path::ConfigPath;
use crate::error::{Error, Result};

/// Where a binder looks up parameter values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Scope {
    /// Under the callable's identifying name.
    #[default]
    Callable,
    /// Under an explicit dotted scope.
    Named(String),
    /// Bare parameter names at the root.
    Root,
    /// Register only: default paths stay scope-relative until a later bind
    /// picks the scope. Calling a wrapper made in this mode resolves them
    /// against the identifying name.
    Deferred,
}

impl Scope {
    pub fn named(scope: impl Into<String>) -> Self {
        Self::Named(scope.into())
    }

    fn resolve(&self, name: &str) -> Result<Option<ConfigPath>> {
        match self {
            Self::Callable | Self::Deferred => name.parse().map(Some),
            Self::Named(scope) => scope.parse().map(Some),
            Self::Root => Ok(None),
        }
    }
}

/// Registers callables against a [`Registry`] and wraps them so missing
/// arguments are filled from the configuration tree.
#[derive(Debug, Clone, Default)]
pub struct Binder {
    registry: Registry,
    scope: Scope,
}

impl Binder {
    pub fn new(registry: Registry, scope: Scope) -> Self {
        Self { registry, scope }
    }

    /// Binder over the process-wide registry.
    pub fn global(scope: Scope) -> Self {
        Self::new(crate::global().clone(), scope)
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Records `signature` and `callable` under the signature's name,
    /// replacing any earlier registration, and returns a wrapper bound to
    /// this binder's scope.
    pub fn register<R, F>(&self, signature: Signature, callable: F) -> Result<Bound<R>>
    where
        R: 'static,
        F: Fn(Arguments) -> Result<R> + Send + Sync + 'static,
    {
        signature.validate()?;
        let name = signature.name().to_owned();

        let scope = match self.scope {
            Scope::Root | Scope::Deferred => None,
            _ => self.scope.resolve(&name)?,
        };
        let params = signature
            .params()
            .iter()
            .map(|param| self.bind_param(param, scope.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        let record = BindingRecord {
            name,
            scope: scope.map(|scope| scope.to_string()),
            params,
        };
        let callable: Callable<R> = Arc::new(callable);
        self.registry.insert(record.clone(), Arc::clone(&callable))?;

        tracing::debug!(
            name = %record.name,
            scope = ?record.scope,
            params = record.params.len(),
            "registered configurable"
        );
        self.wrap(record, callable)
    }

    /// Re-binds an existing wrapper under this binder's scope. Only
    /// scope-relative paths move; absolute ones were fixed at registration.
    pub fn bind<R>(&self, bound: &Bound<R>) -> Result<Bound<R>> {
        tracing::debug!(name = %bound.name(), scope = ?self.scope, "binding configurable");
        self.wrap(bound.record().clone(), Arc::clone(&bound.callable))
    }

    pub fn bind_name<R: 'static>(&self, name: &str) -> Result<Bound<R>> {
        let (record, callable) = self.registry.lookup_callable::<R>(name)?;
        tracing::debug!(name, scope = ?self.scope, "binding configurable by name");
        self.wrap(record, callable)
    }

    /// Merges `key=value` arguments into the tree, then registers.
    pub fn cli_register<R, F, I, S>(
        &self,
        signature: Signature,
        callable: F,
        args: I,
    ) -> Result<Bound<R>>
    where
        R: 'static,
        F: Fn(Arguments) -> Result<R> + Send + Sync + 'static,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.registry.merge_args(args)?;
        self.register(signature, callable)
    }

    pub fn cli_bind<R, I, S>(&self, bound: &Bound<R>, args: I) -> Result<Bound<R>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.registry.merge_args(args)?;
        self.bind(bound)
    }

    pub fn cli_bind_name<R, I, S>(&self, name: &str, args: I) -> Result<Bound<R>>
    where
        R: 'static,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.registry.merge_args(args)?;
        self.bind_name(name)
    }

    /// [`Binder::cli_bind_name`] over the process arguments after the
    /// program name.
    pub fn cli_bind_name_from_env<R: 'static>(&self, name: &str) -> Result<Bound<R>> {
        self.registry.merge_env_args()?;
        self.bind_name(name)
    }

    fn bind_param(&self, param: &Param, scope: Option<&ConfigPath>) -> Result<ParamBinding> {
        let path = match param.path_override() {
            Some(raw) => BoundPath::parse_override(raw)?,
            None => {
                let key = ConfigPath::single(param.name())?;
                match (&self.scope, scope) {
                    (Scope::Deferred, _) => BoundPath::Scoped(key),
                    (_, Some(scope)) => BoundPath::Absolute(scope.join(&key)),
                    (_, None) => BoundPath::Absolute(key),
                }
            }
        };
        Ok(ParamBinding {
            name: param.name().to_owned(),
            path,
            default: param.default().cloned(),
        })
    }

    fn wrap<R>(&self, record: BindingRecord, callable: Callable<R>) -> Result<Bound<R>> {
        let scope = self.scope.resolve(&record.name)?;
        Ok(Bound {
            record: Arc::new(record),
            callable,
            scope,
            registry: self.registry.clone(),
        })
    }
}

/// A registered callable paired with the scope it reads its arguments from.
pub struct Bound<R> {
    record: Arc<BindingRecord>,
    callable: Callable<R>,
    scope: Option<ConfigPath>,
    registry: Registry,
}

impl<R> Bound<R> {
    pub fn name(&self) -> &str {
        &self.record.name
    }

    pub fn scope(&self) -> Option<&ConfigPath> {
        self.scope.as_ref()
    }

    pub fn record(&self) -> &BindingRecord {
        &self.record
    }

    /// Merges explicit arguments with values from the tree and recorded
    /// defaults, in parameter order. Explicit arguments always win.
    pub fn resolve_arguments(&self, args: CallArgs) -> Result<Arguments> {
        let record = &self.record;
        let (positional, mut keyword) = args.into_parts();

        if positional.len() > record.params.len() {
            return Err(Error::TooManyArguments {
                callable: record.name.clone(),
                expected: record.params.len(),
                given: positional.len(),
            });
        }

        let mut explicit: IndexMap<String, Value> = IndexMap::new();
        for (name, value) in record.positional_order().zip(positional) {
            keyword.shift_remove(name);
            explicit.insert(name.to_owned(), value);
        }
        if let Some(unknown) = keyword.keys().find(|key| record.param(key).is_none()) {
            return Err(Error::UnexpectedArgument {
                callable: record.name.clone(),
                param: unknown.clone(),
            });
        }
        explicit.extend(keyword);

        let values = self.registry.read(|root| {
            let mut values = IndexMap::with_capacity(record.params.len());
            for param in &record.params {
                if let Some(value) = explicit.shift_remove(&param.name) {
                    values.insert(param.name.clone(), value);
                    continue;
                }

                let path = param.path.resolve(self.scope.as_ref());
                let found = root.get_path(&path).ok().map(Entry::to_value);
                tracing::trace!(
                    callable = %record.name,
                    param = %param.name,
                    path = %path,
                    found = found.is_some(),
                    "resolving parameter"
                );
                if let Some(value) = found.or_else(|| param.default.clone()) {
                    values.insert(param.name.clone(), value);
                }
            }
            Ok(values)
        })?;

        Ok(Arguments::new(record.name.clone(), values))
    }

    pub fn call(&self, args: CallArgs) -> Result<R> {
        let arguments = self.resolve_arguments(args)?;
        (self.callable)(arguments)
    }

    /// Calls with every argument taken from the tree or defaults.
    pub fn call_default(&self) -> Result<R> {
        self.call(CallArgs::new())
    }
}

impl<R> Clone for Bound<R> {
    fn clone(&self) -> Self {
        Self {
            record: Arc::clone(&self.record),
            callable: Arc::clone(&self.callable),
            scope: self.scope.clone(),
            registry: self.registry.clone(),
        }
    }
}

impl<R> fmt::Debug for Bound<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bound")
            .field("record", &self.record)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}
