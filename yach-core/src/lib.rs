pub mod binding;
pub mod config;
pub mod error;
pub mod logging;

use std::sync::OnceLock;

pub use binding::{Arguments, Binder, Bound, CallArgs, Param, Registry, Scope, Signature};
pub use config::{ConfigNode, ConfigPath, Entry};
pub use error::{Error, Result};

static GLOBAL: OnceLock<Registry> = OnceLock::new();

/// Process-wide registry shared by every [`Binder::global`].
pub fn global() -> &'static Registry {
    GLOBAL.get_or_init(Registry::new)
}

#[cfg(test)]
mod tests {
    use super::{global, Binder, Scope, Signature};

    #[test]
    fn global_binders_share_one_registry() {
        Binder::global(Scope::Root)
            .register(Signature::new("lib_global_probe"), |_| Ok(()))
            .expect("register");
        assert!(global().is_registered("lib_global_probe").expect("lookup"));
        assert!(Binder::global(Scope::Callable)
            .bind_name::<()>("lib_global_probe")
            .is_ok());
    }
}
