pub mod args;
pub mod binder;
pub mod registry;
pub mod signature;

pub use args::{Arguments, CallArgs};
pub use binder::{Binder, Bound, Scope};
pub use registry::{Callable, Registry};
pub use signature::{BindingRecord, BoundPath, Param, ParamBinding, Signature, SCOPE_MARKER};
