pub mod literal;
pub mod loader;
pub mod node;
pub mod overrides;
pub mod path;
pub mod render;

pub use literal::{parse_literal, LiteralError};
pub use loader::{load_from_file, load_from_str, Format};
pub use node::{ConfigNode, Entry};
pub use overrides::{merge_args, merge_from_env_args, parse_override_value, Override, Overrides};
pub use path::{ConfigPath, PATH_SEPARATOR};
pub use render::{render_leaf, DEFAULT_SKIP_PREFIX};
