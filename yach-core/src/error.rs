use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("no such path: '{0}'")]
    NoSuchPath(String),

    #[error("no such key: '{0}'")]
    NoSuchKey(String),

    #[error("'{0}' is not a config node")]
    NotANode(String),

    #[error("attempted to modify frozen config node at '{0}'")]
    FrozenNode(String),

    #[error("invalid config path '{0}'")]
    InvalidPath(String),

    #[error("no registration named '{0}'")]
    UnknownRegistration(String),

    #[error("registration '{0}' was made with a different return type")]
    RegistrationTypeMismatch(String),

    #[error("'{callable}' is missing required argument '{param}'")]
    MissingArgument { callable: String, param: String },

    #[error("'{callable}' got an unexpected argument '{param}'")]
    UnexpectedArgument { callable: String, param: String },

    #[error("'{callable}' takes {expected} positional arguments but {given} were given")]
    TooManyArguments {
        callable: String,
        expected: usize,
        given: usize,
    },

    #[error("invalid value for argument '{param}' of '{callable}': {source}")]
    InvalidArgument {
        callable: String,
        param: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("registry error: {0}")]
    Registry(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}
