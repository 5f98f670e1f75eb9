// crates/engine_core/src/error.rs
use std::io;

use thiserror::Error;

use crate::engine::ModuleId;
use crate::resource::ResourceHandle;

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("invalid resource group name")]
    InvalidGroup,

    #[error("storage <{storage}> not found in resource group <{group}>")]
    StorageNotFound { group: String, storage: String },

    #[error("invalid resource type: {0}")]
    InvalidType(String),

    #[error("resource type tag <{0}> is already used by a registered type")]
    DuplicateType(String),

    #[error("resource <{name}> not found in group <{group}>")]
    NotFound { group: String, name: String },

    #[error("can't open resource <{0}>: unknown resource type")]
    UnknownType(String),

    #[error("can't open resource <{location}>: {source}")]
    Open {
        location: String,
        #[source]
        source: io::Error,
    },

    #[error("invalid resource handle {0:?}")]
    InvalidHandle(ResourceHandle),

    #[error("resource type <{0}> has no write support")]
    WriteUnsupported(String),

    #[error("resource worker is not running")]
    WorkerStopped,

    #[error("resource lock poisoned")]
    Poisoned,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Error)]
pub enum InputError {
    #[error("no input set is selected")]
    NoCurrentSet,

    #[error("invalid input set name")]
    InvalidSetName,

    #[error("invalid input name")]
    InvalidInputName,

    #[error("input <{0}> not found in the current set")]
    UnknownInput(String),

    #[error("input set <{0}> not found")]
    UnknownSet(String),

    #[error("binding index {0} out of range")]
    BindingIndexOutOfRange(usize),

    #[error("invalid binding")]
    InvalidBinding,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Resource(#[from] ResourceError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("config serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("config is not valid UTF-8")]
    Encoding,
}

/// Failure while bringing engine modules up.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("resource module: {0}")]
    Resource(#[from] ResourceError),

    #[error("input module: {0}")]
    Input(#[from] InputError),

    #[error("config: {0}")]
    Config(#[from] ConfigError),

    #[error("module {0:?} was never started")]
    NotStarted(ModuleId),
}

pub type ResourceResult<T> = Result<T, ResourceError>;
pub type InputResult<T> = Result<T, InputError>;
