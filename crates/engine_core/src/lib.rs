// crates/engine_core/src/lib.rs

// Logic Modules
pub mod engine;
pub mod input;
pub mod resource;

// Shared plumbing
pub mod config;
pub mod error;
pub mod events;

// Re-export the entry points so hosts can find them easily
pub use config::EngineConfig;
pub use engine::{Engine, ModuleId};
pub use error::{ConfigError, EngineError, InputError, ResourceError};
pub use input::{DeviceSnapshot, DeviceState, InputPoller, InputSystem};
pub use resource::{ResourceHandle, ResourceManager};
