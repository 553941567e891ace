// Module declarations in dependency order
pub mod utils;
pub mod processing;
pub mod store;
pub mod core;
pub mod dispatch;
pub mod bridge;
pub mod commands;
pub mod worker;

// Public exports for external consumers
pub use bridge::VisionBridge;
pub use self::core::{BridgeConfig, BufferType, ObjectSpec, Outcome, WrappedValue};
pub use dispatch::{Arg, Verb};
pub use store::{Handle, ObjectKind, ObjectStore};
pub use utils::{BridgeError, BridgeResult};
pub use worker::WorkerPool;
