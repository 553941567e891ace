//! Core bridge types and configuration.
//!
//! - [`BridgeConfig`]: worker count, store limit and log filter
//! - [`WrappedValue`]: host-side reference to a stored value
//! - [`Outcome`]: result of a dispatched verb
//! - [`ObjectSpec`], [`MatBuffer`], [`MatData`]: payloads of the non-verb surfaces

mod config;
mod types;

pub use config::BridgeConfig;
pub use types::{BufferData, BufferType, MatBuffer, MatData, ObjectSpec, Outcome, WrappedValue};
