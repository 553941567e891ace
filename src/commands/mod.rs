//! Request handlers for host front ends.
//!
//! This module maps JSON requests onto the bridge surfaces:
//! - [`Request`]: one call, tagged by its `op`
//! - [`handle_request`]: runs a request against a [`crate::VisionBridge`]
//! - [`respond`]: wraps the result in the `ok`/`error` envelope

mod request;

pub use request::*;
