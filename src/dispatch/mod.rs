//! Name-based dispatch of image operations.
//!
//! A verb name is resolved through [`Verb::resolve`], its loosely typed
//! arguments are validated into a [`Call`], and [`engine::execute`] runs it
//! against the object store.

pub mod args;
pub mod call;
pub mod engine;
pub mod verb;

pub use args::{Arg, Args};
pub use call::Call;
pub use engine::{execute, invoke};
pub use verb::{fnv1a, Verb};
