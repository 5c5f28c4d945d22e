//! YAML reading and writing
//!
//! Templates are parsed with `serde_yaml` into its tagged [`serde_yaml::Value`] form
//! and converted to [`crate::node::Node`], which is where tags are validated.
//! Output goes through a small block-style emitter that knows the AnimalAI layout:
//! records in declared field order, flow style for vectors, colors and short lists.

mod read;
mod write;

pub use read::{parse, read};
pub use write::{to_flow, to_yaml};
