//! # procgen
//!
//! **Many task variations from one annotated template**
//!
//! A template is an AnimalAI arena configuration in YAML with `!Proc*` tags where
//! a value should vary. The engine counts how many variations a template describes,
//! enumerates them in a fixed order or samples them at random, and fills in values
//! that depend on other parts of the finished variation.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use procgen::{Engine, Mode, ProcgenResult, Template};
//!
//! fn main() -> ProcgenResult<()> {
//!     let engine = Engine::new(1234);
//!
//!     let document = engine.parse(r#"
//! !ArenaConfig
//! arenas:
//!   0: !Arena
//!     pass_mark: 0
//!     t: 250
//!     items:
//!     - !Item
//!       name: Wall
//!       colors: !ProcColor 3
//! "#, "example.yaml")?;
//!
//!     assert_eq!(engine.count(&document)?, 3);
//!
//!     let template = Template::split(&document)?;
//!     for variation in engine.generate(Mode::Exhaustive, &template, 10)? {
//!         let (node, meta) = variation?;
//!         println!("{:?}\n{}", meta.labels, procgen::codec::to_yaml(&node)?);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Tags
//!
//! ### Combinatorial
//! `!ProcList`, `!ProcListLabelled`, `!ProcColor`, `!ProcVector3Scaled`,
//! `!ProcRepeatChoice` and `!ProcRestrictCombinations` each multiply the number
//! of variations. Nested tags combine as a Cartesian product.
//!
//! ### Conditional
//! `!ProcIf` picks a value by looking at other values of the same variation,
//! addressed as `id.path.to.value`. `!ProcIfLabels` rules under `proc_meta` add
//! labels the same way.

pub mod codec;
pub mod deferred;
pub mod engine;
pub mod error;
pub mod expand;
pub mod handlers;
pub mod limits;
pub mod meta;
pub mod node;
pub mod resolver;
pub mod tags;
pub mod template;

pub use codec::{parse, read};
pub use engine::{Engine, Mode};
pub use error::ProcgenError;
pub use expand::{Variation, Variations};
pub use limits::GenerationLimits;
pub use meta::Metadata;
pub use node::Node;
pub use template::{Template, TemplateMeta};

/// Result type for procgen operations
pub type ProcgenResult<T> = Result<T, ProcgenError>;

#[cfg(test)]
mod tests;
