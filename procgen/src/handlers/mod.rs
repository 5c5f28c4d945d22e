//! Node handler registry
//!
//! Every node variant is bound to exactly one [`NodeHandler`]. Dispatch walks
//! [`HANDLERS`] in order and takes the first handler whose predicate accepts the
//! node, so tagged types are listed before the plain containers.

mod conditional;
mod plain;
mod proc;
mod record;

pub use conditional::{PendingHandler, ProcIfHandler, ProcIfLabelsHandler};
pub use plain::{PlainMapping, PlainScalar, PlainSequence};
pub use proc::{
    ProcColorHandler, ProcListHandler, ProcListLabelledHandler, ProcRepeatChoiceHandler,
    ProcRestrictCombinationsHandler, ProcVector3ScaledHandler,
};
pub use record::{RangeHandler, RecordHandler, TaggedScalarHandler};

use crate::expand::{Expander, Variation, Variations};
use crate::node::Node;
use crate::{ProcgenError, ProcgenResult};

/// How a handler contributes to the variation count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerKind {
    /// Containers and leaves; count is the product of the children's counts
    Static,
    /// Multiplies the number of variations
    Combinatorial,
    /// Filled in after expansion; never adds variations
    Conditional,
    /// Only found in expanded variations
    Placeholder,
}

/// Expansion semantics of one node variant
pub trait NodeHandler: Sync {
    /// Name used in count explanations
    fn name(&self) -> &'static str;

    fn can_handle(&self, node: &Node) -> bool;

    fn kind(&self) -> HandlerKind;

    fn count(&self, node: &Node, expander: &Expander) -> ProcgenResult<u128>;

    fn iterate<'a>(&self, node: &'a Node, expander: &Expander) -> Variations<'a>;

    fn sample(&self, node: &Node, expander: &Expander) -> ProcgenResult<Variation>;

    /// Ordered sub-nodes, including count-bearing fields such as `amount`
    fn children<'a>(&self, node: &'a Node) -> Vec<&'a Node>;
}

/// Dispatch order matters: specific tags first, plain containers last
pub static HANDLERS: &[&dyn NodeHandler] = &[
    &ProcListHandler,
    &ProcListLabelledHandler,
    &ProcColorHandler,
    &ProcVector3ScaledHandler,
    &ProcRepeatChoiceHandler,
    &ProcRestrictCombinationsHandler,
    &ProcIfHandler,
    &ProcIfLabelsHandler,
    &PendingHandler,
    &RecordHandler,
    &RangeHandler,
    &TaggedScalarHandler,
    &PlainSequence,
    &PlainMapping,
    &PlainScalar,
];

/// Find the handler responsible for `node`
pub fn handler_for(node: &Node) -> ProcgenResult<&'static dyn NodeHandler> {
    HANDLERS
        .iter()
        .copied()
        .find(|handler| handler.can_handle(node))
        .ok_or_else(|| {
            ProcgenError::internal(format!("Could not find a node handler for {}", node.describe()))
        })
}

/// Error for a handler called with a node it does not handle
pub(crate) fn mismatch(handler: &dyn NodeHandler, node: &Node) -> ProcgenError {
    ProcgenError::internal(format!(
        "Handler {} was called with {}",
        handler.name(),
        node.describe()
    ))
}
