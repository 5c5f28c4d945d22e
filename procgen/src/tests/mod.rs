use crate::expand::Expander;
use crate::meta::Metadata;
use crate::node::Node;
use crate::ProcgenResult;

mod handlers;


// Codec tests
mod codec;


pub(crate) fn parse(text: &str) -> Node {
    crate::codec::parse(text, "test.yaml").unwrap()
}

pub(crate) fn iterate_all(node: &Node) -> Vec<(Node, Metadata)> {
    Expander::new(0)
        .iterate(node)
        .collect::<ProcgenResult<Vec<_>>>()
        .unwrap()
}

pub(crate) fn values(node: &Node) -> Vec<Node> {
    iterate_all(node).into_iter().map(|(value, _)| value).collect()
}
