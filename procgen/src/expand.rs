//! Recursive expansion
//!
//! [`Expander`] is the recursion point every handler calls back into: it looks up
//! the handler for a child node and forwards count / iterate / sample to it. It
//! also owns the random generator, so all sampling in one run draws from one
//! seeded stream in a fixed order.
//!
//! [`Product`] composes per-child iterators into their Cartesian product, last
//! child varying fastest, without ever holding more than one combination.

use crate::handlers::{handler_for, HandlerKind};
use crate::meta::Metadata;
use crate::node::Node;
use crate::{ProcgenError, ProcgenResult};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cell::RefCell;
use std::rc::Rc;

/// One produced value together with the labels collected while producing it
pub type Variation = (Node, Metadata);

/// Lazy, finite stream of variations borrowing from the template
pub type Variations<'a> = Box<dyn Iterator<Item = ProcgenResult<Variation>> + 'a>;

/// A stream that fails immediately
pub fn failed<'a>(error: ProcgenError) -> Variations<'a> {
    Box::new(std::iter::once(Err(error)))
}

/// A stream with exactly one item
pub fn single<'a>(variation: Variation) -> Variations<'a> {
    Box::new(std::iter::once(Ok(variation)))
}

/// Shared entry point for the recursive count / iterate / sample operations
#[derive(Clone)]
pub struct Expander {
    rng: Rc<RefCell<StdRng>>,
}

impl Expander {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Rc::new(RefCell::new(StdRng::seed_from_u64(seed))),
        }
    }

    /// Number of distinct variations `node` can produce
    pub fn count(&self, node: &Node) -> ProcgenResult<u128> {
        handler_for(node)?.count(node, self)
    }

    /// Every variation of `node`, in order
    pub fn iterate<'a>(&self, node: &'a Node) -> Variations<'a> {
        match handler_for(node) {
            Ok(handler) => handler.iterate(node, self),
            Err(e) => failed(e),
        }
    }

    /// One uniformly drawn variation of `node`
    pub fn sample(&self, node: &Node) -> ProcgenResult<Variation> {
        handler_for(node)?.sample(node, self)
    }

    /// Product of the children's counts (1 for no children)
    pub fn count_product(&self, children: &[&Node]) -> ProcgenResult<u128> {
        children.iter().try_fold(1u128, |acc, child| {
            Ok(acc.saturating_mul(self.count(child)?))
        })
    }

    /// Sample every child in order
    pub fn sample_all(&self, children: &[&Node]) -> ProcgenResult<(Vec<Node>, Metadata)> {
        let sampled = children
            .iter()
            .map(|child| self.sample(child))
            .collect::<ProcgenResult<Vec<_>>>()?;
        Ok(split(sampled))
    }

    /// Uniform index in `0..len`. `len` must be positive.
    pub fn choose_index(&self, len: usize) -> usize {
        self.rng.borrow_mut().gen_range(0..len)
    }

    /// Human-readable breakdown of the count, e.g. `6#ProcList x 5#ProcColor`
    pub fn explain(&self, node: &Node) -> ProcgenResult<String> {
        let handler = handler_for(node)?;
        match handler.kind() {
            HandlerKind::Static => {
                let parts = handler
                    .children(node)
                    .into_iter()
                    .map(|child| self.explain(child))
                    .collect::<ProcgenResult<Vec<_>>>()?;
                Ok(parts
                    .into_iter()
                    .filter(|part| !part.is_empty())
                    .collect::<Vec<_>>()
                    .join(" x "))
            }
            HandlerKind::Conditional => Ok(String::new()),
            HandlerKind::Combinatorial => {
                Ok(format!("{}#{}", handler.count(node, self)?, handler.name()))
            }
            HandlerKind::Placeholder => Err(ProcgenError::internal(
                "Cannot explain the count of an already expanded variation.",
            )),
        }
    }
}

/// Separate values from their metadata, concatenating labels in child order
pub fn split(variations: Vec<Variation>) -> (Vec<Node>, Metadata) {
    let mut values = Vec::with_capacity(variations.len());
    let mut meta = Metadata::new();
    for (value, child_meta) in variations {
        values.push(value);
        meta.extend(child_meta);
    }
    (values, meta)
}

enum ProductState {
    Fresh,
    Running,
    Done,
}

/// Lazy Cartesian product of the variations of several nodes.
///
/// A child's iterator is recreated every time a child before it advances, so a
/// child that samples on iteration (`!ProcRestrictCombinations`) draws again.
pub struct Product<'a> {
    expander: Expander,
    children: Vec<&'a Node>,
    iters: Vec<Variations<'a>>,
    current: Vec<Variation>,
    state: ProductState,
}

impl<'a> Product<'a> {
    pub fn new(expander: &Expander, children: Vec<&'a Node>) -> Self {
        Self {
            expander: expander.clone(),
            iters: Vec::with_capacity(children.len()),
            current: Vec::with_capacity(children.len()),
            children,
            state: ProductState::Fresh,
        }
    }

    /// Restart the iterators of every child from `start` onwards
    fn fill_from(&mut self, start: usize) -> Option<ProcgenResult<Vec<Variation>>> {
        self.iters.truncate(start);
        self.current.truncate(start);
        for idx in start..self.children.len() {
            let mut iter = self.expander.iterate(self.children[idx]);
            match iter.next() {
                Some(Ok(first)) => {
                    self.current.push(first);
                    self.iters.push(iter);
                }
                Some(Err(e)) => {
                    self.state = ProductState::Done;
                    return Some(Err(e));
                }
                None => {
                    self.state = ProductState::Done;
                    return None;
                }
            }
        }
        Some(Ok(self.current.clone()))
    }
}

impl Iterator for Product<'_> {
    type Item = ProcgenResult<Vec<Variation>>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.state {
            ProductState::Done => None,
            ProductState::Fresh => {
                self.state = ProductState::Running;
                self.fill_from(0)
            }
            ProductState::Running => {
                let mut idx = self.iters.len();
                while idx > 0 {
                    idx -= 1;
                    match self.iters[idx].next() {
                        Some(Ok(variation)) => {
                            self.current[idx] = variation;
                            return self.fill_from(idx + 1);
                        }
                        Some(Err(e)) => {
                            self.state = ProductState::Done;
                            return Some(Err(e));
                        }
                        None => {}
                    }
                }
                self.state = ProductState::Done;
                None
            }
        }
    }
}

/// Iterate the product of `children` and rebuild each combination with `build`
pub fn product_map<'a, F>(expander: &Expander, children: Vec<&'a Node>, build: F) -> Variations<'a>
where
    F: Fn(Vec<Node>) -> Node + 'a,
{
    Box::new(
        Product::new(expander, children).map(move |combination| {
            let (values, meta) = split(combination?);
            Ok((build(values), meta))
        }),
    )
}
