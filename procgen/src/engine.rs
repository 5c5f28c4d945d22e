use crate::deferred::resolve_variation;
use crate::expand::{Expander, Variations};
use crate::node::Node;
use crate::template::Template;
use crate::{codec, GenerationLimits, ProcgenResult};
use std::path::Path;
use tracing::{debug, info};

/// How [`Engine::generate`] picks variations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Independent uniform draws; may repeat
    Sample,
    /// Every variation in order, up to the requested amount
    Exhaustive,
}

/// The variation engine.
///
/// Holds the seeded random generator, so two engines created with the same seed
/// produce the same variations from the same template.
pub struct Engine {
    expander: Expander,
    limits: GenerationLimits,
}

impl Default for Engine {
    fn default() -> Self {
        Self::with_limits(GenerationLimits::default())
    }
}

impl Engine {
    pub fn new(seed: u64) -> Self {
        Self::with_limits(GenerationLimits {
            seed,
            ..GenerationLimits::default()
        })
    }

    /// Create an engine with custom limits; the seed is taken from them
    pub fn with_limits(limits: GenerationLimits) -> Self {
        Self {
            expander: Expander::new(limits.seed),
            limits,
        }
    }

    pub fn limits(&self) -> &GenerationLimits {
        &self.limits
    }

    pub fn read(&self, path: &Path) -> ProcgenResult<Node> {
        codec::read(path)
    }

    pub fn parse(&self, text: &str, source_id: &str) -> ProcgenResult<Node> {
        codec::parse(text, source_id)
    }

    /// Number of variations the template describes
    pub fn count(&self, template: &Node) -> ProcgenResult<u128> {
        self.expander.count(template)
    }

    /// Where the count comes from, e.g. `6#ProcList x 5#ProcColor`
    pub fn explain(&self, template: &Node) -> ProcgenResult<String> {
        let explanation = self.expander.explain(template)?;
        if explanation.is_empty() {
            return Ok("No variations".to_string());
        }
        Ok(explanation)
    }

    /// Lazily produce `amount` finished variations of a split template.
    ///
    /// In exhaustive mode fewer are produced when the template has fewer. Every
    /// item has its conditionals resolved and label rules applied; a failing
    /// variation is reported as an error item.
    pub fn generate<'a>(
        &self,
        mode: Mode,
        template: &'a Template,
        amount: usize,
    ) -> ProcgenResult<Variations<'a>> {
        let raw: Variations<'a> = match mode {
            Mode::Sample => {
                info!(amount, "Sampling variations");
                let expander = self.expander.clone();
                Box::new((0..amount).map(move |_| expander.sample(&template.body)))
            }
            Mode::Exhaustive => {
                let total = self.count(&template.body)?;
                info!(amount, total = %total, "Generating variations");
                Box::new(self.expander.iterate(&template.body).take(amount))
            }
        };

        let rules = &template.meta.proc_labels;
        Ok(Box::new(raw.enumerate().map(move |(idx, variation)| {
            let (mut node, mut meta) = variation?;
            resolve_variation(&mut node, &mut meta, rules)?;
            debug!(index = idx, labels = ?meta.labels, "Generated variation");
            Ok((node, meta))
        })))
    }
}
