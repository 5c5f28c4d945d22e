/// Defaults and caps for one generation run
///
/// Exhaustive generation refuses templates whose variation count exceeds
/// `max_variations` unless the caller explicitly asks for only the first few.
#[derive(Debug, Clone)]
pub struct GenerationLimits {
    /// Largest variation space `gen` will enumerate in full
    pub max_variations: u128,

    /// Number of variations `sample` draws when none is given
    pub sample_amount: usize,

    /// Seed for the random generator, so runs are reproducible by default
    pub seed: u64,
}

impl Default for GenerationLimits {
    fn default() -> Self {
        Self {
            max_variations: 10_000,
            sample_amount: 100,
            seed: 1234,
        }
    }
}

impl GenerationLimits {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether exhaustively generating `count` variations stays within the cap
    pub fn allows(&self, count: u128) -> bool {
        count <= self.max_variations
    }
}
