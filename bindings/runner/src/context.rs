use gust_runner::prelude::UserValuesConstraint;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// HTTP specific agent context values.
#[derive(Debug, Default)]
pub struct HttpAgentContext {
    pub(crate) rng: Option<StdRng>,
}

impl UserValuesConstraint for HttpAgentContext {}

impl HttpAgentContext {
    /// Seed this agent's generator. Agents derive distinct streams from one run seed.
    pub(crate) fn seed(&mut self, seed: Option<u64>, agent_index: usize) {
        self.rng = Some(match seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(agent_index as u64)),
            None => StdRng::from_entropy(),
        });
    }

    pub(crate) fn rng(&mut self) -> &mut StdRng {
        self.rng.get_or_insert_with(StdRng::from_entropy)
    }
}
