pub mod particle;
pub mod pso_scheduler;

use crate::api::config_dto::PsoConfigDto;
use crate::error::{Error, Result};

/// Parameters of the particle swarm search.
#[derive(Debug, Clone, PartialEq)]
pub struct PsoConfig {
    pub swarm_size: usize,
    pub max_iterations: usize,

    /// Weight of the previous velocity.
    pub inertia: f64,
    /// Pull towards the particle's own best mapping (c1).
    pub cognitive: f64,
    /// Pull towards the swarm's best mapping (c2).
    pub social: f64,

    /// Cadence of progress evaluations with the expensive evaluator. 0 disables them.
    pub report_interval: usize,
    pub seed: Option<u64>,
}

impl PsoConfig {
    pub fn validate(&self) -> Result<()> {
        if self.swarm_size == 0 {
            return Err(Error::InvalidConfiguration("swarm size must be at least 1".to_string()));
        }
        if ![self.inertia, self.cognitive, self.social].iter().all(|c| c.is_finite()) {
            return Err(Error::InvalidConfiguration("PSO coefficients must be finite".to_string()));
        }
        Ok(())
    }
}

impl Default for PsoConfig {
    fn default() -> Self {
        PsoConfig { swarm_size: 200, max_iterations: 100, inertia: 0.9, cognitive: 1.4, social: 1.1, report_interval: 20, seed: None }
    }
}

impl TryFrom<PsoConfigDto> for PsoConfig {
    type Error = Error;

    fn try_from(dto: PsoConfigDto) -> Result<Self> {
        let config = PsoConfig {
            swarm_size: dto.swarm_size,
            max_iterations: dto.max_iterations,
            inertia: dto.inertia,
            cognitive: dto.cognitive,
            social: dto.social,
            report_interval: dto.report_interval,
            seed: dto.seed,
        };
        config.validate()?;
        Ok(config)
    }
}
