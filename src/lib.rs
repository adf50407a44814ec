//! # pmbga
//!
//! Probabilistic model-building genetic algorithms for bit-string problems.
//!
//! Instead of recombining parents with crossover, every generation learns a
//! probabilistic model of the selected parents and samples the next
//! children from it. Two model families are provided:
//!
//! - **Linkage model**: loci are grouped by greedy minimum-description-length
//!   merging and each group is sampled from its joint distribution
//! - **Bayesian network**: each locus gets a decision tree conditioned on
//!   other loci, grown by greedy Bayesian score splits under an acyclicity
//!   constraint
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pmbga::prelude::*;
//! use rand::SeedableRng;
//!
//! let mut rng = rand::rngs::StdRng::seed_from_u64(42);
//!
//! let result = PmbgaBuilder::new()
//!     .population_size(200)
//!     .genome_length(30)
//!     .bayesian(NetworkConfig::default().with_max_parents(4))
//!     .fitness(DeceptiveTrap::new(5, 6))
//!     .stop_at_optimum()
//!     .stop_after(500, 50)
//!     .build()?
//!     .run(&mut rng)?;
//! ```

pub mod algorithms;
pub mod diagnostics;
pub mod error;
pub mod fitness;
pub mod genome;
pub mod operators;
pub mod population;
pub mod termination;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::algorithms::prelude::*;
    pub use crate::diagnostics::prelude::*;
    pub use crate::error::*;
    pub use crate::fitness::prelude::*;
    pub use crate::genome::prelude::*;
    pub use crate::operators::prelude::*;
    pub use crate::population::prelude::*;
    pub use crate::termination::prelude::*;
}
