pub mod beta;
pub mod error;
pub mod euro;
pub mod pmf;
pub mod suite;

pub use beta::BetaDistribution;
pub use error::{BayesError, Result};
pub use pmf::{Cdf, Pmf};
pub use suite::{Likelihood, Suite};
