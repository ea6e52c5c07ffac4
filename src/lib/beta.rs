use crate::error::{BayesError, Result, check_range};
use crate::pmf::{Cdf, Pmf, xlogy};
use log::debug;
use rand::Rng;
use rand::distributions::Distribution;
use serde::{Deserialize, Serialize};
use statrs::distribution::{Beta, Continuous, ContinuousCDF};

/// A Beta distribution used as the conjugate prior of a binomial likelihood.
///
/// Both shape parameters are strictly positive for the lifetime of the value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BetaParts")]
pub struct BetaDistribution {
    alpha: f64,
    beta: f64,
    label: Option<String>,
}

#[derive(Deserialize)]
struct BetaParts {
    alpha: f64,
    beta: f64,
    label: Option<String>,
}

impl TryFrom<BetaParts> for BetaDistribution {
    type Error = BayesError;

    fn try_from(parts: BetaParts) -> Result<Self> {
        let mut dist = Self::new(parts.alpha, parts.beta)?;
        dist.label = parts.label;
        Ok(dist)
    }
}

impl Default for BetaDistribution {
    /// The uniform prior, Beta(1, 1)
    fn default() -> Self {
        Self {
            alpha: 1.0,
            beta: 1.0,
            label: None,
        }
    }
}

impl BetaDistribution {
    pub fn new(alpha: f64, beta: f64) -> Result<Self> {
        Ok(Self {
            alpha: check_shape("alpha", alpha)?,
            beta: check_shape("beta", beta)?,
            label: None,
        })
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn beta(&self) -> f64 {
        self.beta
    }

    /// Update parameters with `successes` and `failures`.
    ///
    /// Counts may be fractional but must be finite and non-negative. Nothing is
    /// changed when either count is rejected.
    pub fn update(&mut self, successes: f64, failures: f64) -> Result<()> {
        let successes = check_count("successes", successes)?;
        let failures = check_count("failures", failures)?;
        self.alpha += successes;
        self.beta += failures;
        Ok(())
    }

    /// Compute mean of posterior
    pub fn mean(&self) -> f64 {
        self.alpha / (self.alpha + self.beta)
    }

    pub fn variance(&self) -> f64 {
        let numerator = self.alpha * self.beta;
        let denominator = (self.alpha + self.beta).powi(2) * (self.alpha + self.beta + 1.0);
        numerator / denominator
    }

    pub fn standard_deviation(&self) -> f64 {
        self.variance().sqrt()
    }

    /// Mode of the distribution.
    ///
    /// When a shape parameter is at most one the density peaks at a boundary,
    /// so the mode is 0 or 1. Returns `None` for the uniform Beta(1, 1) and for
    /// U-shaped densities that diverge at both ends.
    pub fn map(&self) -> Option<f64> {
        let (a, b) = (self.alpha, self.beta);
        match (a > 1.0, b > 1.0) {
            (true, true) => Some((a - 1.0) / (a + b - 2.0)),
            (false, true) => Some(0.0),
            (true, false) => Some(1.0),
            (false, false) if a < 1.0 && b == 1.0 => Some(0.0),
            (false, false) if a == 1.0 && b < 1.0 => Some(1.0),
            (false, false) => None,
        }
    }

    /// Unnormalized density `x^(alpha-1) * (1-x)^(beta-1)`.
    ///
    /// Only meaningful relative to other points of the same distribution; the
    /// Beta function constant is left out. Zero outside `[0, 1]`.
    pub fn eval_pdf(&self, x: f64) -> f64 {
        if !(0.0..=1.0).contains(&x) {
            return 0.0;
        }
        x.powf(self.alpha - 1.0) * (1.0 - x).powf(self.beta - 1.0)
    }

    /// Log of `eval_pdf`, with `0 * ln 0` taken as 0 at the boundaries
    pub fn log_eval_pdf(&self, x: f64) -> f64 {
        if !(0.0..=1.0).contains(&x) {
            return f64::NEG_INFINITY;
        }
        xlogy(self.alpha - 1.0, x) + xlogy(self.beta - 1.0, 1.0 - x)
    }

    /// Normalized density
    pub fn pdf(&self, x: f64) -> Result<f64> {
        if !(0.0..=1.0).contains(&x) {
            return Ok(0.0);
        }
        Ok(self.dist()?.pdf(x))
    }

    /// Regularized incomplete beta function at `x`
    pub fn cdf(&self, x: f64) -> Result<f64> {
        if x <= 0.0 {
            return Ok(0.0);
        }
        if x >= 1.0 {
            return Ok(1.0);
        }
        Ok(self.dist()?.cdf(x))
    }

    /// Discretize onto `steps` equally spaced points covering `[0, 1]`.
    ///
    /// Shape parameters below one make the density infinite at a boundary, so in
    /// that case the masses come from differencing the CDF instead of sampling
    /// the density.
    pub fn make_pmf(&self, steps: usize) -> Result<Pmf> {
        if self.alpha < 1.0 || self.beta < 1.0 {
            debug!(
                "Beta({}, {}) diverges at a boundary, discretizing from the CDF",
                self.alpha, self.beta
            );
            return self.make_cdf(steps)?.make_pmf();
        }
        // densities of large shapes underflow, so scale by the peak in log space
        let xs = grid(steps)?;
        let logs: Vec<f64> = xs.iter().map(|&x| self.log_eval_pdf(x)).collect();
        let max = logs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if max == f64::NEG_INFINITY {
            return Err(BayesError::ZeroEvidence);
        }
        let masses = logs.iter().map(|l| (l - max).exp()).collect();
        let mut pmf = Pmf::new(xs, masses)?;
        pmf.normalize()?;
        Ok(pmf)
    }

    /// Evaluate the CDF on `steps` equally spaced points covering `[0, 1]`
    pub fn make_cdf(&self, steps: usize) -> Result<Cdf> {
        let xs = grid(steps)?;
        let raw = xs.iter().map(|&x| self.cdf(x)).collect::<Result<Vec<f64>>>()?;
        // rounding in the continued fraction can step backwards by an ulp
        let probs = raw
            .iter()
            .scan(0.0_f64, |acc, &p| {
                *acc = acc.max(p.clamp(0.0, 1.0));
                Some(*acc)
            })
            .collect();
        Cdf::new(xs, probs)
    }

    /// Value below which `p` percent of the distribution lies
    pub fn percentile(&self, p: f64) -> Result<f64> {
        let q = check_range(p, 0.0, 100.0)? / 100.0;
        if q == 0.0 {
            return Ok(0.0);
        }
        if q == 1.0 {
            return Ok(1.0);
        }
        Ok(self.dist()?.inverse_cdf(q))
    }

    /// Percentiles for each of `ps`, in the same order
    pub fn percentiles(&self, ps: &[f64]) -> Result<Vec<f64>> {
        ps.iter().map(|&p| self.percentile(p)).collect()
    }

    pub fn credible_interval(&self, p: f64) -> Result<(f64, f64)> {
        let p = check_range(p, 0.0, 100.0)?;
        let tail = (100.0 - p) / 2.0;
        Ok((self.percentile(tail)?, self.percentile(100.0 - tail)?))
    }

    /// Draw a single variate
    pub fn random<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<f64> {
        Ok(self.dist()?.sample(rng))
    }

    /// Draw `n` independent variates
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R, n: usize) -> Result<Vec<f64>> {
        let dist = self.dist()?;
        Ok((0..n).map(|_| dist.sample(rng)).collect())
    }

    fn dist(&self) -> Result<Beta> {
        Beta::new(self.alpha, self.beta).map_err(|_| BayesError::InvalidParameter {
            name: "alpha, beta",
            value: self.alpha.min(self.beta),
            constraint: "shape parameters must be positive and finite",
        })
    }
}

fn check_shape(name: &'static str, value: f64) -> Result<f64> {
    if !value.is_finite() || value <= 0.0 {
        return Err(BayesError::InvalidParameter {
            name,
            value,
            constraint: "must be positive and finite",
        });
    }
    Ok(value)
}

fn check_count(name: &'static str, value: f64) -> Result<f64> {
    if !value.is_finite() || value < 0.0 {
        return Err(BayesError::InvalidParameter {
            name,
            value,
            constraint: "must be non-negative and finite",
        });
    }
    Ok(value)
}

fn grid(steps: usize) -> Result<Vec<f64>> {
    if steps < 2 {
        return Err(BayesError::InvalidParameter {
            name: "steps",
            value: steps as f64,
            constraint: "need at least two grid points",
        });
    }
    let last = (steps - 1) as f64;
    Ok((0..steps).map(|i| i as f64 / last).collect())
}
