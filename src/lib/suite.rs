use crate::error::{BayesError, Result};
use crate::pmf::{Cdf, Pmf, check_weight};
use log::{debug, warn};

/// Probability of an observation given a hypothesis.
///
/// Implemented for any `Fn(&D, f64) -> f64`, so a plain function or closure can
/// be passed wherever a `Likelihood` is expected. The observation type is up to
/// the caller: a single trial or an aggregated summary both work.
pub trait Likelihood<D: ?Sized> {
    fn likelihood(&self, data: &D, hypothesis: f64) -> f64;
}

impl<D: ?Sized, F> Likelihood<D> for F
where
    F: Fn(&D, f64) -> f64,
{
    fn likelihood(&self, data: &D, hypothesis: f64) -> f64 {
        self(data, hypothesis)
    }
}

/// Discrete distribution over a finite, ordered set of hypotheses, updated
/// in place with Bayes' rule.
///
/// Updates are all-or-nothing. If an observation rules out every hypothesis,
/// or the likelihood returns a negative or non-finite value, the prior masses
/// are kept and an error is returned.
#[derive(Clone, Debug, PartialEq)]
pub struct Suite {
    pmf: Pmf,
}

impl Suite {
    /// Create a suite with equal prior mass on every hypothesis
    pub fn uniform(hypotheses: Vec<f64>) -> Result<Self> {
        Ok(Self {
            pmf: Pmf::uniform(hypotheses)?,
        })
    }

    /// Create a suite with explicit prior weights, normalized on construction
    pub fn with_weights(hypotheses: Vec<f64>, weights: Vec<f64>) -> Result<Self> {
        let mut pmf = Pmf::new(hypotheses, weights)?;
        pmf.normalize()?;
        Ok(Self { pmf })
    }

    /// Create a suite using an existing `Pmf` as the prior
    pub fn from_pmf(mut pmf: Pmf) -> Result<Self> {
        pmf.normalize()?;
        Ok(Self { pmf })
    }

    pub fn pmf(&self) -> &Pmf {
        &self.pmf
    }

    pub fn into_pmf(self) -> Pmf {
        self.pmf
    }

    pub fn hypotheses(&self) -> &[f64] {
        self.pmf.values()
    }

    /// Iterate over `(hypothesis, mass)` pairs in ascending order
    pub fn items(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.pmf.items()
    }

    /// Update with a single observation and return the normalizing constant
    /// (the total mass before renormalization).
    pub fn update<D, L>(&mut self, data: &D, likelihood: &L) -> Result<f64>
    where
        D: ?Sized,
        L: Likelihood<D> + ?Sized,
    {
        let mut masses = self.pmf.masses().to_vec();
        let total = apply_likelihood(self.pmf.values(), &mut masses, data, likelihood)?;
        debug!("Updated {} hypotheses, evidence {:.6e}", masses.len(), total);
        self.pmf.set_masses(masses);
        Ok(total)
    }

    /// Update with each observation in turn and return the log of the product
    /// of the normalizing constants.
    ///
    /// If any observation fails, none of the batch is applied.
    pub fn update_set<'a, D, L, I>(&mut self, dataset: I, likelihood: &L) -> Result<f64>
    where
        D: 'a + ?Sized,
        L: Likelihood<D> + ?Sized,
        I: IntoIterator<Item = &'a D>,
    {
        let mut masses = self.pmf.masses().to_vec();
        let mut log_evidence = 0.0;
        let mut count = 0usize;
        for data in dataset {
            let total = apply_likelihood(self.pmf.values(), &mut masses, data, likelihood)?;
            log_evidence += total.ln();
            count += 1;
        }
        debug!("Applied {} observations, log evidence {:.6}", count, log_evidence);
        self.pmf.set_masses(masses);
        Ok(log_evidence)
    }

    /// Update with a sequence of observations by accumulating log-likelihoods.
    ///
    /// Suited to long sequences where the product of raw likelihoods would
    /// underflow before it could be renormalized.
    pub fn log_update_set<'a, D, L, I>(&mut self, dataset: I, likelihood: &L) -> Result<()>
    where
        D: 'a + ?Sized,
        L: Likelihood<D> + ?Sized,
        I: IntoIterator<Item = &'a D>,
    {
        let hypotheses = self.pmf.values();
        let mut log_masses: Vec<f64> = self.pmf.masses().iter().map(|m| m.ln()).collect();
        for data in dataset {
            for (&hypo, log_mass) in hypotheses.iter().zip(log_masses.iter_mut()) {
                let like = check_weight(hypo, likelihood.likelihood(data, hypo))?;
                *log_mass += like.ln();
            }
        }

        let max = log_masses.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if max == f64::NEG_INFINITY {
            warn!("All hypotheses ruled out, keeping prior");
            return Err(BayesError::ZeroEvidence);
        }
        let masses: Vec<f64> = log_masses.iter().map(|l| (l - max).exp()).collect();
        let total: f64 = masses.iter().sum();
        self.pmf
            .set_masses(masses.into_iter().map(|m| m / total).collect());
        Ok(())
    }

    /// Renormalize and return the total mass before scaling
    pub fn normalize(&mut self) -> Result<f64> {
        self.pmf.normalize()
    }

    pub fn prob(&self, hypothesis: f64) -> f64 {
        self.pmf.prob(hypothesis)
    }

    pub fn mean(&self) -> f64 {
        self.pmf.mean()
    }

    pub fn variance(&self) -> f64 {
        self.pmf.variance()
    }

    /// Maximum a posteriori hypothesis; ties go to the smallest hypothesis
    pub fn map(&self) -> f64 {
        self.pmf.map()
    }

    pub fn percentile(&self, p: f64) -> Result<f64> {
        self.pmf.percentile(p)
    }

    pub fn credible_interval(&self, p: f64) -> Result<(f64, f64)> {
        self.pmf.credible_interval(p)
    }

    pub fn make_cdf(&self) -> Cdf {
        self.pmf.make_cdf()
    }
}

/// Multiply `masses` by the likelihood of `data` and renormalize in place.
/// `masses` is scratch space; on error its contents are unspecified.
fn apply_likelihood<D, L>(hypotheses: &[f64], masses: &mut [f64], data: &D, likelihood: &L) -> Result<f64>
where
    D: ?Sized,
    L: Likelihood<D> + ?Sized,
{
    for (&hypo, mass) in hypotheses.iter().zip(masses.iter_mut()) {
        *mass *= check_weight(hypo, likelihood.likelihood(data, hypo))?;
    }
    let total: f64 = masses.iter().sum();
    if total <= 0.0 || !total.is_finite() {
        warn!("All hypotheses ruled out, keeping prior");
        return Err(BayesError::ZeroEvidence);
    }
    masses.iter_mut().for_each(|m| *m /= total);
    Ok(total)
}
