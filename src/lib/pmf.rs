use crate::error::{BayesError, Result, check_range};
use itertools::Itertools;
use log::debug;
use serde::{Deserialize, Serialize};

/// Probability mass over a strictly ascending set of values.
///
/// Masses are kept in the same order as the values, so the scan order used by
/// `percentile` and `map` is always the ascending value order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PmfParts")]
pub struct Pmf {
    values: Vec<f64>,
    masses: Vec<f64>,
}

#[derive(Deserialize)]
struct PmfParts {
    values: Vec<f64>,
    masses: Vec<f64>,
}

impl TryFrom<PmfParts> for Pmf {
    type Error = BayesError;

    fn try_from(parts: PmfParts) -> Result<Self> {
        Self::new(parts.values, parts.masses)
    }
}

impl Pmf {
    /// Create an unnormalized `Pmf` from parallel value and mass vectors.
    ///
    /// At least one mass must be positive; an all-zero total is `ZeroEvidence`.
    pub fn new(values: Vec<f64>, masses: Vec<f64>) -> Result<Self> {
        validate_domain(&values)?;
        if masses.len() != values.len() {
            return Err(BayesError::InvalidParameter {
                name: "masses",
                value: masses.len() as f64,
                constraint: "must have one mass per value",
            });
        }
        for (&value, &mass) in values.iter().zip(masses.iter()) {
            check_weight(value, mass)?;
        }
        let total: f64 = masses.iter().sum();
        if total <= 0.0 || !total.is_finite() {
            return Err(BayesError::ZeroEvidence);
        }
        Ok(Self { values, masses })
    }

    /// Create a normalized `Pmf` with equal mass on every value
    pub fn uniform(values: Vec<f64>) -> Result<Self> {
        let masses = vec![1.0; values.len()];
        let mut pmf = Self::new(values, masses)?;
        pmf.normalize()?;
        Ok(pmf)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn masses(&self) -> &[f64] {
        &self.masses
    }

    /// Iterate over `(value, mass)` pairs in ascending value order
    pub fn items(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.values.iter().copied().zip(self.masses.iter().copied())
    }

    pub fn total(&self) -> f64 {
        self.masses.iter().sum()
    }

    /// Scale masses so they sum to one and return the total before scaling.
    ///
    /// A zero total leaves the masses untouched and returns `ZeroEvidence`.
    pub fn normalize(&mut self) -> Result<f64> {
        let total = self.total();
        if total <= 0.0 || !total.is_finite() {
            return Err(BayesError::ZeroEvidence);
        }
        self.masses.iter_mut().for_each(|m| *m /= total);
        Ok(total)
    }

    /// Mass at exactly `value`, or 0 if `value` is not in the domain
    pub fn prob(&self, value: f64) -> f64 {
        match self.values.binary_search_by(|v| v.total_cmp(&value)) {
            Ok(idx) => self.masses[idx],
            Err(_) => 0.0,
        }
    }

    pub fn mean(&self) -> f64 {
        let total = self.total();
        self.items().map(|(v, m)| v * m).sum::<f64>() / total
    }

    pub fn variance(&self) -> f64 {
        let mean = self.mean();
        let total = self.total();
        self.items().map(|(v, m)| m * (v - mean).powi(2)).sum::<f64>() / total
    }

    /// Value with the largest mass. Ties go to the first (smallest) value.
    pub fn map(&self) -> f64 {
        let mut best = 0;
        for (idx, &mass) in self.masses.iter().enumerate().skip(1) {
            if mass > self.masses[best] {
                best = idx;
            }
        }
        self.values[best]
    }

    /// Smallest value whose cumulative mass reaches `p` percent
    pub fn percentile(&self, p: f64) -> Result<f64> {
        self.make_cdf().percentile(p)
    }

    /// Central interval holding `p` percent of the mass
    pub fn credible_interval(&self, p: f64) -> Result<(f64, f64)> {
        self.make_cdf().credible_interval(p)
    }

    pub fn make_cdf(&self) -> Cdf {
        let total = self.total();
        let probs = self
            .masses
            .iter()
            .scan(0.0, |acc, &m| {
                *acc += m;
                Some(*acc / total)
            })
            .collect();
        Cdf {
            values: self.values.clone(),
            probs,
        }
    }

    /// Largest absolute mass difference against a `Pmf` over the same values.
    ///
    /// Returns `None` when the two domains differ.
    pub fn max_abs_diff(&self, other: &Pmf) -> Option<f64> {
        if self.values != other.values {
            return None;
        }
        self.masses
            .iter()
            .zip(other.masses.iter())
            .map(|(a, b)| (a - b).abs())
            .fold(None, |acc: Option<f64>, d| Some(acc.map_or(d, |a| a.max(d))))
    }

    pub(crate) fn set_masses(&mut self, masses: Vec<f64>) {
        debug_assert_eq!(masses.len(), self.values.len());
        self.masses = masses;
    }
}

/// Cumulative probabilities over a strictly ascending set of values
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CdfParts")]
pub struct Cdf {
    values: Vec<f64>,
    probs: Vec<f64>,
}

#[derive(Deserialize)]
struct CdfParts {
    values: Vec<f64>,
    probs: Vec<f64>,
}

impl TryFrom<CdfParts> for Cdf {
    type Error = BayesError;

    fn try_from(parts: CdfParts) -> Result<Self> {
        Self::new(parts.values, parts.probs)
    }
}

impl Cdf {
    /// Build a `Cdf` from values and their cumulative probabilities.
    ///
    /// Probabilities must be non-decreasing and lie in `[0, 1]`.
    pub fn new(values: Vec<f64>, probs: Vec<f64>) -> Result<Self> {
        validate_domain(&values)?;
        if probs.len() != values.len() {
            return Err(BayesError::InvalidParameter {
                name: "probs",
                value: probs.len() as f64,
                constraint: "must have one cumulative probability per value",
            });
        }
        for &p in probs.iter() {
            check_range(p, 0.0, 1.0)?;
        }
        if let Some((idx, _)) = probs
            .iter()
            .tuple_windows()
            .enumerate()
            .find(|(_, (a, b))| b < a)
        {
            return Err(BayesError::InvalidParameter {
                name: "probs",
                value: probs[idx + 1],
                constraint: "cumulative probabilities must be non-decreasing",
            });
        }
        Ok(Self { values, probs })
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn probs(&self) -> &[f64] {
        &self.probs
    }

    /// Cumulative probability at `x`: mass on values less than or equal to `x`
    pub fn prob(&self, x: f64) -> f64 {
        let idx = self.values.partition_point(|&v| v <= x);
        if idx == 0 { 0.0 } else { self.probs[idx - 1] }
    }

    /// Smallest value whose cumulative probability reaches `p`, for `p` in `[0, 1]`
    pub fn value(&self, p: f64) -> Result<f64> {
        let p = check_range(p, 0.0, 1.0)?;
        let idx = self.probs.partition_point(|&c| c < p);
        Ok(self.values[idx.min(self.values.len() - 1)])
    }

    pub fn percentile(&self, p: f64) -> Result<f64> {
        let p = check_range(p, 0.0, 100.0)?;
        self.value(p / 100.0)
    }

    pub fn credible_interval(&self, p: f64) -> Result<(f64, f64)> {
        let p = check_range(p, 0.0, 100.0)?;
        let tail = (100.0 - p) / 2.0;
        Ok((self.percentile(tail)?, self.percentile(100.0 - tail)?))
    }

    /// Mass per value from successive differences of the cumulative probabilities
    pub fn make_pmf(&self) -> Result<Pmf> {
        let masses: Vec<f64> = std::iter::once(self.probs[0])
            .chain(self.probs.iter().tuple_windows().map(|(a, b)| (b - a).max(0.0)))
            .collect();
        debug!("Differenced CDF over {} values", masses.len());
        let mut pmf = Pmf::new(self.values.clone(), masses)?;
        pmf.normalize()?;
        Ok(pmf)
    }
}

fn validate_domain(values: &[f64]) -> Result<()> {
    if values.is_empty() {
        return Err(BayesError::EmptyDomain);
    }
    if let Some(index) = values.iter().position(|v| !v.is_finite()) {
        return Err(BayesError::UnsortedDomain { index });
    }
    if let Some((idx, _)) = values
        .iter()
        .tuple_windows()
        .enumerate()
        .find(|(_, (a, b))| b <= a)
    {
        return Err(BayesError::UnsortedDomain { index: idx + 1 });
    }
    Ok(())
}

/// `x * ln(y)`, taken as 0 when `x` is 0 so that `0 * ln 0` stays finite
pub(crate) fn xlogy(x: f64, y: f64) -> f64 {
    if x == 0.0 { 0.0 } else { x * y.ln() }
}

pub(crate) fn check_weight(hypothesis: f64, weight: f64) -> Result<f64> {
    if !weight.is_finite() || weight < 0.0 {
        return Err(BayesError::InvalidWeight { hypothesis, weight });
    }
    Ok(weight)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> Vec<f64> {
        (0..=100).map(|x| x as f64).collect()
    }

    #[test]
    fn test_new_validation() {
        assert_eq!(Pmf::new(vec![], vec![]), Err(BayesError::EmptyDomain));
        assert_eq!(
            Pmf::new(vec![1.0, 3.0, 2.0], vec![1.0, 1.0, 1.0]),
            Err(BayesError::UnsortedDomain { index: 2 })
        );
        assert_eq!(
            Pmf::new(vec![1.0, 1.0], vec![1.0, 1.0]),
            Err(BayesError::UnsortedDomain { index: 1 })
        );
        assert!(Pmf::new(vec![1.0, 2.0], vec![1.0]).is_err());
        assert!(Pmf::new(vec![1.0, 2.0], vec![1.0, -0.5]).is_err());
        assert!(Pmf::new(vec![1.0, 2.0], vec![1.0, f64::NAN]).is_err());
        assert!(Pmf::new(vec![1.0, f64::INFINITY], vec![1.0, 1.0]).is_err());
    }

    #[test]
    fn test_uniform_sums_to_one() {
        let pmf = Pmf::uniform(grid()).unwrap();
        assert!((pmf.total() - 1.0).abs() < 1e-9);
        assert!((pmf.prob(50.0) - 1.0 / 101.0).abs() < 1e-12);
        assert!((pmf.mean() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_normalize_returns_total() {
        let mut pmf = Pmf::new(vec![0.0, 1.0, 2.0], vec![1.0, 2.0, 1.0]).unwrap();
        let total = pmf.normalize().unwrap();
        assert!((total - 4.0).abs() < 1e-12);
        assert_eq!(pmf.masses(), &[0.25, 0.5, 0.25]);
    }

    #[test]
    fn test_new_rejects_zero_total() {
        assert_eq!(
            Pmf::new(vec![0.0, 1.0], vec![0.0, 0.0]),
            Err(BayesError::ZeroEvidence)
        );
        let pmf = Pmf::new(vec![0.0, 1.0], vec![0.0, 2.0]).unwrap();
        assert_eq!(pmf.mean(), 1.0);
        assert_eq!(pmf.variance(), 0.0);
        assert!(pmf.make_cdf().probs().iter().all(|p| p.is_finite()));
    }

    #[test]
    fn test_cdf_all_zero_has_no_pmf() {
        let cdf = Cdf::new(vec![0.0, 1.0], vec![0.0, 0.0]).unwrap();
        assert_eq!(cdf.make_pmf(), Err(BayesError::ZeroEvidence));
    }

    #[test]
    fn test_deserialize_validates() {
        let pmf: Pmf = serde_json::from_str(r#"{"values":[1.0,2.0],"masses":[0.25,0.75]}"#).unwrap();
        assert_eq!(pmf.map(), 2.0);
        assert!(serde_json::from_str::<Pmf>(r#"{"values":[],"masses":[]}"#).is_err());
        assert!(serde_json::from_str::<Pmf>(r#"{"values":[2.0,1.0],"masses":[1.0,1.0]}"#).is_err());
        assert!(serde_json::from_str::<Pmf>(r#"{"values":[1.0,2.0],"masses":[0.0,0.0]}"#).is_err());
        assert!(serde_json::from_str::<Pmf>(r#"{"values":[1.0],"masses":[-1.0]}"#).is_err());

        let cdf: Cdf = serde_json::from_str(r#"{"values":[1.0,2.0],"probs":[0.5,1.0]}"#).unwrap();
        assert_eq!(cdf.value(0.75).unwrap(), 2.0);
        assert!(serde_json::from_str::<Cdf>(r#"{"values":[],"probs":[]}"#).is_err());
        assert!(serde_json::from_str::<Cdf>(r#"{"values":[1.0,2.0],"probs":[0.9,0.1]}"#).is_err());
    }

    #[test]
    fn test_xlogy() {
        assert_eq!(xlogy(0.0, 0.0), 0.0);
        assert_eq!(xlogy(2.0, 0.0), f64::NEG_INFINITY);
        assert!((xlogy(2.0, std::f64::consts::E) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_prob_outside_domain() {
        let pmf = Pmf::uniform(grid()).unwrap();
        assert_eq!(pmf.prob(50.5), 0.0);
        assert_eq!(pmf.prob(-1.0), 0.0);
        assert_eq!(pmf.prob(101.0), 0.0);
    }

    #[test]
    fn test_map_ties_first_value() {
        let pmf = Pmf::new(vec![1.0, 2.0, 3.0, 4.0], vec![1.0, 3.0, 3.0, 1.0]).unwrap();
        assert_eq!(pmf.map(), 2.0);
        let flat = Pmf::uniform(vec![5.0, 6.0, 7.0]).unwrap();
        assert_eq!(flat.map(), 5.0);
    }

    #[test]
    fn test_credible_interval_uniform() {
        let pmf = Pmf::uniform(grid()).unwrap();
        assert_eq!(pmf.credible_interval(90.0).unwrap(), (5.0, 95.0));
        assert_eq!(pmf.percentile(50.0).unwrap(), 50.0);
        assert_eq!(pmf.percentile(0.0).unwrap(), 0.0);
        assert_eq!(pmf.percentile(100.0).unwrap(), 100.0);
        assert!(pmf.percentile(100.1).is_err());
        assert!(pmf.credible_interval(-5.0).is_err());
    }

    #[test]
    fn test_percentile_monotonic() {
        let weights: Vec<f64> = (0..=100).map(|x| ((x as f64) / 10.0).sin().abs()).collect();
        let mut pmf = Pmf::new(grid(), weights).unwrap();
        pmf.normalize().unwrap();
        let mut last = f64::NEG_INFINITY;
        for p in 0..=100 {
            let value = pmf.percentile(p as f64).unwrap();
            assert!(value >= last);
            last = value;
        }
    }

    #[test]
    fn test_variance() {
        let pmf = Pmf::new(vec![0.0, 1.0], vec![1.0, 1.0]).unwrap();
        assert!((pmf.mean() - 0.5).abs() < 1e-12);
        assert!((pmf.variance() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_cdf_queries() {
        let pmf = Pmf::new(vec![1.0, 2.0, 3.0, 4.0], vec![0.1, 0.2, 0.3, 0.4]).unwrap();
        let cdf = pmf.make_cdf();
        assert_eq!(cdf.prob(0.5), 0.0);
        assert!((cdf.prob(2.5) - 0.3).abs() < 1e-12);
        assert!((cdf.prob(10.0) - 1.0).abs() < 1e-12);
        assert_eq!(cdf.value(0.0).unwrap(), 1.0);
        assert_eq!(cdf.value(0.3).unwrap(), 2.0);
        assert_eq!(cdf.value(0.31).unwrap(), 3.0);
        assert_eq!(cdf.value(1.0).unwrap(), 4.0);
        assert!(cdf.value(1.5).is_err());
    }

    #[test]
    fn test_cdf_make_pmf_differences() {
        let cdf = Cdf::new(vec![0.0, 0.5, 1.0], vec![0.0, 0.25, 1.0]).unwrap();
        let pmf = cdf.make_pmf().unwrap();
        assert_eq!(pmf.masses(), &[0.0, 0.25, 0.75]);
    }

    #[test]
    fn test_cdf_new_validation() {
        assert!(Cdf::new(vec![0.0, 1.0], vec![0.6, 0.5]).is_err());
        assert!(Cdf::new(vec![0.0, 1.0], vec![0.5, 1.5]).is_err());
        assert!(Cdf::new(vec![0.0, 1.0], vec![0.5]).is_err());
    }

    #[test]
    fn test_max_abs_diff() {
        let a = Pmf::new(vec![0.0, 1.0], vec![0.5, 0.5]).unwrap();
        let b = Pmf::new(vec![0.0, 1.0], vec![0.4, 0.6]).unwrap();
        let c = Pmf::new(vec![0.0, 2.0], vec![0.4, 0.6]).unwrap();
        assert!((a.max_abs_diff(&b).unwrap() - 0.1).abs() < 1e-12);
        assert_eq!(a.max_abs_diff(&c), None);
    }
}
