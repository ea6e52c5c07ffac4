//! The Euro problem: is a spun Belgian one-euro coin biased?
//!
//! Hypotheses are the probability of heads as a percentage, `0..=100`.

use crate::error::Result;
use crate::pmf::xlogy;
use crate::suite::Suite;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
pub enum Toss {
    #[strum(to_string = "H", serialize = "h")]
    Heads,
    #[strum(to_string = "T", serialize = "t")]
    Tails,
}

impl Toss {
    /// Parse a sequence such as `"HHTH"`. Whitespace is ignored.
    pub fn parse_sequence(s: &str) -> std::result::Result<Vec<Toss>, strum::ParseError> {
        s.chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| c.to_string().parse::<Toss>())
            .collect()
    }
}

/// Sufficient statistic for a run of tosses
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TossCounts {
    pub heads: u64,
    pub tails: u64,
}

impl TossCounts {
    pub fn new(heads: u64, tails: u64) -> Self {
        Self { heads, tails }
    }

    pub fn from_tosses<'a>(tosses: impl IntoIterator<Item = &'a Toss>) -> Self {
        tosses.into_iter().fold(Self::default(), |mut counts, toss| {
            match toss {
                Toss::Heads => counts.heads += 1,
                Toss::Tails => counts.tails += 1,
            }
            counts
        })
    }

    pub fn total(&self) -> u64 {
        self.heads + self.tails
    }

    /// Expand into individual tosses, all heads first
    pub fn tosses(&self) -> Vec<Toss> {
        std::iter::repeat_n(Toss::Heads, self.heads as usize)
            .chain(std::iter::repeat_n(Toss::Tails, self.tails as usize))
            .collect()
    }
}

/// Likelihood of one toss given the percentage of heads
pub fn toss_likelihood(toss: &Toss, hypothesis: f64) -> f64 {
    let x = hypothesis / 100.0;
    match toss {
        Toss::Heads => x,
        Toss::Tails => 1.0 - x,
    }
}

/// Binomial likelihood of a batch of tosses, without the binomial coefficient.
///
/// Scaled by its value at the observed frequency of heads so the peak is 1.
/// `x^h (1-x)^t` alone underflows to 0 everywhere once the counts reach the
/// low thousands. The scale is the same for every hypothesis and cancels on
/// normalization.
pub fn binomial_likelihood(counts: &TossCounts, hypothesis: f64) -> f64 {
    let total = counts.total();
    if total == 0 {
        return 1.0;
    }
    let (heads, tails) = (counts.heads as f64, counts.tails as f64);
    let x = hypothesis / 100.0;
    let p = heads / total as f64;
    let log_like = xlogy(heads, x) + xlogy(tails, 1.0 - x);
    let log_peak = xlogy(heads, p) + xlogy(tails, 1.0 - p);
    (log_like - log_peak).exp()
}

pub fn percentage_grid() -> Vec<f64> {
    (0..=100).map(|x| x as f64).collect()
}

pub fn uniform_prior() -> Result<Suite> {
    Suite::uniform(percentage_grid())
}

/// Triangle prior peaking at 50: weight `x` below 50 and `100 - x` above
pub fn triangle_prior() -> Result<Suite> {
    let grid = percentage_grid();
    let weights = grid
        .iter()
        .map(|&x| if x <= 50.0 { x } else { 100.0 - x })
        .collect();
    Suite::with_weights(grid, weights)
}
