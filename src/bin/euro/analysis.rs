use crate::cli::{Cli, Prior};
use anyhow::{Result, anyhow};
use csv::WriterBuilder;
use eurobayes::euro::{self, Toss, TossCounts};
use eurobayes::{BetaDistribution, Pmf, Suite};
use log::{debug, info};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, Serialize)]
pub struct GridSummary {
    pub mean: f64,
    pub map: f64,
    pub median: f64,
    pub credible_interval: (f64, f64),
}

#[derive(Debug, Clone, Serialize)]
pub struct BetaSummary {
    pub alpha: f64,
    pub beta: f64,
    pub mean: f64,
    pub map: Option<f64>,
    pub median: f64,
    pub credible_interval: (f64, f64),
    pub sampled_mean: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub counts: TossCounts,
    pub credible: f64,
    pub grid: GridSummary,
    pub beta: BetaSummary,
}

/// Posterior results from both the grid and the conjugate model
pub struct Posterior {
    pub suite: Suite,
    pub beta: BetaDistribution,
    pub beta_grid: Pmf,
    pub summary: Summary,
}

pub fn observed_tosses(args: &Cli) -> Result<Vec<Toss>> {
    match &args.tosses {
        Some(s) => Toss::parse_sequence(s).map_err(|e| anyhow!("Could not parse tosses {}: {}", s, e)),
        None => Ok(TossCounts::new(args.heads, args.tails).tosses()),
    }
}

pub fn run(args: &Cli) -> Result<Posterior> {
    let tosses = observed_tosses(args)?;
    let counts = TossCounts::from_tosses(&tosses);
    info!("Observed {} heads and {} tails", counts.heads, counts.tails);

    let mut suite = match args.prior {
        Prior::Uniform => euro::uniform_prior()?,
        Prior::Triangle => euro::triangle_prior()?,
    };
    if args.sequential {
        debug!("Updating grid with {} single tosses", tosses.len());
        suite.update_set(&tosses, &euro::toss_likelihood)?;
    } else {
        suite.update(&counts, &euro::binomial_likelihood)?;
    }
    let grid = GridSummary {
        mean: suite.mean(),
        map: suite.map(),
        median: suite.percentile(50.0)?,
        credible_interval: suite.credible_interval(args.credible)?,
    };
    info!(
        "Grid posterior: mean {:.2}, MAP {}, {}% CI {:?}",
        grid.mean, grid.map, args.credible, grid.credible_interval
    );

    let mut beta = BetaDistribution::new(args.alpha, args.beta)?.with_label("posterior");
    beta.update(counts.heads as f64, counts.tails as f64)?;
    let beta_grid = beta.make_pmf(args.steps)?;
    let sampled_mean = match args.samples {
        0 => None,
        n => {
            let mut rng = StdRng::seed_from_u64(args.seed);
            let draws = beta.sample(&mut rng, n)?;
            Some(draws.iter().sum::<f64>() / n as f64)
        }
    };
    let beta_summary = BetaSummary {
        alpha: beta.alpha(),
        beta: beta.beta(),
        mean: beta.mean(),
        map: beta.map(),
        median: beta.percentile(50.0)?,
        credible_interval: beta.credible_interval(args.credible)?,
        sampled_mean,
    };
    info!(
        "Beta posterior: α = {}, β = {}, mean {:.4}",
        beta_summary.alpha, beta_summary.beta, beta_summary.mean
    );

    let summary = Summary {
        counts,
        credible: args.credible,
        grid,
        beta: beta_summary,
    };
    Ok(Posterior {
        suite,
        beta,
        beta_grid,
        summary,
    })
}

/// Write both posterior grids as `model, hypothesis, mass` rows.
/// Beta grid points are scaled to percentages so both share an axis.
pub fn write_grids(path: &Path, posterior: &Posterior) -> Result<()> {
    let file = File::create(path)
        .map_err(|e| anyhow!("Could not create output file: {} ({})", path.display(), e))?;
    let mut writer = WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .from_writer(file);
    writer.write_record(["model", "hypothesis", "mass"])?;
    for (hypothesis, mass) in posterior.suite.items() {
        let (hypothesis, mass) = (hypothesis.to_string(), mass.to_string());
        writer.write_record(["grid", hypothesis.as_str(), mass.as_str()])?;
    }
    let label = posterior.beta.label().unwrap_or("beta");
    for (x, mass) in posterior.beta_grid.items() {
        let (hypothesis, mass) = ((x * 100.0).to_string(), mass.to_string());
        writer.write_record([label, hypothesis.as_str(), mass.as_str()])?;
    }
    writer.flush()?;
    info!("Wrote posterior grids to {}", path.display());
    Ok(())
}

pub fn write_text<W: Write>(out: &mut W, summary: &Summary) -> Result<()> {
    let grid = &summary.grid;
    let beta = &summary.beta;
    writeln!(
        out,
        "Data: {} heads, {} tails",
        summary.counts.heads, summary.counts.tails
    )?;
    writeln!(out, "Grid posterior")?;
    writeln!(out, "  mean\t{:.4}", grid.mean)?;
    writeln!(out, "  MAP\t{}", grid.map)?;
    writeln!(out, "  median\t{}", grid.median)?;
    writeln!(
        out,
        "  {}% CI\t{} - {}",
        summary.credible, grid.credible_interval.0, grid.credible_interval.1
    )?;
    writeln!(out, "Beta({}, {}) posterior", beta.alpha, beta.beta)?;
    writeln!(out, "  mean\t{:.4}", beta.mean)?;
    match beta.map {
        Some(map) => writeln!(out, "  MAP\t{:.4}", map)?,
        None => writeln!(out, "  MAP\tundefined")?,
    }
    writeln!(out, "  median\t{:.4}", beta.median)?;
    writeln!(
        out,
        "  {}% CI\t{:.4} - {:.4}",
        summary.credible, beta.credible_interval.0, beta.credible_interval.1
    )?;
    if let Some(mean) = beta.sampled_mean {
        writeln!(out, "  sampled mean\t{:.4}", mean)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Read;

    #[test]
    fn test_run_defaults() {
        let args = Cli::parse_from(["euro"]);
        let posterior = run(&args).unwrap();
        let summary = &posterior.summary;
        assert_eq!(summary.counts, TossCounts::new(140, 110));
        assert_eq!(summary.grid.map, 56.0);
        assert_eq!(summary.grid.credible_interval, (51.0, 61.0));
        assert!((summary.beta.mean - 141.0 / 252.0).abs() < 1e-12);
        assert_eq!(summary.beta.sampled_mean, None);
    }

    #[test]
    fn test_run_large_counts() {
        let args = Cli::parse_from(["euro", "--heads", "1000", "--tails", "1000"]);
        let posterior = run(&args).unwrap();
        assert_eq!(posterior.summary.counts, TossCounts::new(1000, 1000));
        assert_eq!(posterior.summary.grid.map, 50.0);
        assert!((posterior.summary.beta.mean - 0.5).abs() < 1e-12);
        assert!((posterior.beta_grid.total() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_run_sequential_matches_batched() {
        let batched = run(&Cli::parse_from(["euro"])).unwrap();
        let sequential = run(&Cli::parse_from(["euro", "--sequential"])).unwrap();
        let diff = batched
            .suite
            .pmf()
            .max_abs_diff(sequential.suite.pmf())
            .unwrap();
        assert!(diff < 1e-9);
    }

    #[test]
    fn test_run_with_tosses_and_samples() {
        let args = Cli::parse_from(["euro", "--tosses", "HHHT", "--samples", "2000", "--seed", "7"]);
        let posterior = run(&args).unwrap();
        assert_eq!(posterior.summary.counts, TossCounts::new(3, 1));
        let sampled = posterior.summary.beta.sampled_mean.unwrap();
        assert!((sampled - 4.0 / 6.0).abs() < 0.03);
    }

    #[test]
    fn test_run_rejects_bad_input() {
        assert!(run(&Cli::parse_from(["euro", "--tosses", "HXT"])).is_err());
        assert!(run(&Cli::parse_from(["euro", "--alpha", "0"])).is_err());
        assert!(run(&Cli::parse_from(["euro", "--credible", "120"])).is_err());
    }

    #[test]
    fn test_write_grids() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grid.tsv");
        let posterior = run(&Cli::parse_from(["euro", "--steps", "11"])).unwrap();
        write_grids(&path, &posterior).unwrap();

        let mut contents = String::new();
        File::open(&path)
            .unwrap()
            .read_to_string(&mut contents)
            .unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines[0], "model\thypothesis\tmass");
        assert_eq!(lines.len(), 1 + 101 + 11);
        assert!(lines[1].starts_with("grid\t0\t"));
        assert!(lines[102].starts_with("posterior\t0\t"));
    }

    #[test]
    fn test_write_text_and_json() {
        let posterior = run(&Cli::parse_from(["euro"])).unwrap();
        let mut buffer = Vec::new();
        write_text(&mut buffer, &posterior.summary).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("Data: 140 heads, 110 tails"));
        assert!(text.contains("  90% CI\t51 - 61"));

        let json = serde_json::to_value(&posterior.summary).unwrap();
        assert_eq!(json["counts"]["heads"], 140);
        assert_eq!(json["grid"]["map"], 56.0);
    }
}
