// src/cli.rs
use clap::{Parser, ValueEnum};
use strum_macros::Display;
/// Estimate the bias of a coin from a run of tosses.
#[derive(Parser, Debug)]
#[command(name = "euro", version, about = "Bayesian estimate of a coin's bias")]
pub struct Cli {
    #[arg(long, default_value = "140", help = "Number of heads observed")]
    pub heads: u64,

    #[arg(long, default_value = "110", help = "Number of tails observed")]
    pub tails: u64,

    #[arg(
        long,
        value_name = "TOSSES",
        help = "Observed tosses as a string of H and T; overrides --heads and --tails"
    )]
    pub tosses: Option<String>,

    #[arg(
        value_enum,
        long,
        default_value = "uniform",
        help = "Prior over the percentage of heads"
    )]
    pub prior: Prior,

    #[arg(long, help = "Update one toss at a time instead of with the counts")]
    pub sequential: bool,

    #[arg(long, default_value = "1.0", help = "Alpha of the Beta prior")]
    pub alpha: f64,

    #[arg(long, default_value = "1.0", help = "Beta of the Beta prior")]
    pub beta: f64,

    #[arg(
        long,
        default_value = "101",
        help = "Number of grid points when discretizing the Beta posterior"
    )]
    pub steps: usize,

    #[arg(long, default_value = "90", help = "Credible interval width in percent")]
    pub credible: f64,

    #[arg(
        long,
        default_value = "0",
        help = "Number of Beta posterior draws to summarise, 0 to skip"
    )]
    pub samples: usize,

    #[arg(long, default_value = "1", help = "Seed for posterior draws")]
    pub seed: u64,

    #[arg(
        long,
        short,
        value_name = "OUT",
        help = "Write posterior grids as a tab separated file"
    )]
    pub out: Option<String>,

    #[arg(value_enum, long, default_value = "text", help = "Summary format")]
    pub format: Format,

    #[arg(
        value_enum,
        long,
        default_value = "normal",
        value_name = "VERBOSITY",
        help = "Verbosity level"
    )]
    pub verbosity: LogLevel,
}

#[derive(Debug, ValueEnum, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Prior {
    Uniform,
    Triangle,
}

#[derive(Debug, ValueEnum, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Text,
    Json,
}

#[derive(Debug, ValueEnum, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Verbose,
    Normal,
    Silent,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Verbose => write!(f, "verbose"),
            LogLevel::Normal => write!(f, "normal"),
            LogLevel::Silent => write!(f, "silent"),
        }
    }
}
