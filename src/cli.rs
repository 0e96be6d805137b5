use crate::config::{Config, load_config};
use crate::ir::QueryTree;
use crate::layout::{DagreEngine, Strategy};
use crate::layout_dump::write_payload;
use crate::session::{LayoutSession, Refresh};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "qtl",
    version,
    about = "Lay out a query execution tree or event timeline as a positioned graph"
)]
pub struct Args {
    /// Input QueryTree JSON file or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output JSON file. Defaults to stdout.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Config JSON file
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Layout strategy; overrides the config file
    #[arg(short = 's', long = "strategy", value_enum)]
    pub strategy: Option<StrategyArg>,

    /// Fail instead of falling back to the rank layout when the layered engine errors
    #[arg(long = "no-fallback")]
    pub no_fallback: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyArg {
    Ranks,
    Layered,
}

impl From<StrategyArg> for Strategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Ranks => Strategy::Ranks,
            StrategyArg::Layered => Strategy::Layered,
        }
    }
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_tracing();

    let config = resolve_config(&args)?;
    let input = read_input(args.input.as_deref())?;
    let tree = QueryTree::from_json(&input).context("input is not a valid query tree")?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let session = LayoutSession::new(Arc::new(DagreEngine), config);
    let Refresh::Published(snapshot) = runtime.block_on(session.refresh(&tree))? else {
        anyhow::bail!("layout was superseded before it could be published");
    };

    tracing::info!(
        strategy = ?snapshot.strategy,
        nodes = snapshot.payload.nodes.len(),
        edges = snapshot.payload.edges.len(),
        anomalies = snapshot.payload.diagnostics.len(),
        "layout complete"
    );
    write_payload(args.output.as_deref(), &snapshot.payload, snapshot.strategy)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn resolve_config(args: &Args) -> Result<Config> {
    let mut config = load_config(args.config.as_deref())
        .with_context(|| format!("failed to load config {:?}", args.config))?;
    if let Some(strategy) = args.strategy {
        config.strategy = strategy.into();
    }
    if args.no_fallback {
        config.fallback_to_ranks = false;
    }
    Ok(config)
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path {
        if path != Path::new("-") {
            return std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()));
        }
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config_defaults() {
        let args = Args::parse_from(["qtl", "-i", "tree.json", "-s", "layered", "--no-fallback"]);
        assert_eq!(args.input.as_deref(), Some(Path::new("tree.json")));
        assert_eq!(args.strategy, Some(StrategyArg::Layered));

        let config = resolve_config(&args).expect("default config");
        assert_eq!(config.strategy, Strategy::Layered);
        assert!(!config.fallback_to_ranks);
    }

    #[test]
    fn defaults_keep_rank_strategy_and_fallback() {
        let args = Args::parse_from(["qtl"]);
        let config = resolve_config(&args).expect("default config");
        assert_eq!(config.strategy, Strategy::Ranks);
        assert!(config.fallback_to_ranks);
    }
}
