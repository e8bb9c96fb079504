//! semtree - semantic outlines of HTML pages

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::LevelFilter;

use semtree::{
    FallbackStrategy, LexicalSimilarity, NodeId, PruneConfig, PruneResult, Pruner, SemanticTree,
};

#[derive(Parser)]
#[command(name = "semtree")]
#[command(version, about = "Semantic outlines of HTML pages", long_about = None)]
#[command(after_help = "EXAMPLES:
    semtree page.html                          Print the outline
    semtree page.html --lookup 7               Print the structural path of node 7
    semtree page.html --query hours -b 300     Prune the outline for a query")]
struct Cli {
    /// Input HTML file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Query to prune the outline for
    #[arg(long)]
    query: Option<String>,

    /// Token budget for the pruned tree
    #[arg(short, long)]
    budget: Option<usize>,

    /// Leaves scoring below this are always pruned
    #[arg(long)]
    min_score: Option<f32>,

    /// How pruned leaves are regrouped
    #[arg(short, long, value_enum)]
    strategy: Option<FallbackStrategy>,

    /// Share of leaves pruned when no budget is given
    #[arg(long)]
    remove_proportion: Option<f64>,

    /// Token cap for each fallback tree
    #[arg(long)]
    fallback_budget: Option<usize>,

    /// JSON file with pruning settings; flags take precedence
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print the structural path of a node id and exit
    #[arg(short, long, value_name = "ID")]
    lookup: Option<u32>,

    /// Emit JSON instead of text
    #[arg(long)]
    json: bool,

    /// Debug logging
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(cli: &Cli) {
    let env = env_logger::Env::default().default_filter_or("warn");
    let mut builder = env_logger::Builder::from_env(env);
    if cli.verbose {
        builder.filter_level(LevelFilter::Debug);
    } else if cli.quiet {
        builder.filter_level(LevelFilter::Error);
    }
    builder.init();
}

fn run(cli: &Cli) -> Result<(), String> {
    let tree = SemanticTree::open(&cli.input).map_err(|e| e.to_string())?;

    if let Some(id) = cli.lookup {
        return lookup(&tree, NodeId(id), cli.json);
    }

    match &cli.query {
        Some(query) => prune(&tree, query, load_config(cli)?, cli.json),
        None => outline(&tree, cli.json),
    }
}

fn lookup(tree: &SemanticTree, id: NodeId, json: bool) -> Result<(), String> {
    let path = tree
        .path_of(id)
        .ok_or_else(|| format!("no node with id {id}"))?;
    if json {
        let value = serde_json::json!({ "id": id, "path": path });
        println!("{value}");
    } else {
        println!("{path}");
    }
    Ok(())
}

fn outline(tree: &SemanticTree, json: bool) -> Result<(), String> {
    if json {
        let out = serde_json::to_string_pretty(tree).map_err(|e| e.to_string())?;
        println!("{out}");
    } else {
        print!("{tree}");
    }
    Ok(())
}

fn prune(tree: &SemanticTree, query: &str, config: PruneConfig, json: bool) -> Result<(), String> {
    let result: PruneResult = Pruner::new(tree, &LexicalSimilarity, config)
        .prune(query)
        .map_err(|e| e.to_string())?;
    if json {
        let out = serde_json::to_string_pretty(&result).map_err(|e| e.to_string())?;
        println!("{out}");
    } else {
        print!("{}", result.summary());
    }
    Ok(())
}

/// Settings from `--config`, overridden by individual flags.
fn load_config(cli: &Cli) -> Result<PruneConfig, String> {
    let mut config = match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|e| format!("{}: {e}", path.display()))?;
            serde_json::from_str(&text).map_err(|e| format!("{}: {e}", path.display()))?
        }
        None => PruneConfig::default(),
    };

    if let Some(budget) = cli.budget {
        config = config.with_budget(budget);
    }
    if let Some(min_score) = cli.min_score {
        config = config.with_min_score(min_score);
    }
    if let Some(strategy) = cli.strategy {
        config = config.with_strategy(strategy);
    }
    if let Some(proportion) = cli.remove_proportion {
        config = config.with_remove_proportion(proportion);
    }
    if let Some(budget) = cli.fallback_budget {
        config = config.with_fallback_budget(budget);
    }
    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}
