use anyhow::{
    Context,
    Result,
};
use clap::Parser;
use std::{
    fs::read_to_string,
    path::PathBuf,
};
use tramp::{
    config::DEFAULT_MAX_DEPTH,
    Config,
    Interpreter,
    DEMO_SOURCE,
};


const DEMO_ENTRIES: &[&str] = &["(factorial 20)", "(even 59392)"];


/// Rewrites tail calls in a file of definitions and runs entry expressions on a trampoline.
#[derive(Parser, Debug)]
#[command(name = "tramp", version)]
struct Cli {
    /// File of top-level `def`s. The bundled factorial/odd/even demo is used when omitted.
    file: Option<PathBuf>,

    /// Entry expression to run, e.g. `(factorial 5)`. May be repeated.
    #[arg(short, long = "entry")]
    entries: Vec<String>,

    /// Register the definitions without rewriting tail calls.
    #[arg(long)]
    no_tco: bool,

    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// Abort a run after this many bounces.
    #[arg(long)]
    max_bounces: Option<u64>,
}


fn main()->Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let source = match &cli.file {
        Some(path)=>read_to_string(path)
            .with_context(||format!("reading `{}`", path.display()))?,
        None=>DEMO_SOURCE.to_string(),
    };

    let mut root = Interpreter::with_config(Config {
        max_depth: cli.max_depth,
        max_bounces: cli.max_bounces,
    });
    let names = if cli.no_tco {
        log::warn!("tail calls are not rewritten; deep recursion will hit the depth limit");
        root.define(&source)?
    } else {
        root.transform(&source)?
    };
    log::info!("loaded {}", names.join(", "));

    let entries = if cli.entries.is_empty() {
        DEMO_ENTRIES.iter().map(|e|e.to_string()).collect()
    } else {
        cli.entries
    };

    for entry in &entries {
        let value = root.run_source(entry)
            .with_context(||format!("running `{entry}`"))?;
        println!("{value}");
    }

    return Ok(());
}
