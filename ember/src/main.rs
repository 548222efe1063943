//! Ember CLI

use clap::{Parser, Subcommand};
use ember::{Config, Host, StdHost, Value};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "ember", version, about = "Ember - a small expression-oriented scripting language")]
struct Cli {
    /// TOML file with interpreter limits
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Maximum function call depth (overrides the config file)
    #[arg(long, global = true)]
    max_depth: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run an Ember source file
    Run {
        /// Source file to run
        file: PathBuf,
    },
    /// Parse and dump AST as JSON (debug)
    Parse {
        /// Source file to parse
        file: PathBuf,
    },
    /// Tokenize and dump tokens (debug)
    Tokens {
        /// Source file to tokenize
        file: PathBuf,
    },
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match &cli.command {
        Command::Run { file } => load_config(&cli).and_then(|config| run_file(file, &config)),
        Command::Parse { file } => parse_file(file),
        Command::Tokens { file } => tokenize_file(file),
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

/// Log to stderr so program output on stdout stays clean
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .with(filter)
        .init();
}

fn load_config(cli: &Cli) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => Config::from_toml_str(&std::fs::read_to_string(path)?)?,
        None => Config::default(),
    };
    if let Some(depth) = cli.max_depth {
        config = config.max_call_depth(depth);
    }
    tracing::debug!(?config, "loaded configuration");
    Ok(config)
}

/// Returns `Ok(false)` when the program failed with a reported diagnostic
fn run_file(path: &Path, config: &Config) -> Result<bool, Box<dyn std::error::Error>> {
    let source = std::fs::read_to_string(path)?;
    let filename = path.display().to_string();

    match ember::run_with(&source, config, &mut StdHost) {
        Ok(Value::Unit) => Ok(true),
        Ok(value) => {
            let mut out = Vec::new();
            value.write_to(&mut out);
            out.push(b'\n');
            StdHost.write(&out)?;
            Ok(true)
        }
        Err(diagnostic) => {
            ember::error::report_diagnostic(&filename, &source, &diagnostic)?;
            Ok(false)
        }
    }
}

fn parse_file(path: &Path) -> Result<bool, Box<dyn std::error::Error>> {
    let source = std::fs::read_to_string(path)?;

    let tokens = ember::lexer::tokenize(&source)?;
    let ast = ember::parser::parse(tokens)?;

    println!("{}", serde_json::to_string_pretty(&ast)?);
    Ok(true)
}

fn tokenize_file(path: &Path) -> Result<bool, Box<dyn std::error::Error>> {
    let source = std::fs::read_to_string(path)?;

    let tokens = ember::lexer::tokenize(&source)?;
    for lexeme in &tokens {
        println!(
            "{:>4}:{:<3} {:?} {:?}",
            lexeme.pos.line,
            lexeme.pos.column,
            lexeme.token,
            lexeme.text(&source)
        );
    }
    Ok(true)
}
