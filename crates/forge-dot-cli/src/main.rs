mod config;

use clap::{ArgAction, Parser, Subcommand};
use config::{CliConfig, ConfigError};
use forge_dot::{Graph, LexError, Node, ParseError, TokenType, lex, normalize, parse};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "forge-dot")]
#[command(about = "Lex, parse, format and inspect Forge pipeline DOT files")]
struct Cli {
    /// Raise log verbosity (-v info, -vv debug, -vvv trace). RUST_LOG wins.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the token stream, one token per line.
    Tokens(InputArgs),
    /// Print the parsed graph as JSON.
    Parse(ParseArgs),
    /// Print the canonical serialization.
    Fmt(FmtArgs),
    /// Print a short summary of the graph.
    Inspect(InputArgs),
}

#[derive(clap::Args, Debug)]
struct InputArgs {
    /// Path to a DOT file, or `-` for stdin.
    #[arg(long)]
    dot_file: Option<PathBuf>,
    #[arg(long)]
    dot_source: Option<String>,
}

#[derive(clap::Args, Debug)]
struct ParseArgs {
    #[command(flatten)]
    input: InputArgs,
    #[arg(long, action = ArgAction::SetTrue)]
    compact: bool,
}

#[derive(clap::Args, Debug)]
struct FmtArgs {
    #[command(flatten)]
    input: InputArgs,
    #[arg(long, action = ArgAction::SetTrue)]
    color: bool,
    /// Exit 1 when the input is not already canonical.
    #[arg(long, action = ArgAction::SetTrue, conflicts_with = "write")]
    check: bool,
    /// Rewrite the DOT file in place.
    #[arg(long, action = ArgAction::SetTrue)]
    write: bool,
}

#[derive(Debug, Error)]
enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed reading DOT file '{path}': {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed writing DOT file '{path}': {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("failed encoding JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    fn exit_code(&self) -> ExitCode {
        match self {
            CliError::Usage(_) => ExitCode::from(2),
            _ => ExitCode::from(1),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = CliConfig::load()
        .map_err(CliError::from)
        .and_then(|config| match cli.command {
            Commands::Tokens(args) => tokens_command(args),
            Commands::Parse(args) => parse_command(args, &config),
            Commands::Fmt(args) => fmt_command(args, &config),
            Commands::Inspect(args) => inspect_command(args),
        });

    match result {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error}");
            error.exit_code()
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn tokens_command(args: InputArgs) -> Result<ExitCode, CliError> {
    let source = load_dot_source(args.dot_file.as_deref(), args.dot_source.as_deref())?;
    for token in lex(&source)? {
        if token.kind == TokenType::Eof {
            println!("{}:{} {}", token.line, token.col, token.kind);
        } else {
            println!("{}:{} {} {}", token.line, token.col, token.kind, token.value);
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn parse_command(args: ParseArgs, config: &CliConfig) -> Result<ExitCode, CliError> {
    let source = load_dot_source(args.input.dot_file.as_deref(), args.input.dot_source.as_deref())?;
    let graph = parse(&source)?;
    let json = if config.json_pretty && !args.compact {
        serde_json::to_string_pretty(&graph)?
    } else {
        serde_json::to_string(&graph)?
    };
    println!("{json}");
    Ok(ExitCode::SUCCESS)
}

fn fmt_command(args: FmtArgs, config: &CliConfig) -> Result<ExitCode, CliError> {
    let write_target = match (args.write, args.input.dot_file.as_deref()) {
        (false, _) => None,
        (true, Some(path)) if path != Path::new("-") => Some(path.to_path_buf()),
        (true, _) => {
            return Err(CliError::Usage(
                "--write requires --dot-file pointing at a file".to_string(),
            ));
        }
    };

    let source = load_dot_source(args.input.dot_file.as_deref(), args.input.dot_source.as_deref())?;
    let rendered = normalize(&source, args.color || config.colorize)?;

    if args.check {
        if rendered == source {
            return Ok(ExitCode::SUCCESS);
        }
        eprintln!("{} is not canonically formatted", input_label(&args.input));
        return Ok(ExitCode::from(1));
    }

    match write_target {
        Some(path) => {
            if rendered == source {
                tracing::info!(path = %path.display(), "already canonical");
            } else {
                std::fs::write(&path, &rendered).map_err(|source| CliError::Write {
                    path: path.display().to_string(),
                    source,
                })?;
                tracing::info!(path = %path.display(), "rewrote file");
            }
        }
        None => print!("{rendered}"),
    }
    Ok(ExitCode::SUCCESS)
}

fn inspect_command(args: InputArgs) -> Result<ExitCode, CliError> {
    let source = load_dot_source(args.dot_file.as_deref(), args.dot_source.as_deref())?;
    let graph = parse(&source)?;
    print!("{}", summarize(&graph));
    Ok(ExitCode::SUCCESS)
}

fn summarize(graph: &Graph) -> String {
    let node_label = |node: Option<&Node>| {
        node.map(|node| node.id.clone())
            .unwrap_or_else(|| "<none>".to_string())
    };
    let mut out = String::new();
    out.push_str(&format!("name: {}\n", graph.name));
    out.push_str(&format!("nodes: {}\n", graph.nodes.len()));
    out.push_str(&format!("edges: {}\n", graph.edges.len()));
    out.push_str(&format!("subgraphs: {}\n", graph.subgraphs.len()));
    out.push_str(&format!("start: {}\n", node_label(graph.find_start_node())));
    out.push_str(&format!("exit: {}\n", node_label(graph.find_exit_node())));
    if !graph.edges.is_empty() {
        out.push_str("edge_ids:\n");
        for edge in &graph.edges {
            out.push_str(&format!("  {}\n", edge.id));
        }
    }
    out
}

fn input_label(args: &InputArgs) -> String {
    match args.dot_file.as_deref() {
        Some(path) if path != Path::new("-") => path.display().to_string(),
        Some(_) => "<stdin>".to_string(),
        None => "--dot-source".to_string(),
    }
}

fn load_dot_source(dot_file: Option<&Path>, dot_source: Option<&str>) -> Result<String, CliError> {
    match (dot_file, dot_source) {
        (Some(_), Some(_)) => Err(CliError::Usage(
            "provide only one of --dot-file or --dot-source".to_string(),
        )),
        (None, None) => Err(CliError::Usage(
            "one of --dot-file or --dot-source is required".to_string(),
        )),
        (Some(path), None) if path == Path::new("-") => {
            let mut source = String::new();
            std::io::stdin()
                .read_to_string(&mut source)
                .map_err(|error| CliError::Read {
                    path: "<stdin>".to_string(),
                    source: error,
                })?;
            Ok(source)
        }
        (Some(path), None) => std::fs::read_to_string(path).map_err(|source| CliError::Read {
            path: path.display().to_string(),
            source,
        }),
        (None, Some(source)) => Ok(source.to_string()),
    }
}
