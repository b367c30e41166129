//! Reasoning CLI
//!
//! Command-line front end for the extraction pipeline:
//! - `analyze`: one document → concepts, relationships, chains, graph
//! - `stream`: a document fed line by line, analysed in overlapping chunks
//! - `batch`: many documents analysed concurrently
//! - `domains`: the built-in domain rule-sets
//!
//! Results go to stdout as JSON; status lines and logs go to stderr.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use futures::{stream, Stream, StreamExt};
use reasoning_core::{AsyncReasoningApi, ReasoningApi, ReasoningConfig, StreamChunk};
use reasoning_domains::{builtin_info, DomainKind};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "reasoning")]
#[command(
    author,
    version,
    about = "Extract concepts, relationships and reasoning chains from text"
)]
struct Cli {
    /// More logging on stderr (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyse one document.
    Analyze {
        /// Input file (stdin when omitted or `-`)
        input: Option<PathBuf>,
        #[command(flatten)]
        setup: SetupArgs,
        /// Skip knowledge-graph assembly
        #[arg(long)]
        no_graph: bool,
        /// Output format; graph formats export only the knowledge graph
        #[arg(long, value_enum, default_value = "json")]
        format: OutputFormat,
    },

    /// Analyse a document in overlapping chunks, one JSON record per line.
    Stream {
        /// Input file (stdin when omitted or `-`)
        input: Option<PathBuf>,
        #[command(flatten)]
        setup: SetupArgs,
        /// Characters per chunk (default from config)
        #[arg(long)]
        chunk_size: Option<usize>,
        /// Characters carried over between chunks (default from config)
        #[arg(long)]
        overlap: Option<usize>,
        #[arg(long)]
        no_graph: bool,
        /// Print one merged result instead of per-chunk records
        #[arg(long)]
        merge: bool,
    },

    /// Analyse several documents concurrently; prints a JSON array in input order.
    Batch {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        #[command(flatten)]
        setup: SetupArgs,
        /// Concurrent analyses (default from config)
        #[arg(long)]
        max_workers: Option<usize>,
        #[arg(long)]
        no_graph: bool,
    },

    /// List the built-in domains with their patterns and terminology.
    Domains,
}

#[derive(Args, Debug, Clone, Default)]
struct SetupArgs {
    /// Built-in domain: medical, business, meeting or none
    #[arg(short, long, conflicts_with = "domain_file")]
    domain: Option<String>,
    /// Custom domain definition (JSON)
    #[arg(long)]
    domain_file: Option<PathBuf>,
    /// Pipeline configuration (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Merge in concepts and relationships proposed by a local Ollama model
    #[cfg(feature = "llm-ollama")]
    #[arg(long)]
    llm: bool,
    /// Ollama model used with --llm
    #[cfg(feature = "llm-ollama")]
    #[arg(long, default_value = "llama3.2:3b")]
    llm_model: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Dot,
    Graphml,
    Cytoscape,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Analyze {
            input,
            setup,
            no_graph,
            format,
        } => cmd_analyze(input.as_deref(), &setup, no_graph, format),
        Commands::Stream {
            input,
            setup,
            chunk_size,
            overlap,
            no_graph,
            merge,
        } => cmd_stream(input, &setup, chunk_size, overlap, no_graph, merge),
        Commands::Batch {
            inputs,
            setup,
            max_workers,
            no_graph,
        } => cmd_batch(&inputs, &setup, max_workers, no_graph),
        Commands::Domains => cmd_domains(),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

// ============================================================================
// Setup
// ============================================================================

fn load_config(setup: &SetupArgs) -> Result<ReasoningConfig> {
    match &setup.config {
        Some(path) => ReasoningConfig::from_json_file(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(ReasoningConfig::default()),
    }
}

fn domain_kind(setup: &SetupArgs) -> Result<DomainKind> {
    if let Some(path) = &setup.domain_file {
        return Ok(DomainKind::Custom(path.clone()));
    }
    match &setup.domain {
        Some(name) => name
            .parse()
            .with_context(|| format!("unknown domain `{name}`")),
        None => Ok(DomainKind::None),
    }
}

fn build_api(setup: &SetupArgs) -> Result<ReasoningApi> {
    #[allow(unused_mut)]
    let mut config = load_config(setup)?;
    let kind = domain_kind(setup)?;
    let domain = kind
        .resolve()
        .with_context(|| format!("failed to load domain {kind}"))?;

    #[cfg(feature = "llm-ollama")]
    {
        config.use_llm |= setup.llm;
    }

    let api = ReasoningApi::with_config(domain, config).context("invalid configuration")?;
    #[cfg(feature = "llm-ollama")]
    let api = attach_llm(api, setup)?;

    eprintln!(
        "{} {}",
        "Domain".green().bold(),
        api.domain_info().name.bold()
    );
    Ok(api)
}

#[cfg(feature = "llm-ollama")]
fn attach_llm(api: ReasoningApi, setup: &SetupArgs) -> Result<ReasoningApi> {
    use reasoning_core::enhance::{OllamaConfig, OllamaEnhancer};
    use std::sync::Arc;

    if !setup.llm {
        return Ok(api);
    }
    let enhancer = OllamaEnhancer::new(OllamaConfig {
        model: setup.llm_model.clone(),
        ..Default::default()
    })
    .context("failed to set up Ollama client")?;
    Ok(api.with_enhancer(Arc::new(enhancer)))
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")
}

// ============================================================================
// Input
// ============================================================================

fn is_stdin(input: Option<&Path>) -> bool {
    input.map_or(true, |p| p.as_os_str() == "-")
}

fn read_input(input: Option<&Path>) -> Result<String> {
    if is_stdin(input) {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("failed to read stdin")?;
        return Ok(text);
    }
    let path = input.unwrap_or(Path::new("-"));
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Lines of `reader` (newline kept) as an async stream. A read error ends the
/// stream early.
fn line_stream<R>(reader: R) -> impl Stream<Item = String>
where
    R: AsyncRead + Unpin,
{
    stream::unfold(BufReader::new(reader).lines(), |mut lines| async move {
        match lines.next_line().await {
            Ok(Some(line)) => Some((format!("{line}\n"), lines)),
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "input stream ended early");
                None
            }
        }
    })
}

// ============================================================================
// Commands
// ============================================================================

fn cmd_analyze(
    input: Option<&Path>,
    setup: &SetupArgs,
    no_graph: bool,
    format: OutputFormat,
) -> Result<()> {
    let api = build_api(setup)?;
    let text = read_input(input)?;

    let include_graph = !no_graph || format != OutputFormat::Json;
    let result = api.process_text(&text, include_graph)?;
    eprintln!(
        "{} {} concepts, {} relationships, {} chains",
        "Analyzed".green().bold(),
        result.concepts.len(),
        result.relationships.len(),
        result.reasoning_chains.len()
    );
    if let Some(err) = &result.graph_error {
        eprintln!("{} {}", "graph:".yellow().bold(), err);
    }

    let rendered = match format {
        OutputFormat::Json => serde_json::to_string_pretty(&result)?,
        graph_format => {
            let Some(graph) = &result.knowledge_graph else {
                bail!("no knowledge graph to export");
            };
            match graph_format {
                OutputFormat::Dot => graph.to_dot(),
                OutputFormat::Graphml => graph.to_graphml()?,
                OutputFormat::Cytoscape => serde_json::to_string_pretty(&graph.to_cytoscape())?,
                OutputFormat::Json => graph.to_json()?,
            }
        }
    };
    println!("{rendered}");
    Ok(())
}

fn cmd_stream(
    input: Option<PathBuf>,
    setup: &SetupArgs,
    chunk_size: Option<usize>,
    overlap: Option<usize>,
    no_graph: bool,
    merge: bool,
) -> Result<()> {
    let api = build_api(setup)?;
    let mut options = api.config().stream_options();
    if let Some(size) = chunk_size {
        options.chunk_size = size;
    }
    if let Some(overlap) = overlap {
        options.overlap = overlap;
    }
    if no_graph {
        options = options.without_graph();
    }
    let api = AsyncReasoningApi::new(api);

    runtime()?.block_on(async {
        let reader: Box<dyn AsyncRead + Unpin + Send> = match &input {
            Some(path) if !is_stdin(Some(path)) => Box::new(
                tokio::fs::File::open(path)
                    .await
                    .with_context(|| format!("failed to open {}", path.display()))?,
            ),
            _ => Box::new(tokio::io::stdin()),
        };

        let records = api.process_stream_with_progress(line_stream(reader), options, |n, preview| {
            eprintln!("{} {} {}", "Chunk".cyan().bold(), n, preview.dimmed());
        })?;

        if merge {
            let merged = api.merge_stream_results(records).await;
            eprintln!("{} {} chunks", "Merged".green().bold(), merged.chunk_count);
            println!("{}", serde_json::to_string_pretty(&merged)?);
            return Ok(());
        }

        futures::pin_mut!(records);
        let stdout = io::stdout();
        while let Some(record) = records.next().await {
            print_record(&mut stdout.lock(), &record)?;
        }
        Ok::<(), anyhow::Error>(())
    })
}

fn print_record(out: &mut impl Write, record: &StreamChunk) -> Result<()> {
    if record.result.is_error() {
        debug!(chunk = record.chunk_num, "emitting error record");
    }
    serde_json::to_writer(&mut *out, record)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

fn cmd_batch(
    inputs: &[PathBuf],
    setup: &SetupArgs,
    max_workers: Option<usize>,
    no_graph: bool,
) -> Result<()> {
    let texts = inputs
        .iter()
        .map(|path| {
            fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut api = AsyncReasoningApi::new(build_api(setup)?);
    if let Some(workers) = max_workers {
        api = api.with_max_workers(workers)?;
    }

    let results = runtime()?.block_on(api.process_batch_with_progress(
        texts,
        !no_graph,
        |done, total| {
            eprint!("\r{} {}/{}", "Batch".green().bold(), done, total);
            if done == total {
                eprintln!();
            }
        },
    ));

    let failed = results.iter().filter(|r| r.is_error()).count();
    if failed > 0 {
        eprintln!("{} {} of {} inputs failed", "warning:".yellow().bold(), failed, results.len());
    }
    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(())
}

fn cmd_domains() -> Result<()> {
    let domains = builtin_info()?;
    for info in &domains {
        eprintln!(
            "{} {} types, {} patterns",
            info.name.green().bold(),
            info.terminology.len(),
            info.patterns.len()
        );
    }
    println!("{}", serde_json::to_string_pretty(&domains)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn test_parse_analyze() {
        let cli = Cli::try_parse_from([
            "reasoning", "-vv", "analyze", "notes.txt", "--domain", "medical", "--format", "dot",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Analyze {
                input,
                setup,
                format,
                no_graph,
            } => {
                assert_eq!(input, Some(PathBuf::from("notes.txt")));
                assert_eq!(setup.domain.as_deref(), Some("medical"));
                assert_eq!(format, OutputFormat::Dot);
                assert!(!no_graph);
            }
            _ => panic!("expected analyze"),
        }
    }

    #[test]
    fn test_domain_and_domain_file_conflict() {
        let parsed = Cli::try_parse_from([
            "reasoning", "analyze", "--domain", "medical", "--domain-file", "d.json",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_batch_requires_inputs() {
        assert!(Cli::try_parse_from(["reasoning", "batch"]).is_err());
        let cli = Cli::try_parse_from(["reasoning", "batch", "a.txt", "b.txt", "--max-workers", "2"]).unwrap();
        match cli.command {
            Commands::Batch { inputs, max_workers, .. } => {
                assert_eq!(inputs.len(), 2);
                assert_eq!(max_workers, Some(2));
            }
            _ => panic!("expected batch"),
        }
    }

    #[test]
    fn test_domain_kind_selection() {
        let setup = SetupArgs {
            domain: Some("business".into()),
            ..Default::default()
        };
        assert_eq!(domain_kind(&setup).unwrap(), DomainKind::Business);

        let setup = SetupArgs {
            domain_file: Some(PathBuf::from("rules.json")),
            ..Default::default()
        };
        assert_eq!(
            domain_kind(&setup).unwrap(),
            DomainKind::Custom(PathBuf::from("rules.json"))
        );

        assert_eq!(domain_kind(&SetupArgs::default()).unwrap(), DomainKind::None);
        let setup = SetupArgs {
            domain: Some("tarot".into()),
            ..Default::default()
        };
        assert!(domain_kind(&setup).is_err());
    }

    #[test]
    fn test_read_input_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "Alice met Bob").unwrap();
        assert_eq!(read_input(Some(file.path())).unwrap(), "Alice met Bob");
        assert!(read_input(Some(Path::new("/nonexistent/input.txt"))).is_err());
    }

    #[test]
    fn test_build_api_with_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"max_workers": 2, "chunk_size": 50, "overlap": 5}}"#).unwrap();
        let setup = SetupArgs {
            config: Some(file.path().to_path_buf()),
            domain: Some("meeting".into()),
            ..Default::default()
        };

        let api = build_api(&setup).unwrap();
        assert_eq!(api.config().max_workers, 2);
        assert_eq!(api.domain_info().name, "meeting");
    }

    #[tokio::test]
    async fn test_line_stream_keeps_newlines() {
        let lines: Vec<String> = line_stream(&b"one\ntwo"[..]).collect().await;
        assert_eq!(lines, vec!["one\n", "two\n"]);
    }
}
