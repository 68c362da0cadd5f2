use anyhow::{Context, Result, anyhow};
use clap::{ArgAction, Parser, ValueEnum};
use serde_json::Value;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

use storyweb::utils::{parse_json_document, read_json_document};
use storyweb::{
    EngineConfig, GraphDocument, GraphEngine, GraphSnapshot, LayoutStrategy, ViewMode, ViewState,
    preview,
};

#[derive(Debug, Clone, PartialEq, Eq)]
enum InputSource {
    Stdin,
    File(PathBuf),
}

#[derive(Debug, Clone)]
enum OutputDestination {
    Stdout,
    File(PathBuf),
}

#[derive(Debug, Parser)]
#[command(
    name = "storyweb",
    about = "Lay out and style a character relationship graph for one chapter or the whole story."
)]
pub struct RenderArgs {
    /// Path to the roster/chapter JSON document. Use '-' to read from stdin.
    #[arg(short = 'i', long = "input")]
    input: Option<String>,

    /// Separate relationship document (defaults to the input document).
    #[arg(short = 'r', long = "relationships")]
    relationships: Option<PathBuf>,

    /// View mode to compute.
    #[arg(short = 'm', long = "mode", value_enum, default_value_t = ModeArg::Story)]
    mode: ModeArg,

    /// Zero-based chapter index for story mode (defaults to the first chapter).
    #[arg(short = 'c', long = "chapter")]
    chapter: Option<usize>,

    /// Focus a single character: others are dimmed and unrelated edges dropped.
    #[arg(long = "focus")]
    focus: Option<String>,

    /// Layout strategy (overrides the config file).
    #[arg(short = 'l', long = "layout", value_enum)]
    layout: Option<LayoutArg>,

    /// Seed for the layout jitter, for reproducible output.
    #[arg(long = "seed", conflicts_with = "no_jitter")]
    seed: Option<u64>,

    /// Disable layout jitter entirely.
    #[arg(long = "no-jitter", action = ArgAction::SetTrue)]
    no_jitter: bool,

    /// Engine configuration file (JSON).
    #[arg(long = "config")]
    config: Option<PathBuf>,

    /// Path to the output file. Use '-' to write to stdout (default).
    #[arg(short = 'o', long = "output")]
    output: Option<String>,

    /// Output format (defaults to the output file extension or json).
    #[arg(short = 'e', long = "output-format", value_enum)]
    output_format: Option<OutputFormat>,

    /// Background color for SVG previews.
    #[arg(short = 'b', long = "background-color", default_value = "#0f172a")]
    background_color: String,

    /// Suppress informational output.
    #[arg(short = 'q', long = "quiet", action = ArgAction::SetTrue, conflicts_with = "verbose")]
    quiet: bool,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
enum ModeArg {
    Summary,
    Story,
}

impl From<ModeArg> for ViewMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Summary => ViewMode::Summary,
            ModeArg::Story => ViewMode::Story,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
enum LayoutArg {
    ColumnPair,
    Pyramid,
}

impl From<LayoutArg> for LayoutStrategy {
    fn from(layout: LayoutArg) -> Self {
        match layout {
            LayoutArg::ColumnPair => LayoutStrategy::ColumnPair,
            LayoutArg::Pyramid => LayoutStrategy::Pyramid,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
enum OutputFormat {
    Json,
    Svg,
}

impl OutputFormat {
    fn from_path(path: &Path) -> Option<Self> {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
        {
            Some(ext) if ext == "json" => Some(OutputFormat::Json),
            Some(ext) if ext == "svg" => Some(OutputFormat::Svg),
            _ => None,
        }
    }
}

pub fn dispatch() -> Result<()> {
    let cli = RenderArgs::parse();
    init_tracing(cli.quiet, cli.verbose);
    run_render(cli)
}

fn init_tracing(quiet: bool, verbose: u8) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn run_render(cli: RenderArgs) -> Result<()> {
    let config = build_config(&cli)?;
    let engine = GraphEngine::new(config).context("invalid engine configuration")?;

    let input_source = parse_input(cli.input.as_deref())?;
    let roster = load_document(&input_source)?;
    let relationships = match &cli.relationships {
        Some(path) => read_json_document(path)
            .with_context(|| format!("failed to load relationships from '{}'", path.display()))?,
        None => roster.clone(),
    };

    let view = build_view(&cli, &roster, &relationships)?;
    info!(mode = view.mode.as_str(), chapter = ?view.chapter_index, "computing graph");
    let snapshot = engine.process(&roster, &relationships, &view);

    let output_dest = parse_output(cli.output.as_deref())?;
    let format = determine_format(cli.output_format, &output_dest)?;
    let output_bytes = match format {
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(&snapshot)?;
            json.push('\n');
            json.into_bytes()
        }
        OutputFormat::Svg => preview::render_svg(&snapshot, &cli.background_color)?.into_bytes(),
    };

    write_output(output_dest, &output_bytes)?;
    if !cli.quiet {
        eprintln!("{}", describe(&snapshot, &view));
    }

    Ok(())
}

fn build_config(cli: &RenderArgs) -> Result<EngineConfig> {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("failed to load config '{}'", path.display()))?,
        None => EngineConfig::default(),
    };

    if let Some(layout) = cli.layout {
        config.layout.strategy = layout.into();
    }
    if let Some(seed) = cli.seed {
        config.layout.jitter_seed = Some(seed);
    }
    if cli.no_jitter {
        config.layout.jitter = 0.0;
    }

    Ok(config)
}

fn build_view(cli: &RenderArgs, roster: &Value, relationships: &Value) -> Result<ViewState> {
    let mut view = match ViewMode::from(cli.mode) {
        ViewMode::Summary => ViewState::summary(),
        ViewMode::Story => {
            let mut chapters = GraphDocument::from_value(relationships).chapters;
            if chapters.is_empty() {
                chapters = GraphDocument::from_value(roster).chapters;
            }

            match (cli.chapter, chapters.is_empty()) {
                (None, true) => ViewState::default(),
                (index, _) => ViewState::try_story(&chapters, index.unwrap_or(0))?,
            }
        }
    };

    if let Some(focus) = &cli.focus {
        view = view.with_focus(focus.clone());
    }
    Ok(view)
}

fn describe(snapshot: &GraphSnapshot, view: &ViewState) -> String {
    let hidden = snapshot.edges.iter().filter(|e| e.hidden).count();
    let idle = snapshot.nodes.iter().filter(|n| n.is_idle).count();
    let scope = match (view.mode, view.chapter_index) {
        (ViewMode::Story, Some(index)) => snapshot
            .chapters
            .get(index)
            .map(|c| format!("chapter {} \"{}\"", index + 1, c.title))
            .unwrap_or_else(|| format!("chapter {}", index + 1)),
        (mode, _) => mode.as_str().to_string(),
    };
    format!(
        "{scope}: {} characters ({idle} idle), {} relationships ({hidden} hidden)",
        snapshot.nodes.len(),
        snapshot.edges.len()
    )
}

fn parse_input(input: Option<&str>) -> Result<InputSource> {
    match input {
        Some("-") | None => Ok(InputSource::Stdin),
        Some(path_str) => {
            let path = PathBuf::from(path_str);
            if !path.exists() {
                return Err(anyhow!("input file '{path_str}' does not exist"));
            }
            Ok(InputSource::File(path))
        }
    }
}

fn load_document(source: &InputSource) -> Result<Value> {
    match source {
        InputSource::Stdin => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            parse_json_document(&buffer).context("failed to parse document from stdin")
        }
        InputSource::File(path) => read_json_document(path)
            .with_context(|| format!("failed to load '{}'", path.display())),
    }
}

fn parse_output(output: Option<&str>) -> Result<OutputDestination> {
    match output {
        Some("-") | None => Ok(OutputDestination::Stdout),
        Some(path_str) => {
            let path = PathBuf::from(path_str);
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    return Err(anyhow!(
                        "output directory '{}' does not exist",
                        parent.display()
                    ));
                }
            }
            Ok(OutputDestination::File(path))
        }
    }
}

fn determine_format(
    preference: Option<OutputFormat>,
    output: &OutputDestination,
) -> Result<OutputFormat> {
    if let Some(fmt) = preference {
        return Ok(fmt);
    }

    match output {
        OutputDestination::Stdout => Ok(OutputFormat::Json),
        OutputDestination::File(path) => OutputFormat::from_path(path).ok_or_else(|| {
            anyhow!(
                "unable to determine output format from '{}'; please specify --output-format",
                path.display()
            )
        }),
    }
}

fn write_output(dest: OutputDestination, bytes: &[u8]) -> Result<()> {
    match dest {
        OutputDestination::Stdout => {
            let mut stdout = io::stdout();
            stdout.write_all(bytes)?;
            stdout.flush()?;
        }
        OutputDestination::File(path) => {
            fs::write(&path, bytes)
                .with_context(|| format!("failed to write '{}'", path.display()))?;
            info!(path = %path.display(), "wrote output");
        }
    }
    Ok(())
}
