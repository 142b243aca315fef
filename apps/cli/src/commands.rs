//! CLI command definitions, routing, and tracing setup.

use std::io::Read;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use remixstudio_core::export::{ExportConfig, export_dataset};
use remixstudio_core::pipeline::{ImportConfig, ProgressReporter, import_deck};
use remixstudio_core::preview;
use remixstudio_core::session::{list_sessions, resolve_session};
use remixstudio_shared::{AppConfig, expand_home, init_config, load_config};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Remix Studio — label slide decks into image-prompt datasets.
#[derive(Parser)]
#[command(
    name = "remixstudio",
    version,
    about = "Turn slide decks into labeled image-prompt datasets.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Import a .pptx deck and create a labeling session.
    Import {
        /// Path to the .pptx file.
        deck: String,

        /// Human-readable session name (defaults to the deck file stem).
        #[arg(short, long)]
        name: Option<String>,

        /// Dataset id for the first slide (defaults from config).
        #[arg(long)]
        start_id: Option<u64>,

        /// Maximum number of slides to process (defaults from config).
        #[arg(long)]
        max_slides: Option<usize>,

        /// Sessions root directory (defaults from config).
        #[arg(long)]
        root: Option<String>,
    },

    /// List labeling sessions.
    List {
        /// Sessions root directory (defaults from config).
        #[arg(long)]
        root: Option<String>,
    },

    /// Export labeled slides as a dataset zip.
    Export {
        /// Session id or path.
        #[arg(short, long)]
        session: String,

        /// Output zip path (defaults to <session>/exports/dataset.zip).
        #[arg(short, long)]
        out: Option<String>,

        /// Include slides still marked pending.
        #[arg(long)]
        all: bool,

        /// Sessions root directory (defaults from config).
        #[arg(long)]
        root: Option<String>,
    },

    /// Build (and optionally download) a preview render URL for a prompt.
    Preview {
        /// Prompt text to render.
        #[arg(short, long)]
        prompt: String,

        /// Render seed; random when omitted.
        #[arg(long)]
        seed: Option<u32>,

        /// Download the rendered image.
        #[arg(long)]
        fetch: bool,

        /// Where to save the download (defaults to preview.png).
        #[arg(long)]
        out: Option<String>,
    },

    /// Remix suggestion helpers.
    Suggest {
        /// Suggest subcommand.
        #[command(subcommand)]
        action: SuggestAction,
    },

    /// Launch the interactive TUI.
    Tui {
        /// Session id or path to open directly.
        #[arg(short, long)]
        session: Option<String>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Suggest subcommands.
#[derive(Subcommand)]
pub(crate) enum SuggestAction {
    /// Print random suggestions from the built-in catalog.
    Random {
        /// How many to print.
        #[arg(short = 'n', long, default_value = "3")]
        count: usize,
    },
    /// Parse pasted assistant output into label/prompt pairs.
    Parse {
        /// File to read (stdin when omitted).
        file: Option<String>,

        /// Emit JSON instead of text.
        #[arg(long)]
        json: bool,
    },
    /// Print the instruction block to paste into an assistant.
    Instructions,
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "remixstudio=info",
        1 => "remixstudio=debug",
        _ => "remixstudio=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Import {
            deck,
            name,
            start_id,
            max_slides,
            root,
        } => {
            cmd_import(
                &deck,
                name.as_deref(),
                start_id,
                max_slides,
                root.as_deref(),
            )
            .await
        }
        Command::List { root } => cmd_list(root.as_deref()).await,
        Command::Export {
            session,
            out,
            all,
            root,
        } => cmd_export(&session, out.as_deref(), all, root.as_deref()).await,
        Command::Preview {
            prompt,
            seed,
            fetch,
            out,
        } => cmd_preview(&prompt, seed, fetch, out.as_deref()).await,
        Command::Suggest { action } => match action {
            SuggestAction::Random { count } => cmd_suggest_random(count),
            SuggestAction::Parse { file, json } => cmd_suggest_parse(file.as_deref(), json),
            SuggestAction::Instructions => cmd_suggest_instructions(),
        },
        Command::Tui { session } => cmd_tui(session.as_deref()).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

/// Resolve the sessions root: explicit flag, else config default.
fn sessions_root(root: Option<&str>, config: &AppConfig) -> PathBuf {
    match root {
        Some(path) => PathBuf::from(path),
        None => expand_home(&config.defaults.sessions_root),
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_import(
    deck: &str,
    name: Option<&str>,
    start_id: Option<u64>,
    max_slides: Option<usize>,
    root: Option<&str>,
) -> Result<()> {
    let config = load_config()?;

    let deck_path = PathBuf::from(deck);
    if !deck_path.is_file() {
        return Err(eyre!("no file found at '{deck}'"));
    }

    // Default the session name to the deck file stem
    let session_name = name.map(String::from).unwrap_or_else(|| {
        deck_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Untitled deck".into())
    });

    let import_config = ImportConfig {
        deck_path,
        name: session_name.clone(),
        sessions_root: sessions_root(root, &config),
        start_id: start_id.unwrap_or(config.defaults.start_id),
        max_slides: max_slides.unwrap_or(config.defaults.max_slides),
        tool_version: env!("CARGO_PKG_VERSION").to_string(),
    };

    info!(deck, name = %session_name, "importing slide deck");

    let reporter = CliProgress::new();
    let result = import_deck(&import_config, &reporter).await?;

    println!();
    println!("  Session created!");
    println!("  ID:      {}", result.session_id);
    println!("  Name:    {session_name}");
    println!("  Slides:  {}", result.slide_count);
    if result.slides_skipped > 0 {
        println!(
            "  Skipped: {} (no embedded image)",
            result.slides_skipped
        );
    }
    if result.truncated {
        println!(
            "  Note:    deck truncated at {} slides",
            import_config.max_slides
        );
    }
    println!("  Path:    {}", result.session_path.display());
    println!("  Time:    {:.1}s", result.elapsed.as_secs_f64());
    println!();

    Ok(())
}

async fn cmd_list(root: Option<&str>) -> Result<()> {
    let config = load_config()?;
    let root = sessions_root(root, &config);

    let sessions = list_sessions(&root).await?;
    if sessions.is_empty() {
        println!("No sessions under {}", root.display());
        return Ok(());
    }

    println!();
    println!(
        "  {:<38} {:<24} {:>6} {:>8}  Created",
        "ID", "Name", "Slides", "Labeled"
    );
    for session in &sessions {
        println!(
            "  {:<38} {:<24} {:>6} {:>8}  {}",
            session.id,
            shorten(&session.name, 24),
            session.slide_count,
            session.labeled,
            session.created_at.format("%Y-%m-%d %H:%M")
        );
    }
    println!();

    Ok(())
}

async fn cmd_export(
    session: &str,
    out: Option<&str>,
    all: bool,
    root: Option<&str>,
) -> Result<()> {
    let config = load_config()?;
    let root = sessions_root(root, &config);
    let session_path = resolve_session(&root, session)?;

    info!(session, include_pending = all, "exporting dataset");

    let export_config = ExportConfig {
        session_path,
        out: out.map(PathBuf::from),
        include_pending: all,
    };
    let result = export_dataset(&export_config).await?;

    println!();
    println!("  Dataset exported!");
    println!("  File:    {}", result.zip_path.display());
    println!("  Records: {}", result.record_count);
    println!("  Images:  {}", result.image_count);
    println!("  Size:    {} bytes", result.size_bytes);
    println!("  SHA256:  {}", result.sha256);
    println!("  Time:    {:.1}s", result.elapsed.as_secs_f64());
    println!();

    Ok(())
}

async fn cmd_preview(
    prompt: &str,
    seed: Option<u32>,
    fetch: bool,
    out: Option<&str>,
) -> Result<()> {
    let config = load_config()?;

    let seed = seed.unwrap_or_else(|| preview::random_seed(&mut rand::thread_rng()));
    let url = preview::preview_url(&config.preview, prompt, seed)?;
    println!("{url}");

    if fetch {
        let dest = out
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("preview.png"));
        let saved = preview::fetch_preview(&url, &dest).await?;
        println!("Saved preview to {}", saved.display());
    }

    Ok(())
}

fn cmd_suggest_random(count: usize) -> Result<()> {
    let mut rng = rand::thread_rng();
    for _ in 0..count {
        let suggestion = remixstudio_suggest::random_suggestion(&mut rng);
        println!("{}: {}", suggestion.label, suggestion.prompt);
    }
    Ok(())
}

fn cmd_suggest_parse(file: Option<&str>, json: bool) -> Result<()> {
    let text = match file {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| eyre!("cannot read '{path}': {e}"))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| eyre!("cannot read stdin: {e}"))?;
            buf
        }
    };

    let pairs = remixstudio_suggest::parse_pasted(&text);
    if pairs.is_empty() {
        return Err(eyre!("no prompt lines recognized in the input"));
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&pairs)?);
    } else {
        for pair in &pairs {
            println!("{}: {}", pair.label, pair.prompt);
        }
    }

    Ok(())
}

fn cmd_suggest_instructions() -> Result<()> {
    println!("{}", remixstudio_suggest::assistant_instructions());
    Ok(())
}

async fn cmd_tui(session: Option<&str>) -> Result<()> {
    // The TUI ships as a sibling binary; fall back to PATH lookup.
    let tui_binary = format!("remixstudio-tui{}", std::env::consts::EXE_SUFFIX);
    let program = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(&tui_binary)))
        .filter(|p| p.exists())
        .unwrap_or_else(|| PathBuf::from(&tui_binary));

    info!(program = %program.display(), "launching TUI");

    let mut command = std::process::Command::new(&program);
    if let Some(session) = session {
        command.arg("--session").arg(session);
    }

    let status = command
        .stdin(std::process::Stdio::inherit())
        .stdout(std::process::Stdio::inherit())
        .stderr(std::process::Stdio::inherit())
        .status()
        .map_err(|e| eyre!("failed to launch '{}': {e}", program.display()))?;

    if !status.success() {
        return Err(eyre!(
            "TUI exited with status: {}",
            status.code().unwrap_or(-1)
        ));
    }

    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn slide_written(&self, id: u64, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Writing slide [{current}/{total}] id {id}"));
    }

    fn done(&self) {
        self.spinner.finish_and_clear();
    }
}

/// Truncate a name for table display.
fn shorten(name: &str, max: usize) -> String {
    if name.chars().count() <= max {
        name.to_string()
    } else {
        let cut: String = name.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}
