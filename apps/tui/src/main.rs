//! Remix Studio TUI — interactive labeling interface.
//!
//! Provides screens for loading decks, editing captions and remix
//! suggestions slide by slide, and exporting datasets, built with
//! `ratatui` + `crossterm`.

mod app;
mod screens;
mod widgets;

use color_eyre::eyre::Result;

fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing()?;
    app::run(session_arg())
}

/// Pull `--session <id-or-path>` out of the argument list.
fn session_arg() -> Option<String> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--session" {
            return args.next();
        }
    }
    None
}

/// Log to a file when asked; stderr output would corrupt the terminal UI.
fn init_tracing() -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt};

    let Ok(path) = std::env::var("REMIXSTUDIO_TUI_LOG") else {
        return Ok(());
    };
    let file = std::fs::File::create(path)?;
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("remixstudio=debug")),
        )
        .with_writer(file)
        .with_ansi(false)
        .init();
    Ok(())
}
