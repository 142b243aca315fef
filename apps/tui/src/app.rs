//! Core TUI application state and event loop.

use std::io;
use std::time::Duration;

use color_eyre::eyre::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Tabs};
use tokio::runtime::Runtime;

use remixstudio_core::session::resolve_session;
use remixstudio_shared::{expand_home, load_config};

use crate::screens::{EditorScreen, ExportScreen, LoadScreen, ScreenId, SessionContext};
use crate::widgets::{centered_rect, status_bar};

/// Application state.
pub(crate) struct App {
    /// Currently active screen tab.
    pub active_tab: usize,
    /// Available screens.
    pub screens: Vec<ScreenId>,
    /// Whether the app should quit.
    pub should_quit: bool,
    /// Status message shown in bottom bar.
    pub status: String,
    /// Whether help overlay is visible.
    pub show_help: bool,
    /// Per-screen state.
    pub load: LoadScreen,
    pub editor: EditorScreen,
    pub export: ExportScreen,
    /// Session state shared between screens.
    pub ctx: SessionContext,
    /// Runtime used to drive storage and network calls.
    pub runtime: Runtime,
}

impl App {
    fn new(runtime: Runtime, ctx: SessionContext, start_tab: usize) -> Self {
        let mut load = LoadScreen::new();
        load.refresh_sessions(&ctx, &runtime);
        Self {
            active_tab: start_tab,
            screens: vec![ScreenId::Load, ScreenId::Editor, ScreenId::Export],
            should_quit: false,
            status: "Ready · press ? for help".to_string(),
            show_help: false,
            load,
            editor: EditorScreen::new(),
            export: ExportScreen::new(),
            ctx,
            runtime,
        }
    }

    /// Whether the active screen is capturing keystrokes.
    fn is_editing(&self) -> bool {
        match self.screens[self.active_tab] {
            ScreenId::Load => self.load.is_editing(),
            ScreenId::Editor => self.editor.is_editing(),
            ScreenId::Export => false,
        }
    }
}

/// Entry point: opens the requested session if given, sets up the
/// terminal, runs the event loop, restores the terminal.
pub(crate) fn run(initial_session: Option<String>) -> Result<()> {
    let runtime = Runtime::new()?;
    let config = load_config()?;
    let sessions_root = expand_home(&config.defaults.sessions_root);

    let mut ctx = SessionContext {
        config,
        sessions_root,
        open: None,
    };

    // Resolve before touching the terminal so errors print normally
    let mut start_tab = 0;
    if let Some(selector) = initial_session {
        let path = resolve_session(&ctx.sessions_root, &selector)?;
        runtime.block_on(ctx.open_session(&path))?;
        start_tab = 1;
    }

    // Setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run app
    let result = run_app(&mut terminal, App::new(runtime, ctx, start_tab));

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    mut app: App,
) -> Result<()> {
    loop {
        terminal.draw(|f| draw(f, &app))?;

        // Poll for events with 100ms timeout for responsive UI
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                handle_key(&mut app, key.code, key.modifiers);
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

fn handle_key(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
    // Global keybindings (always active)
    match code {
        KeyCode::Char('q') | KeyCode::Char('c')
            if modifiers.contains(KeyModifiers::CONTROL) =>
        {
            app.should_quit = true;
            return;
        }
        KeyCode::Char('q') if !app.is_editing() => {
            app.should_quit = true;
            return;
        }
        KeyCode::Char('?') if !app.is_editing() => {
            app.show_help = !app.show_help;
            return;
        }
        KeyCode::Esc if app.show_help => {
            app.show_help = false;
            return;
        }
        // Tab navigation with number keys
        KeyCode::Char(c @ '1'..='3') if !app.is_editing() => {
            let idx = (c as usize) - ('1' as usize);
            if idx < app.screens.len() {
                app.active_tab = idx;
                app.status = format!("{}", app.screens[idx]);
            }
            return;
        }
        KeyCode::Tab if !app.is_editing() => {
            app.active_tab = (app.active_tab + 1) % app.screens.len();
            app.status = format!("{}", app.screens[app.active_tab]);
            return;
        }
        KeyCode::BackTab if !app.is_editing() => {
            app.active_tab = if app.active_tab == 0 {
                app.screens.len() - 1
            } else {
                app.active_tab - 1
            };
            app.status = format!("{}", app.screens[app.active_tab]);
            return;
        }
        _ => {}
    }

    // If help is showing, consume any key to dismiss
    if app.show_help {
        app.show_help = false;
        return;
    }

    // Delegate to the active screen; a screen may request navigation
    let target = match app.screens[app.active_tab] {
        ScreenId::Load => app
            .load
            .handle_key(code, modifiers, &mut app.ctx, &app.runtime),
        ScreenId::Editor => app
            .editor
            .handle_key(code, modifiers, &mut app.ctx, &app.runtime),
        ScreenId::Export => app
            .export
            .handle_key(code, modifiers, &mut app.ctx, &app.runtime),
    };

    if let Some(id) = target {
        if let Some(idx) = app.screens.iter().position(|s| *s == id) {
            app.active_tab = idx;
            app.status = format!("{id}");
        }
    }
}

fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Tab bar
            Constraint::Min(1),    // Content
            Constraint::Length(1), // Status bar
        ])
        .split(f.area());

    // Tab bar
    let tab_titles: Vec<Line> = app
        .screens
        .iter()
        .map(|s| Line::from(format!("{s}")))
        .collect();

    let tabs = Tabs::new(tab_titles)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Remix Studio "),
        )
        .select(app.active_tab)
        .style(Style::default().fg(Color::White))
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .divider(" │ ");

    f.render_widget(tabs, chunks[0]);

    // Content area
    match app.screens[app.active_tab] {
        ScreenId::Load => app.load.draw(f, chunks[1], &app.ctx),
        ScreenId::Editor => app.editor.draw(f, chunks[1], &app.ctx),
        ScreenId::Export => app.export.draw(f, chunks[1], &app.ctx),
    }

    // Status bar
    let bar = status_bar(&app.status);
    f.render_widget(bar, chunks[2]);

    // Help overlay
    if app.show_help {
        draw_help_overlay(f);
    }
}

fn draw_help_overlay(f: &mut Frame) {
    let area = centered_rect(60, 70, f.area());

    let help_text = vec![
        Line::from("Keybindings").style(Style::default().add_modifier(Modifier::BOLD)),
        Line::from(""),
        Line::from("  1-3          Switch to screen"),
        Line::from("  Tab/S-Tab    Next/previous screen"),
        Line::from("  ?            Toggle this help"),
        Line::from("  q / Ctrl-C   Quit"),
        Line::from(""),
        Line::from("Label Slides:").style(Style::default().add_modifier(Modifier::BOLD)),
        Line::from("  ↑/↓          Move between caption and slots"),
        Line::from("  Enter / Esc  Start / stop editing the field"),
        Line::from("  ←/→          Previous / next slide (saves edits)"),
        Line::from("  r            Re-roll the focused suggestion slot"),
        Line::from("  p            Paste assistant output (Ctrl-S applies)"),
        Line::from("  i            Show assistant instructions"),
        Line::from("  v            Build a preview URL for the field"),
        Line::from("  f            Download a preview image"),
        Line::from("  s            Mark labeled and advance"),
    ];

    let help = Paragraph::new(help_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Help · press any key to close ")
                .style(Style::default().bg(Color::DarkGray)),
        )
        .style(Style::default().fg(Color::White).bg(Color::DarkGray));

    // Clear background
    f.render_widget(ratatui::widgets::Clear, area);
    f.render_widget(help, area);
}
