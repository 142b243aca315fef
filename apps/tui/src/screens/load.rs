//! "Load Deck" screen: import a .pptx or resume an existing session.

use std::path::PathBuf;

use crossterm::event::{KeyCode, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph};
use tokio::runtime::Runtime;

use remixstudio_core::pipeline::{ImportConfig, SilentProgress, import_deck};
use remixstudio_core::session::{SessionSummary, list_sessions};

use super::{ScreenId, SessionContext};

/// Which input field is focused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Deck,
    Name,
    StartId,
    Sessions,
}

pub(crate) struct LoadScreen {
    deck: String,
    name: String,
    start_id: String,
    focused: Field,
    editing: bool,
    sessions: Vec<SessionSummary>,
    selected: usize,
    status: String,
}

impl LoadScreen {
    pub(crate) fn new() -> Self {
        Self {
            deck: String::new(),
            name: String::new(),
            start_id: String::new(),
            focused: Field::Deck,
            editing: false,
            sessions: Vec::new(),
            selected: 0,
            status: "Enter a deck path and press 'i' to import, or pick a session.".to_string(),
        }
    }

    pub(crate) fn is_editing(&self) -> bool {
        self.editing
    }

    /// Rescan the sessions root.
    pub(crate) fn refresh_sessions(&mut self, ctx: &SessionContext, rt: &Runtime) {
        match rt.block_on(list_sessions(&ctx.sessions_root)) {
            Ok(sessions) => {
                self.status = format!(
                    "Found {} session(s) under {}.",
                    sessions.len(),
                    ctx.sessions_root.display()
                );
                self.sessions = sessions;
                self.selected = 0;
            }
            Err(e) => self.status = format!("Cannot list sessions: {e}"),
        }
    }

    pub(crate) fn draw(&self, f: &mut Frame, area: Rect, ctx: &SessionContext) {
        let panes = Layout::default()
            .direction(Direction::Horizontal)
            .margin(1)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(area);

        self.draw_form(f, panes[0], ctx);
        self.draw_sessions(f, panes[1]);
    }

    pub(crate) fn handle_key(
        &mut self,
        code: KeyCode,
        _modifiers: KeyModifiers,
        ctx: &mut SessionContext,
        rt: &Runtime,
    ) -> Option<ScreenId> {
        if self.editing {
            match code {
                KeyCode::Esc | KeyCode::Enter => self.editing = false,
                KeyCode::Backspace => {
                    if let Some(field) = self.current_field_mut() {
                        field.pop();
                    }
                }
                KeyCode::Char(c) => {
                    if let Some(field) = self.current_field_mut() {
                        field.push(c);
                    }
                }
                _ => {}
            }
            return None;
        }

        match code {
            KeyCode::Up => self.focus_prev(),
            KeyCode::Down => self.focus_next(),
            KeyCode::Char('k') if self.focused == Field::Sessions => self.focus_prev(),
            KeyCode::Char('j') if self.focused == Field::Sessions => self.focus_next(),
            KeyCode::Left => self.focused = Field::Deck,
            KeyCode::Right if !self.sessions.is_empty() => {
                self.focused = Field::Sessions;
            }
            KeyCode::Enter => match self.focused {
                Field::Sessions => return self.open_selected(ctx, rt),
                _ => self.editing = true,
            },
            KeyCode::Char('i') => return self.run_import(ctx, rt),
            KeyCode::Char('r') => self.refresh_sessions(ctx, rt),
            _ => {}
        }
        None
    }

    // -- Import & open ------------------------------------------------------

    fn run_import(&mut self, ctx: &mut SessionContext, rt: &Runtime) -> Option<ScreenId> {
        let deck = self.deck.trim();
        if deck.is_empty() {
            self.status = "Enter a deck path first.".to_string();
            return None;
        }
        let deck_path = PathBuf::from(deck);
        if !deck_path.is_file() {
            self.status = format!("No file at {}", deck_path.display());
            return None;
        }

        let start_id = if self.start_id.trim().is_empty() {
            ctx.config.defaults.start_id
        } else {
            match self.start_id.trim().parse() {
                Ok(v) => v,
                Err(_) => {
                    self.status = format!("'{}' is not a valid start id.", self.start_id);
                    return None;
                }
            }
        };

        let name = if self.name.trim().is_empty() {
            deck_path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "Untitled deck".into())
        } else {
            self.name.trim().to_string()
        };

        let config = ImportConfig {
            deck_path,
            name,
            sessions_root: ctx.sessions_root.clone(),
            start_id,
            max_slides: ctx.config.defaults.max_slides,
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
        };

        match rt.block_on(import_deck(&config, &SilentProgress)) {
            Ok(result) => {
                let session_path = result.session_path.clone();
                if let Err(e) = rt.block_on(ctx.open_session(&session_path)) {
                    self.status = format!("Imported, but cannot open session: {e}");
                    return None;
                }
                self.status = format!(
                    "Imported {} slide(s), {} skipped.",
                    result.slide_count, result.slides_skipped
                );
                Some(ScreenId::Editor)
            }
            Err(e) => {
                self.status = format!("Import failed: {e}");
                None
            }
        }
    }

    fn open_selected(&mut self, ctx: &mut SessionContext, rt: &Runtime) -> Option<ScreenId> {
        let (path, name) = {
            let summary = self.sessions.get(self.selected)?;
            (summary.path.clone(), summary.name.clone())
        };
        match rt.block_on(ctx.open_session(&path)) {
            Ok(()) => {
                self.status = format!("Opened '{name}'.");
                Some(ScreenId::Editor)
            }
            Err(e) => {
                self.status = format!("Cannot open session: {e}");
                None
            }
        }
    }

    // -- Drawing ------------------------------------------------------------

    fn draw_form(&self, f: &mut Frame, area: Rect, ctx: &SessionContext) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Deck path
                Constraint::Length(3), // Name
                Constraint::Length(3), // Start id
                Constraint::Length(2), // Hint
                Constraint::Min(1),    // Status
            ])
            .split(area);

        let deck_block = Block::default()
            .borders(Borders::ALL)
            .title(" Deck path (.pptx) ")
            .border_style(self.field_style(Field::Deck));
        f.render_widget(Paragraph::new(self.deck.as_str()).block(deck_block), chunks[0]);

        let name_block = Block::default()
            .borders(Borders::ALL)
            .title(" Session name (optional) ")
            .border_style(self.field_style(Field::Name));
        f.render_widget(Paragraph::new(self.name.as_str()).block(name_block), chunks[1]);

        let id_block = Block::default()
            .borders(Borders::ALL)
            .title(format!(
                " Start id (default {}) ",
                ctx.config.defaults.start_id
            ))
            .border_style(self.field_style(Field::StartId));
        f.render_widget(
            Paragraph::new(self.start_id.as_str()).block(id_block),
            chunks[2],
        );

        let hint = if self.editing {
            "Type to edit · Enter or Esc to stop editing"
        } else {
            "Enter to edit · i to import · r to refresh sessions"
        };
        let hint_p = Paragraph::new(hint)
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center);
        f.render_widget(hint_p, chunks[3]);

        let status_block = Block::default().borders(Borders::ALL).title(" Status ");
        f.render_widget(
            Paragraph::new(self.status.as_str())
                .wrap(ratatui::widgets::Wrap { trim: false })
                .block(status_block),
            chunks[4],
        );
    }

    fn draw_sessions(&self, f: &mut Frame, area: Rect) {
        if self.sessions.is_empty() {
            let empty = Paragraph::new(
                "No sessions found.\n\nImport a deck to create one, \
                 or press 'r' to rescan.",
            )
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title(" Sessions "));
            f.render_widget(empty, area);
            return;
        }

        let items: Vec<ListItem> = self
            .sessions
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let style = if i == self.selected && self.focused == Field::Sessions {
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD)
                } else if i == self.selected {
                    Style::default().fg(Color::Cyan)
                } else {
                    Style::default()
                };
                let prefix = if i == self.selected { "▸ " } else { "  " };
                ListItem::new(format!(
                    "{prefix}{}  {}/{} labeled  {}",
                    s.name,
                    s.labeled,
                    s.slide_count,
                    s.created_at.format("%Y-%m-%d")
                ))
                .style(style)
            })
            .collect();

        let list = List::new(items).block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" Sessions ({}) ", self.sessions.len())),
        );
        f.render_widget(list, area);
    }

    // -- Focus helpers ------------------------------------------------------

    fn field_style(&self, field: Field) -> Style {
        if self.focused == field && self.editing {
            Style::default().fg(Color::Yellow)
        } else if self.focused == field {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default()
        }
    }

    fn current_field_mut(&mut self) -> Option<&mut String> {
        match self.focused {
            Field::Deck => Some(&mut self.deck),
            Field::Name => Some(&mut self.name),
            Field::StartId => Some(&mut self.start_id),
            Field::Sessions => None,
        }
    }

    fn focus_next(&mut self) {
        match self.focused {
            Field::Deck => self.focused = Field::Name,
            Field::Name => self.focused = Field::StartId,
            Field::StartId => {
                if !self.sessions.is_empty() {
                    self.focused = Field::Sessions;
                    self.selected = 0;
                }
            }
            Field::Sessions => {
                if self.selected + 1 < self.sessions.len() {
                    self.selected += 1;
                }
            }
        }
    }

    fn focus_prev(&mut self) {
        match self.focused {
            Field::Deck => {}
            Field::Name => self.focused = Field::Deck,
            Field::StartId => self.focused = Field::Name,
            Field::Sessions => {
                if self.selected > 0 {
                    self.selected -= 1;
                } else {
                    self.focused = Field::StartId;
                }
            }
        }
    }
}
