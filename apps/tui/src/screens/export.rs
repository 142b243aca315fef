//! "Export" screen: bundle labeled slides into a dataset zip.

use crossterm::event::{KeyCode, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use tokio::runtime::Runtime;

use remixstudio_core::export::{ExportConfig, export_dataset};

use super::{ScreenId, SessionContext};

pub(crate) struct ExportScreen {
    include_pending: bool,
    last_export: Vec<String>,
    status: String,
}

impl ExportScreen {
    pub(crate) fn new() -> Self {
        Self {
            include_pending: false,
            last_export: Vec::new(),
            status: "Press 'e' to export the labeled slides.".to_string(),
        }
    }

    pub(crate) fn draw(&self, f: &mut Frame, area: Rect, ctx: &SessionContext) {
        let Some(open) = ctx.open.as_ref() else {
            let empty = Paragraph::new(
                "No session open.\n\nImport a deck or pick a session on the Load Deck tab.",
            )
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title(" Export "));
            f.render_widget(empty, area.inner(Margin::new(1, 1)));
            return;
        };

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Length(6), // Session summary
                Constraint::Length(7), // Last export
                Constraint::Length(1), // Hint
                Constraint::Min(1),    // Status
            ])
            .split(area);

        let total = open.slides.len();
        let labeled = open.labeled_count();
        let toggle = if self.include_pending {
            Span::styled("yes", Style::default().fg(Color::Yellow))
        } else {
            Span::raw("no")
        };
        let info_lines = vec![
            Line::from(format!("Session:  {}", open.manifest.name)),
            Line::from(format!("Path:     {}", open.path.display())),
            Line::from(format!(
                "Slides:   {total} total · {labeled} labeled · {} pending",
                total - labeled
            )),
            Line::from(vec![Span::raw("Include pending:  "), toggle]),
        ];
        let info = Paragraph::new(info_lines)
            .block(Block::default().borders(Borders::ALL).title(" Session "));
        f.render_widget(info, chunks[0]);

        let last = if self.last_export.is_empty() {
            Paragraph::new("No export yet.").style(Style::default().fg(Color::DarkGray))
        } else {
            Paragraph::new(
                self.last_export
                    .iter()
                    .map(|l| Line::from(l.as_str()))
                    .collect::<Vec<_>>(),
            )
        };
        f.render_widget(
            last.block(Block::default().borders(Borders::ALL).title(" Last export ")),
            chunks[1],
        );

        let hint = Paragraph::new("a toggle pending · e export")
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center);
        f.render_widget(hint, chunks[2]);

        let status_block = Block::default().borders(Borders::ALL).title(" Status ");
        f.render_widget(
            Paragraph::new(self.status.as_str())
                .wrap(Wrap { trim: false })
                .block(status_block),
            chunks[3],
        );
    }

    pub(crate) fn handle_key(
        &mut self,
        code: KeyCode,
        _modifiers: KeyModifiers,
        ctx: &mut SessionContext,
        rt: &Runtime,
    ) -> Option<ScreenId> {
        match code {
            KeyCode::Char('a') => {
                self.include_pending = !self.include_pending;
                self.status = if self.include_pending {
                    "Pending slides will be included.".to_string()
                } else {
                    "Only labeled slides will be exported.".to_string()
                };
            }
            KeyCode::Char('e') => self.run_export(ctx, rt),
            _ => {}
        }
        None
    }

    fn run_export(&mut self, ctx: &mut SessionContext, rt: &Runtime) {
        let Some(open) = ctx.open.as_ref() else {
            self.status = "Open a session first.".to_string();
            return;
        };
        let config = ExportConfig {
            session_path: open.path.clone(),
            out: None,
            include_pending: self.include_pending,
        };
        match rt.block_on(export_dataset(&config)) {
            Ok(result) => {
                self.last_export = vec![
                    format!("File:     {}", result.zip_path.display()),
                    format!("Records:  {}", result.record_count),
                    format!("Images:   {}", result.image_count),
                    format!("Size:     {} bytes", result.size_bytes),
                    format!("SHA256:   {}", result.sha256),
                ];
                self.status = "Export complete.".to_string();
            }
            Err(e) => self.status = format!("Export failed: {e}"),
        }
    }
}
