//! "Label Slides" screen: caption and remix-suggestion editing.

use crossterm::event::{KeyCode, KeyModifiers};
use rand::thread_rng;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use tokio::runtime::Runtime;

use remixstudio_core::preview::{fetch_preview, preview_url, random_seed};
use remixstudio_shared::{SUGGESTION_SLOTS, SlideStatus};
use remixstudio_suggest::{assistant_instructions, pad_to_slots, parse_pasted, random_suggestion};

use crate::widgets::centered_rect;

use super::{ScreenId, SessionContext};

/// Which editable region is focused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Caption,
    Slot(usize),
}

/// Modal overlays drawn on top of the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Overlay {
    None,
    Paste,
    Instructions,
}

pub(crate) struct EditorScreen {
    focused: Field,
    editing: bool,
    overlay: Overlay,
    paste_buffer: String,
    status: String,
}

impl EditorScreen {
    pub(crate) fn new() -> Self {
        Self {
            focused: Field::Caption,
            editing: false,
            overlay: Overlay::None,
            paste_buffer: String::new(),
            status: "Review the caption and slots, then press 's' to mark labeled.".to_string(),
        }
    }

    pub(crate) fn is_editing(&self) -> bool {
        self.editing || self.overlay != Overlay::None
    }

    pub(crate) fn draw(&self, f: &mut Frame, area: Rect, ctx: &SessionContext) {
        let Some(open) = ctx.open.as_ref() else {
            let empty = Paragraph::new(
                "No session open.\n\nImport a deck or pick a session on the Load Deck tab.",
            )
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title(" Label Slides "));
            f.render_widget(empty, area.inner(Margin::new(1, 1)));
            return;
        };
        let Some(slide) = open.slides.get(open.current) else {
            return;
        };

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Length(4), // Slide info
                Constraint::Length(5), // Caption
                Constraint::Length(4), // Slot 1
                Constraint::Length(4), // Slot 2
                Constraint::Length(4), // Slot 3
                Constraint::Length(1), // Hint
                Constraint::Min(1),    // Status
            ])
            .split(area);

        // Slide info
        let status_style = match slide.status {
            SlideStatus::Labeled => Style::default().fg(Color::Green),
            SlideStatus::Pending => Style::default().fg(Color::Yellow),
        };
        let info_lines = vec![
            Line::from(vec![
                Span::raw(format!(
                    "Slide {}/{}  ·  id {}  ·  deck position {}  ·  ",
                    open.current + 1,
                    open.slides.len(),
                    slide.id,
                    slide.slide_index
                )),
                Span::styled(slide.status.to_string(), status_style),
            ]),
            Line::from(format!("Source: {}", slide.source_text)).style(
                Style::default().fg(Color::DarkGray),
            ),
        ];
        let info = Paragraph::new(info_lines).block(
            Block::default().borders(Borders::ALL).title(format!(
                " {} · {}/{} labeled ",
                open.manifest.name,
                open.labeled_count(),
                open.slides.len()
            )),
        );
        f.render_widget(info, chunks[0]);

        // Caption
        let caption = Paragraph::new(slide.caption.as_str())
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" Caption (main prompt) ")
                    .border_style(self.field_style(Field::Caption)),
            );
        f.render_widget(caption, chunks[1]);

        // Suggestion slots
        for i in 0..SUGGESTION_SLOTS {
            let (label, prompt) = slide
                .suggestions
                .get(i)
                .map(|s| (s.label.as_str(), s.prompt.as_str()))
                .unwrap_or(("(empty)", ""));
            let slot = Paragraph::new(prompt).wrap(Wrap { trim: false }).block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!(" Slot {} · {label} ", i + 1))
                    .border_style(self.field_style(Field::Slot(i))),
            );
            f.render_widget(slot, chunks[2 + i]);
        }

        // Hint
        let hint = if self.editing {
            "Type to edit · Enter or Esc saves"
        } else {
            "Enter edit · ←/→ slide · r re-roll · p paste · i instructions · v url · f fetch · s save"
        };
        let hint_p = Paragraph::new(hint)
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center);
        f.render_widget(hint_p, chunks[5]);

        // Status
        let status_block = Block::default().borders(Borders::ALL).title(" Status ");
        f.render_widget(
            Paragraph::new(self.status.as_str())
                .wrap(Wrap { trim: false })
                .block(status_block),
            chunks[6],
        );

        match self.overlay {
            Overlay::Paste => self.draw_paste_overlay(f, area),
            Overlay::Instructions => self.draw_instructions_overlay(f, area),
            Overlay::None => {}
        }
    }

    pub(crate) fn handle_key(
        &mut self,
        code: KeyCode,
        modifiers: KeyModifiers,
        ctx: &mut SessionContext,
        rt: &Runtime,
    ) -> Option<ScreenId> {
        match self.overlay {
            Overlay::Paste => {
                self.handle_paste_key(code, modifiers, ctx, rt);
                return None;
            }
            Overlay::Instructions => {
                self.overlay = Overlay::None;
                return None;
            }
            Overlay::None => {}
        }

        if ctx.open.is_none() {
            return None;
        }

        if self.editing {
            match code {
                KeyCode::Esc | KeyCode::Enter => {
                    self.editing = false;
                    if self.persist_current(ctx, rt, None) {
                        self.status = "Saved.".to_string();
                    }
                }
                KeyCode::Backspace => {
                    if let Some(text) = self.edit_text_mut(ctx) {
                        text.pop();
                    }
                }
                KeyCode::Char(c) => {
                    if let Some(text) = self.edit_text_mut(ctx) {
                        text.push(c);
                    }
                }
                _ => {}
            }
            return None;
        }

        match code {
            KeyCode::Up => self.focus_prev(),
            KeyCode::Down => self.focus_next(),
            KeyCode::Enter => self.editing = true,
            KeyCode::Left | KeyCode::PageUp => self.change_slide(ctx, rt, -1),
            KeyCode::Right | KeyCode::PageDown => self.change_slide(ctx, rt, 1),
            KeyCode::Char('r') => self.reroll_focused(ctx, rt),
            KeyCode::Char('p') => {
                self.paste_buffer.clear();
                self.overlay = Overlay::Paste;
            }
            KeyCode::Char('i') => self.overlay = Overlay::Instructions,
            KeyCode::Char('v') => self.preview_focused(ctx, rt, false),
            KeyCode::Char('f') => self.preview_focused(ctx, rt, true),
            KeyCode::Char('s') => self.save_and_advance(ctx, rt),
            _ => {}
        }
        None
    }

    // -- Persistence & navigation -------------------------------------------

    /// Write the current slide's labels back to the session database.
    /// Returns false (with a status message) when the write fails.
    fn persist_current(
        &mut self,
        ctx: &mut SessionContext,
        rt: &Runtime,
        status: Option<SlideStatus>,
    ) -> bool {
        let Some(open) = ctx.open.as_mut() else {
            return false;
        };
        let Some(slide) = open.slides.get_mut(open.current) else {
            return false;
        };
        if let Some(s) = status {
            slide.status = s;
        }
        let result = rt.block_on(open.storage.update_labels(
            &slide.session_id,
            slide.id,
            &slide.caption,
            &slide.suggestions,
            slide.status,
        ));
        match result {
            Ok(()) => true,
            Err(e) => {
                self.status = format!("Save failed: {e}");
                false
            }
        }
    }

    fn change_slide(&mut self, ctx: &mut SessionContext, rt: &Runtime, delta: i64) {
        if !self.persist_current(ctx, rt, None) {
            return;
        }
        if let Some(open) = ctx.open.as_mut() {
            if open.slides.is_empty() {
                return;
            }
            let last = open.slides.len() as i64 - 1;
            let next = (open.current as i64 + delta).clamp(0, last);
            if next == open.current as i64 {
                self.status = if delta < 0 {
                    "Already at the first slide.".to_string()
                } else {
                    "Already at the last slide.".to_string()
                };
            } else {
                open.current = next as usize;
                self.status = "Saved.".to_string();
            }
        }
    }

    fn save_and_advance(&mut self, ctx: &mut SessionContext, rt: &Runtime) {
        if !self.persist_current(ctx, rt, Some(SlideStatus::Labeled)) {
            return;
        }
        if let Some(open) = ctx.open.as_mut() {
            if open.current + 1 < open.slides.len() {
                open.current += 1;
                self.status = format!(
                    "Slide marked labeled · {}/{} done.",
                    open.labeled_count(),
                    open.slides.len()
                );
            } else {
                self.status = format!(
                    "Slide marked labeled · {}/{} done · this was the last slide.",
                    open.labeled_count(),
                    open.slides.len()
                );
            }
        }
    }

    // -- Suggestion actions -------------------------------------------------

    fn reroll_focused(&mut self, ctx: &mut SessionContext, rt: &Runtime) {
        let Field::Slot(i) = self.focused else {
            self.status = "Focus a suggestion slot to re-roll it.".to_string();
            return;
        };
        if let Some(open) = ctx.open.as_mut() {
            if let Some(slide) = open.slides.get_mut(open.current) {
                if let Some(slot) = slide.suggestions.get_mut(i) {
                    *slot = random_suggestion(&mut thread_rng());
                }
            }
        }
        if self.persist_current(ctx, rt, None) {
            self.status = format!("Slot {} replaced with a random suggestion.", i + 1);
        }
    }

    fn apply_paste(&mut self, ctx: &mut SessionContext, rt: &Runtime) {
        let parsed = parse_pasted(&self.paste_buffer);
        self.overlay = Overlay::None;
        self.paste_buffer.clear();
        if parsed.is_empty() {
            self.status = "No valid prompts found.".to_string();
            return;
        }
        // Report the parsed count even when it exceeds the slot count.
        let parsed_count = parsed.len();
        if let Some(open) = ctx.open.as_mut() {
            if let Some(slide) = open.slides.get_mut(open.current) {
                slide.suggestions = pad_to_slots(parsed, &mut thread_rng());
            }
        }
        if self.persist_current(ctx, rt, None) {
            self.status = format!("Applied {parsed_count} suggestion(s) from paste.");
        }
    }

    // -- Preview ------------------------------------------------------------

    fn preview_focused(&mut self, ctx: &mut SessionContext, rt: &Runtime, fetch: bool) {
        let preview_cfg = ctx.config.preview.clone();
        let Some(open) = ctx.open.as_ref() else {
            return;
        };
        let Some(slide) = open.slides.get(open.current) else {
            return;
        };
        let (text, tag) = match self.focused {
            Field::Caption => (slide.caption.clone(), "caption".to_string()),
            Field::Slot(i) => match slide.suggestions.get(i) {
                Some(s) => (s.prompt.clone(), format!("slot{}", i + 1)),
                None => return,
            },
        };
        if text.trim().is_empty() {
            self.status = "Nothing to preview: the focused text is empty.".to_string();
            return;
        }
        let seed = random_seed(&mut thread_rng());
        let url = match preview_url(&preview_cfg, &text, seed) {
            Ok(url) => url,
            Err(e) => {
                self.status = format!("Preview failed: {e}");
                return;
            }
        };
        if !fetch {
            self.status = format!("Preview URL (seed {seed}): {url}");
            return;
        }
        let dest = open
            .path
            .join("previews")
            .join(format!("{}_{tag}.png", slide.id));
        match rt.block_on(fetch_preview(&url, &dest)) {
            Ok(path) => self.status = format!("Preview saved to {}", path.display()),
            Err(e) => self.status = format!("Preview fetch failed: {e}"),
        }
    }

    // -- Paste overlay ------------------------------------------------------

    fn handle_paste_key(
        &mut self,
        code: KeyCode,
        modifiers: KeyModifiers,
        ctx: &mut SessionContext,
        rt: &Runtime,
    ) {
        match code {
            KeyCode::Char('s') if modifiers.contains(KeyModifiers::CONTROL) => {
                self.apply_paste(ctx, rt);
            }
            KeyCode::Esc => {
                self.overlay = Overlay::None;
                self.paste_buffer.clear();
                self.status = "Paste cancelled.".to_string();
            }
            KeyCode::Enter => self.paste_buffer.push('\n'),
            KeyCode::Backspace => {
                self.paste_buffer.pop();
            }
            KeyCode::Char(c) => self.paste_buffer.push(c),
            _ => {}
        }
    }

    fn draw_paste_overlay(&self, f: &mut Frame, area: Rect) {
        let overlay_area = centered_rect(70, 60, area);
        let body = Paragraph::new(self.paste_buffer.as_str())
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" Paste assistant output · Ctrl-S apply · Esc cancel ")
                    .border_style(Style::default().fg(Color::Yellow)),
            );
        f.render_widget(Clear, overlay_area);
        f.render_widget(body, overlay_area);
    }

    fn draw_instructions_overlay(&self, f: &mut Frame, area: Rect) {
        let overlay_area = centered_rect(70, 70, area);
        let body = Paragraph::new(assistant_instructions())
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" Assistant instructions · press any key to close ")
                    .style(Style::default().bg(Color::DarkGray)),
            )
            .style(Style::default().fg(Color::White).bg(Color::DarkGray));
        f.render_widget(Clear, overlay_area);
        f.render_widget(body, overlay_area);
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

    fn edit_text_mut<'a>(&self, ctx: &'a mut SessionContext) -> Option<&'a mut String> {
        let open = ctx.open.as_mut()?;
        let slide = open.slides.get_mut(open.current)?;
        match self.focused {
            Field::Caption => Some(&mut slide.caption),
            Field::Slot(i) => slide.suggestions.get_mut(i).map(|s| &mut s.prompt),
        }
    }

    fn focus_next(&mut self) {
        self.focused = match self.focused {
            Field::Caption => Field::Slot(0),
            Field::Slot(i) if i + 1 < SUGGESTION_SLOTS => Field::Slot(i + 1),
            other => other,
        };
    }

    fn focus_prev(&mut self) {
        self.focused = match self.focused {
            Field::Caption => Field::Caption,
            Field::Slot(0) => Field::Caption,
            Field::Slot(i) => Field::Slot(i - 1),
        };
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
