//! Taxes screen — the list view.
//!
//! Owns the authoritative in-memory tax collection and its load state.
//! The collection changes only on a (re)load or when a saved record is
//! grafted back in by id via [`Action::TaxSaved`].

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Cell, Paragraph, Row, Table, TableState};

use taxdeck_core::TaxList;

use crate::action::Action;
use crate::component::Component;
use crate::theme;

const SPINNER_FRAMES: [&str; 4] = ["◐", "◓", "◑", "◒"];

/// Where the list load stands.
#[derive(Debug, Clone, PartialEq, Eq)]
enum LoadPhase {
    Loading,
    Failed(String),
    Loaded,
}

pub struct TaxesScreen {
    list: TaxList,
    phase: LoadPhase,
    table_state: TableState,
    spinner_frame: usize,
}

impl TaxesScreen {
    pub fn new() -> Self {
        Self {
            list: TaxList::new(),
            phase: LoadPhase::Loading,
            table_state: TableState::default(),
            spinner_frame: 0,
        }
    }

    fn selected_index(&self) -> usize {
        self.table_state.selected().unwrap_or(0)
    }

    fn select(&mut self, idx: usize) {
        let clamped = if self.list.is_empty() {
            0
        } else {
            idx.min(self.list.len() - 1)
        };
        self.table_state.select(Some(clamped));
    }

    fn move_selection(&mut self, delta: isize) {
        if self.list.is_empty() {
            return;
        }
        let current = self.selected_index() as isize;
        let next = (current + delta).clamp(0, self.list.len() as isize - 1);
        self.select(next as usize);
    }

    fn render_loading(&self, frame: &mut Frame, area: Rect) {
        let spinner = SPINNER_FRAMES[self.spinner_frame % SPINNER_FRAMES.len()];
        let line = Line::from(vec![
            Span::styled(format!("  {spinner} "), Style::default().fg(theme::ACCENT_CYAN)),
            Span::styled("Loading taxes…", theme::table_row()),
        ]);
        frame.render_widget(Paragraph::new(vec![Line::from(""), line]), area);
    }

    fn render_failed(&self, frame: &mut Frame, area: Rect, message: &str) {
        let lines = vec![
            Line::from(""),
            Line::from(Span::styled(format!("  {message}"), theme::error_text())),
            Line::from(""),
            Line::from(vec![
                Span::styled("  r ", theme::key_hint_key()),
                Span::styled("retry", theme::key_hint()),
            ]),
        ];
        frame.render_widget(Paragraph::new(lines), area);
    }

    fn render_table(&self, frame: &mut Frame, area: Rect) {
        let layout = Layout::vertical([
            Constraint::Min(1),    // table
            Constraint::Length(1), // hints
        ])
        .split(area);

        if self.list.is_empty() {
            frame.render_widget(
                Paragraph::new(vec![
                    Line::from(""),
                    Line::from(Span::styled("  No taxes found", theme::table_row())),
                ]),
                layout[0],
            );
            return;
        }

        let header = Row::new(vec![
            Cell::from("Name").style(theme::table_header()),
            Cell::from("Country").style(theme::table_header()),
        ]);

        let rows: Vec<Row> = self
            .list
            .taxes()
            .iter()
            .enumerate()
            .map(|(i, tax)| {
                let is_selected = i == self.selected_index();
                let prefix = if is_selected { "▸ " } else { "  " };
                let row_style = if is_selected {
                    theme::table_selected()
                } else {
                    theme::table_row()
                };

                Row::new(vec![
                    Cell::from(format!("{prefix}{}", tax.name)),
                    Cell::from(tax.country.clone()),
                ])
                .style(row_style)
            })
            .collect();

        let widths = [Constraint::Min(24), Constraint::Min(16)];
        let table = Table::new(rows, widths)
            .header(header)
            .row_highlight_style(theme::table_selected());

        let mut state = self.table_state.clone();
        frame.render_stateful_widget(table, layout[0], &mut state);

        let hints = Line::from(vec![
            Span::styled("  j/k ", theme::key_hint_key()),
            Span::styled("navigate  ", theme::key_hint()),
            Span::styled("Enter ", theme::key_hint_key()),
            Span::styled("edit  ", theme::key_hint()),
            Span::styled("r ", theme::key_hint_key()),
            Span::styled("reload  ", theme::key_hint()),
            Span::styled("q ", theme::key_hint_key()),
            Span::styled("quit", theme::key_hint()),
        ]);
        frame.render_widget(Paragraph::new(hints), layout[1]);
    }
}

impl Component for TaxesScreen {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                self.move_selection(1);
                Ok(None)
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.move_selection(-1);
                Ok(None)
            }
            KeyCode::Char('g') => {
                self.select(0);
                Ok(None)
            }
            KeyCode::Char('G') => {
                if !self.list.is_empty() {
                    self.select(self.list.len() - 1);
                }
                Ok(None)
            }
            KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.move_selection(10);
                Ok(None)
            }
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.move_selection(-10);
                Ok(None)
            }
            KeyCode::Char('r') => Ok(Some(Action::LoadTaxes)),
            KeyCode::Enter => {
                if self.phase != LoadPhase::Loaded {
                    return Ok(None);
                }
                Ok(self
                    .list
                    .get(self.selected_index())
                    .cloned()
                    .map(Action::OpenEditor))
            }
            _ => Ok(None),
        }
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::LoadTaxes => {
                self.phase = LoadPhase::Loading;
            }
            Action::TaxesLoaded(taxes) => {
                self.list.replace_all(taxes.clone());
                self.phase = LoadPhase::Loaded;
                // Clamp selection to the new collection
                if !self.list.is_empty() && self.selected_index() >= self.list.len() {
                    self.select(self.list.len() - 1);
                }
            }
            Action::TaxesLoadFailed(message) => {
                self.phase = LoadPhase::Failed(message.clone());
            }
            Action::TaxSaved(tax) => {
                self.list.reconcile(tax.clone());
            }
            Action::Tick => {
                self.spinner_frame = self.spinner_frame.wrapping_add(1);
            }
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let title = match self.phase {
            LoadPhase::Loaded => format!(" Taxes ({}) ", self.list.len()),
            _ => " Taxes ".to_string(),
        };
        let block = Block::default()
            .title(title)
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_focused());

        let inner = block.inner(area);
        frame.render_widget(block, area);

        match &self.phase {
            LoadPhase::Loading => self.render_loading(frame, inner),
            LoadPhase::Failed(message) => self.render_failed(frame, inner, message),
            LoadPhase::Loaded => self.render_table(frame, inner),
        }
    }
}
