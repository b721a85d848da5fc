//! Edit modal — the single-active edit form for one tax record.
//!
//! Wraps a [`EditSession`] from `taxdeck-core` with input handling and
//! rendering. The name is free text; the country is picked from the
//! reference list fetched when the form opens. While a save is in flight
//! every key (including Esc) is swallowed, so an unobservable write can
//! never be abandoned.

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear, List, ListItem, ListState, Paragraph};
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;
use tui_input::Input;
use tui_input::backend::crossterm::EventHandler;

use taxdeck_core::{EditSession, SessionId, Tax};

use crate::action::Action;
use crate::component::Component;
use crate::theme;

/// Which form field holds input focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Name,
    Country,
}

/// State of the country reference load, separate from the session's own
/// save lifecycle. A failed load is non-fatal: the form stays usable with
/// the seeded country value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CountriesState {
    Loading,
    Loaded,
    Failed,
}

pub struct EditorModal {
    session: EditSession,
    name_input: Input,
    focus: Field,
    picker_index: usize,
    countries_state: CountriesState,
}

impl EditorModal {
    /// Open the form for `tax`. The caller is responsible for kicking off
    /// the country reference fetch tagged with [`session_id`].
    ///
    /// [`session_id`]: Self::session_id
    pub fn new(tax: &Tax) -> Self {
        let session = EditSession::open(tax);
        let name_input = Input::default().with_value(session.name.clone());
        Self {
            session,
            name_input,
            focus: Field::Name,
            picker_index: 0,
            countries_state: CountriesState::Loading,
        }
    }

    pub fn session_id(&self) -> SessionId {
        self.session.id()
    }

    pub fn is_saving(&self) -> bool {
        self.session.is_saving()
    }

    /// Whether a close request should be honored right now.
    pub fn may_close(&self) -> bool {
        self.session.may_close()
    }

    fn try_save(&mut self) -> Option<Action> {
        match self.session.begin_save() {
            Ok(payload) => Some(Action::SaveRequested(
                self.session.id(),
                self.session.tax_id().to_owned(),
                payload,
            )),
            // Validation failure: the reason is already displayed inline.
            Err(_) => None,
        }
    }

    fn move_picker(&mut self, delta: isize) {
        let len = self.session.countries().len();
        if len == 0 {
            return;
        }
        let next = (self.picker_index as isize + delta).clamp(0, len as isize - 1);
        self.picker_index = next as usize;
    }

    /// Copy the highlighted country name into the draft.
    fn pick_country(&mut self) {
        if let Some(country) = self.session.countries().get(self.picker_index) {
            self.session.country = country.name.clone();
        }
    }

    fn render_name_field(&self, frame: &mut Frame, area: Rect) {
        let focused = self.focus == Field::Name && !self.is_saving();
        let block = Block::default()
            .title(" Name ")
            .title_style(theme::field_label())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(if focused {
                theme::border_focused()
            } else {
                theme::border_default()
            });

        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(
            Paragraph::new(self.name_input.value()).style(theme::table_row()),
            inner,
        );

        if focused {
            let cursor_x = inner.x + self.name_input.visual_cursor() as u16;
            frame.set_cursor_position((cursor_x.min(inner.right().saturating_sub(1)), inner.y));
        }
    }

    fn render_country_field(&self, frame: &mut Frame, area: Rect) {
        let focused = self.focus == Field::Country && !self.is_saving();
        let block = Block::default()
            .title(format!(" Country: {} ", self.session.country))
            .title_style(theme::field_label())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(if focused {
                theme::border_focused()
            } else {
                theme::border_default()
            });

        let inner = block.inner(area);
        frame.render_widget(block, area);

        match self.countries_state {
            CountriesState::Loading => {
                frame.render_widget(
                    Paragraph::new(Span::styled("Loading countries…", theme::key_hint())),
                    inner,
                );
            }
            CountriesState::Failed => {
                frame.render_widget(
                    Paragraph::new(Span::styled(
                        "Country list unavailable — keeping current value",
                        theme::warning_text(),
                    )),
                    inner,
                );
            }
            CountriesState::Loaded => {
                let items: Vec<ListItem> = self
                    .session
                    .countries()
                    .iter()
                    .map(|c| {
                        let marker = if c.name == self.session.country {
                            "✓ "
                        } else {
                            "  "
                        };
                        ListItem::new(format!("{marker}{}", c.name)).style(theme::table_row())
                    })
                    .collect();

                let list = List::new(items).highlight_style(theme::table_selected());
                let mut state = ListState::default();
                state.select(Some(self.picker_index));
                frame.render_stateful_widget(list, inner, &mut state);
            }
        }
    }
}

impl Component for EditorModal {
    fn init(&mut self, _action_tx: UnboundedSender<Action>) -> Result<()> {
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        // Mid-save, the form is inert: no edits, no cancel.
        if self.is_saving() {
            return Ok(None);
        }

        match (key.modifiers, key.code) {
            (_, KeyCode::Esc) => return Ok(Some(Action::CloseEditor)),
            (KeyModifiers::CONTROL, KeyCode::Char('s')) => return Ok(self.try_save()),
            (_, KeyCode::Tab) | (_, KeyCode::BackTab) => {
                self.focus = match self.focus {
                    Field::Name => Field::Country,
                    Field::Country => Field::Name,
                };
                return Ok(None);
            }
            _ => {}
        }

        match self.focus {
            Field::Name => {
                if key.code == KeyCode::Enter {
                    return Ok(self.try_save());
                }
                self.name_input
                    .handle_event(&crossterm::event::Event::Key(key));
                self.session.name = self.name_input.value().to_owned();
                Ok(None)
            }
            Field::Country => match key.code {
                KeyCode::Char('j') | KeyCode::Down => {
                    self.move_picker(1);
                    Ok(None)
                }
                KeyCode::Char('k') | KeyCode::Up => {
                    self.move_picker(-1);
                    Ok(None)
                }
                KeyCode::Enter | KeyCode::Char(' ') => {
                    self.pick_country();
                    Ok(None)
                }
                _ => Ok(None),
            },
        }
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::CountriesLoaded(sid, countries) => {
                if *sid != self.session.id() {
                    debug!("dropping country load for stale session");
                    return Ok(None);
                }
                self.session.set_countries(countries.clone());
                self.countries_state = CountriesState::Loaded;
                // Start the picker on the draft's current country
                self.picker_index = self
                    .session
                    .countries()
                    .iter()
                    .position(|c| c.name == self.session.country)
                    .unwrap_or(0);
            }
            Action::CountriesLoadFailed(sid, _) => {
                if *sid != self.session.id() {
                    debug!("dropping country load failure for stale session");
                    return Ok(None);
                }
                self.countries_state = CountriesState::Failed;
            }
            Action::SaveFailed(sid, message) => {
                if *sid != self.session.id() {
                    debug!("dropping save failure for stale session");
                    return Ok(None);
                }
                self.session.save_failed(message.clone());
            }
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let width = 56u16.min(area.width.saturating_sub(4));
        let height = 16u16.min(area.height.saturating_sub(2));
        let x = area.x + (area.width.saturating_sub(width)) / 2;
        let y = area.y + (area.height.saturating_sub(height)) / 2;
        let modal_area = Rect::new(x, y, width, height);

        frame.render_widget(Clear, modal_area);

        let block = Block::default()
            .title(" Edit Tax ")
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_focused());

        let inner = block.inner(modal_area);
        frame.render_widget(block, modal_area);

        let layout = Layout::vertical([
            Constraint::Length(1), // error line
            Constraint::Length(3), // name field
            Constraint::Min(4),    // country field
            Constraint::Length(1), // hints
        ])
        .split(inner);

        if let Some(error) = self.session.error() {
            frame.render_widget(
                Paragraph::new(Span::styled(format!(" {error}"), theme::error_text())),
                layout[0],
            );
        }

        self.render_name_field(frame, layout[1]);
        self.render_country_field(frame, layout[2]);

        let hints = if self.is_saving() {
            Line::from(Span::styled(" Saving…", theme::warning_text()))
        } else {
            Line::from(vec![
                Span::styled(" Tab ", theme::key_hint_key()),
                Span::styled("field  ", theme::key_hint()),
                Span::styled("Enter ", theme::key_hint_key()),
                Span::styled("select/save  ", theme::key_hint()),
                Span::styled("Ctrl+s ", theme::key_hint_key()),
                Span::styled("save  ", theme::key_hint()),
                Span::styled("Esc ", theme::key_hint_key()),
                Span::styled("cancel", theme::key_hint()),
            ])
        };
        frame.render_widget(Paragraph::new(hints), layout[3]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use taxdeck_core::Country;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn country(id: &str, name: &str) -> Country {
        Country {
            id: id.into(),
            name: name.into(),
            extra: serde_json::Map::new(),
        }
    }

    fn modal() -> EditorModal {
        EditorModal::new(&Tax::new("1", "VAT", "France"))
    }

    #[test]
    fn esc_closes_when_idle() {
        let mut modal = modal();
        let action = modal.handle_key_event(key(KeyCode::Esc)).expect("key");
        assert!(matches!(action, Some(Action::CloseEditor)));
    }

    #[test]
    fn all_input_suppressed_while_saving() {
        let mut modal = modal();
        let action = modal.handle_key_event(ctrl('s')).expect("key");
        assert!(matches!(action, Some(Action::SaveRequested(..))));
        assert!(modal.is_saving());
        assert!(!modal.may_close());

        // Esc, edits, and a second save are all swallowed mid-flight.
        assert!(modal.handle_key_event(key(KeyCode::Esc)).expect("key").is_none());
        assert!(modal.handle_key_event(ctrl('s')).expect("key").is_none());
        assert!(
            modal
                .handle_key_event(key(KeyCode::Char('x')))
                .expect("key")
                .is_none()
        );
    }

    #[test]
    fn save_failure_reopens_the_form() {
        let mut modal = modal();
        let sid = modal.session_id();
        modal.handle_key_event(ctrl('s')).expect("key");

        modal
            .update(&Action::SaveFailed(sid, "HTTP 500".into()))
            .expect("update");

        assert!(!modal.is_saving());
        assert!(modal.may_close());
        assert_eq!(modal.session.error(), Some("HTTP 500"));
    }

    #[test]
    fn validation_failure_emits_no_action() {
        let mut modal = modal();
        // Clear the name draft through the input path
        modal.name_input = Input::default();
        modal.session.name = String::new();

        let action = modal.handle_key_event(ctrl('s')).expect("key");
        assert!(action.is_none());
        assert!(!modal.is_saving());
        assert_eq!(modal.session.error(), Some("Name is required"));
    }

    #[test]
    fn stale_session_completions_are_dropped() {
        let mut modal = modal();
        let stale = SessionId::next();

        modal
            .update(&Action::CountriesLoaded(
                stale,
                vec![country("1", "Germany")],
            ))
            .expect("update");
        assert!(modal.session.countries().is_empty());
        assert_eq!(modal.countries_state, CountriesState::Loading);

        modal
            .update(&Action::SaveFailed(stale, "late failure".into()))
            .expect("update");
        assert!(modal.session.error().is_none());
    }

    #[test]
    fn picker_selects_country_into_draft() {
        let mut modal = modal();
        let sid = modal.session_id();
        modal
            .update(&Action::CountriesLoaded(
                sid,
                vec![country("1", "France"), country("2", "Germany")],
            ))
            .expect("update");

        // Picker starts on the seeded draft value
        assert_eq!(modal.picker_index, 0);

        modal.handle_key_event(key(KeyCode::Tab)).expect("key");
        modal.handle_key_event(key(KeyCode::Down)).expect("key");
        modal.handle_key_event(key(KeyCode::Enter)).expect("key");

        assert_eq!(modal.session.country, "Germany");
    }

    #[test]
    fn typing_updates_the_name_draft() {
        let mut modal = modal();
        modal.handle_key_event(key(KeyCode::Char('2'))).expect("key");
        assert_eq!(modal.session.name, "VAT2");
    }
}
