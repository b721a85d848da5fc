//! Application core — event loop, action dispatch, request spawning.
//!
//! The App is the single owner of mutable UI state: the taxes screen, the
//! optional edit modal, and the in-flight flags. Network requests run in
//! spawned tasks and report back as actions; completions tied to an edit
//! session carry its [`SessionId`](taxdeck_core::SessionId) and are dropped
//! when they no longer match the live session.

use std::sync::Arc;
use std::time::Duration;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    text::{Line, Span},
    widgets::Paragraph,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use taxdeck_api::ApiClient;
use taxdeck_core::{CoreError, SavePayload, SessionId, push_edit};

use crate::action::Action;
use crate::component::Component;
use crate::editor::EditorModal;
use crate::event::{Event, EventReader};
use crate::screens::TaxesScreen;
use crate::theme;
use crate::tui::Tui;

/// Top-level application state and event loop.
pub struct App {
    client: Arc<ApiClient>,
    /// The list view. Owns the authoritative tax collection.
    screen: TaxesScreen,
    /// The single active edit modal, if any.
    editor: Option<EditorModal>,
    /// Guard against redundant list loads while one is in flight.
    load_in_flight: bool,
    /// Whether the app should keep running.
    running: bool,
    /// Action sender — components and spawned tasks dispatch through this.
    action_tx: mpsc::UnboundedSender<Action>,
    /// Action receiver — main loop drains this.
    action_rx: mpsc::UnboundedReceiver<Action>,
}

impl App {
    pub fn new(client: ApiClient) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();

        Self {
            client: Arc::new(client),
            screen: TaxesScreen::new(),
            editor: None,
            load_in_flight: false,
            running: true,
            action_tx,
            action_rx,
        }
    }

    /// Run the main event loop.
    pub async fn run(&mut self) -> Result<()> {
        let mut tui = Tui::new()?;
        tui.enter()?;
        self.screen.init(self.action_tx.clone())?;

        let mut events = EventReader::new(
            Duration::from_millis(250), // 4 Hz tick
            Duration::from_millis(33),  // ~30 FPS render
        );

        // Kick off the initial list load
        self.action_tx.send(Action::LoadTaxes)?;

        info!("TUI event loop started");

        while self.running {
            // 1. Wait for the next event
            let Some(event) = events.next().await else {
                break;
            };

            // 2. Map event → action(s)
            match event {
                Event::Key(key) => {
                    if let Some(action) = self.handle_key_event(key)? {
                        self.action_tx.send(action)?;
                    }
                }
                Event::Resize(w, h) => {
                    self.action_tx.send(Action::Resize(w, h))?;
                }
                Event::Tick => {
                    self.action_tx.send(Action::Tick)?;
                }
                Event::Render => {
                    self.action_tx.send(Action::Render)?;
                }
            }

            // 3. Drain and process all queued actions
            while let Ok(action) = self.action_rx.try_recv() {
                self.process_action(&action)?;

                if let Action::Render = action {
                    tui.draw(|frame| self.render(frame))?;
                }
            }
        }

        events.stop();
        info!("TUI event loop ended");
        Ok(())
    }

    /// Map a key event to an action. Global keys are handled here; the rest
    /// go to the modal when one is open, otherwise to the list screen.
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if let (KeyModifiers::CONTROL, KeyCode::Char('c')) = (key.modifiers, key.code) {
            return Ok(Some(Action::Quit));
        }

        if let Some(editor) = self.editor.as_mut() {
            return editor.handle_key_event(key);
        }

        if key.code == KeyCode::Char('q') {
            return Ok(Some(Action::Quit));
        }

        self.screen.handle_key_event(key)
    }

    /// Process a single action — update app state and propagate to components.
    fn process_action(&mut self, action: &Action) -> Result<()> {
        match action {
            Action::Quit => {
                self.running = false;
            }

            Action::Resize(_, _) => {}

            Action::LoadTaxes => {
                if self.load_in_flight {
                    debug!("list load already in flight; ignoring");
                    return Ok(());
                }
                self.load_in_flight = true;
                self.spawn_list_load();
                self.forward_to_screen(action)?;
            }

            Action::TaxesLoaded(_) | Action::TaxesLoadFailed(_) => {
                self.load_in_flight = false;
                self.forward_to_screen(action)?;
            }

            Action::OpenEditor(tax) => {
                if self.editor.is_some() {
                    // Only one session at a time
                    return Ok(());
                }
                let modal = EditorModal::new(tax);
                self.spawn_countries_load(modal.session_id());
                self.editor = Some(modal);
            }

            Action::CloseEditor => {
                if self.editor.as_ref().is_some_and(|m| !m.may_close()) {
                    debug!("close suppressed while save in flight");
                } else {
                    self.editor = None;
                }
            }

            Action::SaveRequested(sid, tax_id, payload) => {
                self.spawn_save(*sid, tax_id.clone(), payload.clone());
            }

            Action::SaveCompleted(sid, tax) => {
                if self.editor.as_ref().map(EditorModal::session_id) == Some(*sid) {
                    self.editor = None;
                    self.action_tx.send(Action::TaxSaved(tax.clone()))?;
                } else {
                    debug!("dropping save completion for stale session");
                }
            }

            // Session-tagged completions; the modal drops stale ids itself.
            Action::SaveFailed(..)
            | Action::CountriesLoaded(..)
            | Action::CountriesLoadFailed(..) => {
                if let Some(editor) = self.editor.as_mut() {
                    if let Some(follow_up) = editor.update(action)? {
                        self.action_tx.send(follow_up)?;
                    }
                }
            }

            Action::TaxSaved(_) | Action::Tick => {
                self.forward_to_screen(action)?;
            }

            // Render is handled in the main loop, not here
            Action::Render => {}
        }

        Ok(())
    }

    fn forward_to_screen(&mut self, action: &Action) -> Result<()> {
        if let Some(follow_up) = self.screen.update(action)? {
            self.action_tx.send(follow_up)?;
        }
        Ok(())
    }

    // ── Spawned requests ─────────────────────────────────────────────

    fn spawn_list_load(&self) {
        let client = Arc::clone(&self.client);
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            match client.list_taxes().await {
                Ok(taxes) => {
                    debug!(count = taxes.len(), "tax list loaded");
                    let _ = tx.send(Action::TaxesLoaded(taxes));
                }
                Err(e) => {
                    warn!(error = %e, "tax list load failed");
                    let _ = tx.send(Action::TaxesLoadFailed(CoreError::from(e).to_string()));
                }
            }
        });
    }

    fn spawn_countries_load(&self, sid: SessionId) {
        let client = Arc::clone(&self.client);
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            match client.list_countries().await {
                Ok(countries) => {
                    let _ = tx.send(Action::CountriesLoaded(sid, countries));
                }
                Err(e) => {
                    warn!(error = %e, "country load failed");
                    let _ = tx.send(Action::CountriesLoadFailed(
                        sid,
                        CoreError::from(e).to_string(),
                    ));
                }
            }
        });
    }

    fn spawn_save(&self, sid: SessionId, tax_id: String, payload: SavePayload) {
        let client = Arc::clone(&self.client);
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            match push_edit(&client, &tax_id, &payload).await {
                Ok(saved) => {
                    let _ = tx.send(Action::SaveCompleted(sid, saved));
                }
                Err(e) => {
                    warn!(error = %e, id = %tax_id, "save failed");
                    let _ = tx.send(Action::SaveFailed(sid, e.to_string()));
                }
            }
        });
    }

    // ── Rendering ────────────────────────────────────────────────────

    /// Render the full application frame.
    fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        let layout = Layout::vertical([
            Constraint::Min(1),    // list screen
            Constraint::Length(1), // status bar
        ])
        .split(area);

        self.screen.render(frame, layout[0]);
        self.render_status_bar(frame, layout[1]);

        // The modal draws on top of everything
        if let Some(editor) = &self.editor {
            editor.render(frame, area);
        }
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let host = self
            .client
            .base_url()
            .host_str()
            .unwrap_or("?")
            .to_string();

        let line = Line::from(vec![
            Span::styled(" taxdeck", theme::title_style()),
            Span::styled(format!(" │ {host}"), theme::key_hint()),
            Span::styled("  q quit", theme::key_hint()),
        ]);

        frame.render_widget(Paragraph::new(line), area);
    }

    #[cfg(test)]
    fn editor_open(&self) -> bool {
        self.editor.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taxdeck_core::Tax;

    fn app() -> App {
        let client =
            ApiClient::new("http://localhost:9", &taxdeck_api::TransportConfig::default())
                .expect("client");
        App::new(client)
    }

    fn drain(app: &mut App) {
        while let Ok(action) = app.action_rx.try_recv() {
            app.process_action(&action).expect("action");
        }
    }

    #[tokio::test]
    async fn only_one_editor_at_a_time() {
        let mut app = app();
        app.process_action(&Action::OpenEditor(Tax::new("1", "VAT", "France")))
            .expect("action");
        assert!(app.editor_open());
        let first = app.editor.as_ref().map(EditorModal::session_id);

        app.process_action(&Action::OpenEditor(Tax::new("2", "GST", "Canada")))
            .expect("action");
        assert_eq!(app.editor.as_ref().map(EditorModal::session_id), first);
    }

    #[tokio::test]
    async fn close_suppressed_while_saving_then_allowed_after_failure() {
        let mut app = app();
        app.process_action(&Action::OpenEditor(Tax::new("1", "VAT", "France")))
            .expect("action");

        let sid = app.editor.as_ref().map(EditorModal::session_id).expect("open");
        let key = KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL);
        let save = app.handle_key_event(key).expect("key").expect("save action");
        app.process_action(&save).expect("action");
        assert!(app.editor.as_ref().is_some_and(EditorModal::is_saving));

        // Mid-save close request is ignored
        app.process_action(&Action::CloseEditor).expect("action");
        assert!(app.editor_open());

        // After the failure arrives the form reopens and may close
        app.process_action(&Action::SaveFailed(sid, "HTTP 503".into()))
            .expect("action");
        app.process_action(&Action::CloseEditor).expect("action");
        assert!(!app.editor_open());
    }

    #[tokio::test]
    async fn stale_save_completion_is_dropped() {
        let mut app = app();
        app.process_action(&Action::TaxesLoaded(vec![Tax::new("1", "VAT", "France")]))
            .expect("action");

        // A completion for a session that is not the live one does nothing.
        let stale = SessionId::next();
        app.process_action(&Action::SaveCompleted(stale, Tax::new("1", "VAT2", "Germany")))
            .expect("action");
        drain(&mut app);

        assert!(!app.editor_open());
    }

    #[tokio::test]
    async fn save_completion_closes_editor_and_reconciles() {
        let mut app = app();
        app.process_action(&Action::TaxesLoaded(vec![Tax::new("1", "VAT", "France")]))
            .expect("action");
        app.process_action(&Action::OpenEditor(Tax::new("1", "VAT", "France")))
            .expect("action");

        let sid = app.editor.as_ref().map(EditorModal::session_id).expect("open");
        app.process_action(&Action::SaveCompleted(sid, Tax::new("1", "VAT2", "Germany")))
            .expect("action");
        drain(&mut app);

        assert!(!app.editor_open());
    }

    #[tokio::test]
    async fn redundant_loads_are_ignored_while_in_flight() {
        let mut app = app();
        app.process_action(&Action::LoadTaxes).expect("action");
        assert!(app.load_in_flight);
        // A second request is a no-op; the flag clears only on completion.
        app.process_action(&Action::LoadTaxes).expect("action");
        assert!(app.load_in_flight);

        app.process_action(&Action::TaxesLoaded(Vec::new()))
            .expect("action");
        assert!(!app.load_in_flight);
    }
}
