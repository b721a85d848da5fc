//! All possible UI actions. Actions are the sole mechanism for state
//! mutation: key handlers and spawned network tasks both report back by
//! sending actions into the app loop.

use taxdeck_core::{Country, SavePayload, SessionId, Tax};

/// Every state transition in the TUI is expressed as an Action.
///
/// Completions of async work carry the [`SessionId`] of the edit session
/// that issued them; the app drops any completion whose id no longer
/// matches the live session, so a response arriving after the form closed
/// cannot mutate stale state.
#[derive(Debug, Clone)]
pub enum Action {
    // ── Lifecycle ──────────────────────────────────────────────────
    Quit,
    Tick,
    Render,
    Resize(u16, u16),

    // ── Tax list ──────────────────────────────────────────────────
    /// (Re-)issue the full list load. Ignored while one is in flight.
    LoadTaxes,
    TaxesLoaded(Vec<Tax>),
    TaxesLoadFailed(String),
    /// A save finished; graft the server's record into the list by id.
    TaxSaved(Tax),

    // ── Edit session ──────────────────────────────────────────────
    /// Open the edit form for the given record. Only one form at a time.
    OpenEditor(Tax),
    /// Close request; suppressed while a save is in flight.
    CloseEditor,
    /// Drafts validated; run the read-modify-write cycle.
    SaveRequested(SessionId, String, SavePayload),
    SaveCompleted(SessionId, Tax),
    SaveFailed(SessionId, String),

    // ── Country reference data ────────────────────────────────────
    CountriesLoaded(SessionId, Vec<Country>),
    CountriesLoadFailed(SessionId, String),
}
