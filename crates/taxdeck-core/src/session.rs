// ── Edit session ──
//
// The transient editing workflow for one tax record. The draft holds only
// the two editable fields; the full record is re-fetched immediately before
// writing so fields the draft never saw are carried through unchanged.
//
// Lifecycle: Closed -> Open(Ready) -> Saving -> Closed, with
// Saving -> Ready on failure. "Closed" is the absence of a session; this
// struct only exists while the form is open.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

use taxdeck_api::{ApiClient, Country, Tax};

use crate::error::CoreError;

/// Identity of one editing workflow.
///
/// Async completions (country load, save result) are tagged with the id of
/// the session that issued them. A completion whose id no longer matches
/// the live session is dropped instead of mutating a form the user already
/// closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

impl SessionId {
    /// Allocate the next id. Monotonic for the life of the process.
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Where the session is in its save lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    /// Drafts editable, save and cancel available.
    #[default]
    Ready,
    /// A save request is in flight. Input and close are suppressed until
    /// the result arrives -- abandoning an unobservable write is worse
    /// than a short wait.
    Saving,
}

/// The trimmed, validated draft handed to [`push_edit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavePayload {
    pub name: String,
    pub country: String,
}

/// Editing state for one tax record.
pub struct EditSession {
    id: SessionId,
    tax_id: String,
    /// Draft name, seeded from the record and edited freely.
    pub name: String,
    /// Draft country name (the record stores names, not country ids).
    pub country: String,
    countries: Vec<Country>,
    phase: SessionPhase,
    error: Option<String>,
}

impl EditSession {
    /// Open a session for `tax`, seeding the drafts from its current values.
    ///
    /// Country reference data is not loaded here -- the caller kicks off
    /// that fetch and delivers the result via [`set_countries`] or, on
    /// failure, [`set_error`]. A failed country load is non-fatal: the
    /// drafts stay editable with the seeded values.
    ///
    /// [`set_countries`]: Self::set_countries
    /// [`set_error`]: Self::set_error
    pub fn open(tax: &Tax) -> Self {
        Self {
            id: SessionId::next(),
            tax_id: tax.id.clone(),
            name: tax.name.clone(),
            country: tax.country.clone(),
            countries: Vec::new(),
            phase: SessionPhase::Ready,
            error: None,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn tax_id(&self) -> &str {
        &self.tax_id
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_saving(&self) -> bool {
        self.phase == SessionPhase::Saving
    }

    /// Whether a close request should be honored right now. Close is
    /// ignored mid-save so an in-flight write always has an observer.
    pub fn may_close(&self) -> bool {
        self.phase != SessionPhase::Saving
    }

    pub fn countries(&self) -> &[Country] {
        &self.countries
    }

    /// Deliver the country reference data for the picker.
    pub fn set_countries(&mut self, countries: Vec<Country>) {
        self.countries = countries;
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Surface an inline error without changing phase.
    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Validate the drafts and enter `Saving`.
    ///
    /// Checks run in order: name presence, then country presence, both
    /// after trimming. On failure the session stays `Ready` with the
    /// reason displayed, and nothing has touched the network. On success
    /// the trimmed payload is returned for [`push_edit`].
    pub fn begin_save(&mut self) -> Result<SavePayload, CoreError> {
        if self.phase == SessionPhase::Saving {
            return Err(CoreError::Internal("save already in flight".into()));
        }

        let name = self.name.trim();
        if name.is_empty() {
            let err = CoreError::validation("Name is required");
            self.error = Some(err.to_string());
            return Err(err);
        }

        let country = self.country.trim();
        if country.is_empty() {
            let err = CoreError::validation("Country is required");
            self.error = Some(err.to_string());
            return Err(err);
        }

        self.error = None;
        self.phase = SessionPhase::Saving;
        Ok(SavePayload {
            name: name.to_owned(),
            country: country.to_owned(),
        })
    }

    /// Record a failed save: back to `Ready`, reason displayed, form
    /// re-submittable.
    pub fn save_failed(&mut self, message: impl Into<String>) {
        self.phase = SessionPhase::Ready;
        self.error = Some(message.into());
    }
}

/// Overlay the trimmed drafts onto a freshly fetched record.
///
/// Exactly `name` and `country` are replaced; every other field of
/// `current`, including ones this application never interprets, passes
/// through untouched.
pub fn merge_draft(mut current: Tax, name: &str, country: &str) -> Tax {
    current.name = name.to_owned();
    current.country = country.to_owned();
    current
}

/// The read-modify-write save cycle.
///
/// Re-fetches the full current record by id, overlays the drafts, and
/// writes the merged record back, returning the service's canonical
/// post-write representation. The re-fetch exists because the draft only
/// ever held two fields; without it a write would silently drop whatever
/// else the record carries. Best-effort freshness only -- a concurrent
/// remote write between the re-fetch and the PUT is not detected.
pub async fn push_edit(
    client: &ApiClient,
    tax_id: &str,
    payload: &SavePayload,
) -> Result<Tax, CoreError> {
    let current = client.get_tax(tax_id).await.map_err(|e| {
        if e.is_not_found() {
            CoreError::TaxNotFound {
                id: tax_id.to_owned(),
            }
        } else {
            e.into()
        }
    })?;

    let merged = merge_draft(current, &payload.name, &payload.country);
    let saved = client.update_tax(tax_id, &merged).await?;
    debug!(id = %saved.id, "tax updated");
    Ok(saved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn sample_tax() -> Tax {
        Tax::new("1", "VAT", "France")
    }

    #[test]
    fn open_seeds_drafts_from_record() {
        let session = EditSession::open(&sample_tax());
        assert_eq!(session.name, "VAT");
        assert_eq!(session.country, "France");
        assert_eq!(session.tax_id(), "1");
        assert_eq!(session.phase(), SessionPhase::Ready);
        assert!(session.error().is_none());
    }

    #[test]
    fn session_ids_are_unique() {
        let a = EditSession::open(&sample_tax());
        let b = EditSession::open(&sample_tax());
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn begin_save_trims_drafts() {
        let mut session = EditSession::open(&sample_tax());
        session.name = "  VAT2  ".into();
        session.country = "\tGermany\n".into();

        let payload = session.begin_save().expect("valid drafts");
        assert_eq!(payload.name, "VAT2");
        assert_eq!(payload.country, "Germany");
        assert!(session.is_saving());
    }

    #[test]
    fn whitespace_name_fails_validation() {
        let mut session = EditSession::open(&sample_tax());
        session.name = "   ".into();

        let err = session.begin_save().unwrap_err();
        assert!(err.is_validation());
        assert_eq!(err.to_string(), "Name is required");
        // Failure leaves the session Ready and re-submittable.
        assert_eq!(session.phase(), SessionPhase::Ready);
        assert_eq!(session.error(), Some("Name is required"));
    }

    #[test]
    fn empty_country_fails_validation() {
        let mut session = EditSession::open(&sample_tax());
        session.country = String::new();

        let err = session.begin_save().unwrap_err();
        assert_eq!(err.to_string(), "Country is required");
        assert_eq!(session.phase(), SessionPhase::Ready);
    }

    #[test]
    fn name_is_checked_before_country() {
        let mut session = EditSession::open(&sample_tax());
        session.name = String::new();
        session.country = String::new();

        let err = session.begin_save().unwrap_err();
        assert_eq!(err.to_string(), "Name is required");
    }

    #[test]
    fn close_suppressed_while_saving() {
        let mut session = EditSession::open(&sample_tax());
        assert!(session.may_close());

        session.begin_save().expect("valid drafts");
        assert!(!session.may_close());

        session.save_failed("boom");
        assert!(session.may_close());
        assert_eq!(session.error(), Some("boom"));
    }

    #[test]
    fn double_save_is_rejected() {
        let mut session = EditSession::open(&sample_tax());
        session.begin_save().expect("valid drafts");
        assert!(session.begin_save().is_err());
        assert!(session.is_saving());
    }

    #[test]
    fn merge_draft_preserves_unknown_fields() {
        // Concrete scenario: the re-fetched record carries a `rate` the
        // draft never saw; it must survive the overlay.
        let fetched: Tax = serde_json::from_value(json!({
            "id": "1",
            "name": "VAT",
            "country": "France",
            "rate": 0.2
        }))
        .expect("decode");

        let merged = merge_draft(fetched, "VAT2", "Germany");

        assert_eq!(
            serde_json::to_value(&merged).expect("encode"),
            json!({
                "id": "1",
                "name": "VAT2",
                "country": "Germany",
                "rate": 0.2
            })
        );
    }
}
