// ── Tax list ──
//
// The authoritative in-memory tax collection. It diverges from the remote
// store freely (no polling, no subscription); it changes only on a full
// load or when a saved record is grafted back in by id.

use tracing::warn;

use taxdeck_api::Tax;

/// In-memory tax collection, kept in service order.
#[derive(Debug, Default)]
pub struct TaxList {
    taxes: Vec<Tax>,
}

impl TaxList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole collection with a freshly loaded one.
    pub fn replace_all(&mut self, taxes: Vec<Tax>) {
        self.taxes = taxes;
    }

    pub fn taxes(&self) -> &[Tax] {
        &self.taxes
    }

    pub fn get(&self, index: usize) -> Option<&Tax> {
        self.taxes.get(index)
    }

    pub fn len(&self) -> usize {
        self.taxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.taxes.is_empty()
    }

    /// Graft a saved record back in: replace the entry sharing its `id`,
    /// in place, leaving every other entry and the ordering untouched.
    ///
    /// Returns `false` (and changes nothing) when no entry matches. That
    /// should not occur in normal operation -- edits start from an entry
    /// of this list -- so it is logged rather than surfaced.
    pub fn reconcile(&mut self, saved: Tax) -> bool {
        match self.taxes.iter_mut().find(|t| t.id == saved.id) {
            Some(slot) => {
                *slot = saved;
                true
            }
            None => {
                warn!(id = %saved.id, "saved tax has no matching list entry; dropping");
                false
            }
        }
    }
}
