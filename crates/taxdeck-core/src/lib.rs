// taxdeck-core: Data-synchronization logic between taxdeck-api and the TUI.
//
// Holds the only real contracts in the system: the edit session's
// validate / read-modify-write save cycle and the list's reconcile-by-id
// rule. Everything visual lives in taxdeck-tui.

pub mod error;
pub mod list;
pub mod session;

pub use error::CoreError;
pub use list::TaxList;
pub use session::{EditSession, SavePayload, SessionId, SessionPhase, merge_draft, push_edit};

// Re-export the wire models so consumers depend on one crate.
pub use taxdeck_api::{Country, Tax};
