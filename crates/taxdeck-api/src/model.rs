// Wire models for the record service.
//
// The service is loosely typed: records carry arbitrary fields beyond the
// ones this client interprets. Each struct therefore pairs its known fields
// with a flattened extension map so that decode -> mutate -> encode keeps
// every unknown field intact.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A tax record.
///
/// `id` is the immutable identity key; `name` and `country` are the only
/// fields the application edits. Anything else the service returns lives in
/// `extra` and is written back verbatim on update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tax {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub country: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Tax {
    pub fn new(id: impl Into<String>, name: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            country: country.into(),
            extra: Map::new(),
        }
    }
}

/// A country entry, used only as a selectable value source for the tax
/// `country` field. Taxes store the country *name*, not its id -- the
/// service enforces no referential integrity between the two collections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Country {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
