//! Case-insensitive event search.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::event::Event;

/// Which event field a search query is matched against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchField {
    /// Title, description or location.
    #[default]
    Any,
    Title,
    #[serde(rename = "desc")]
    Description,
    Location,
}

impl SearchField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::Title => "title",
            Self::Description => "desc",
            Self::Location => "location",
        }
    }
}

impl fmt::Display for SearchField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "any" => Ok(Self::Any),
            "title" => Ok(Self::Title),
            "desc" | "description" => Ok(Self::Description),
            "location" => Ok(Self::Location),
            other => Err(format!(
                "unknown search field '{}' (expected any, title, desc or location)",
                other
            )),
        }
    }
}

/// Returns true if `event` matches `query` in the given field.
///
/// Matching is a case-insensitive substring test. Absent optional fields
/// never match, not even an empty query.
pub fn matches_event(event: &Event, query: &str, field: SearchField) -> bool {
    let query = query.to_lowercase();
    let contains = |text: Option<&str>| {
        text.is_some_and(|text| text.to_lowercase().contains(&query))
    };

    let title = Some(event.summary.as_str());
    let description = event.description.as_deref();
    let location = event.location.as_deref();

    match field {
        SearchField::Title => contains(title),
        SearchField::Description => contains(description),
        SearchField::Location => contains(location),
        SearchField::Any => contains(title) || contains(description) || contains(location),
    }
}
