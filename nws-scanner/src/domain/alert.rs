//! Alert record as delivered by the weather feed.

use serde::{Deserialize, Serialize};

/// One alert from the feed.
///
/// `id` is unique per alert revision and stable across polls, which is what
/// the seen-ID store keys on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertRecord {
    pub id: String,
    pub headline: String,
    /// Free-text list of affected regions (`areaDesc` in the feed).
    pub area_description: String,
    pub description: String,
}

impl AlertRecord {
    pub fn new(
        id: impl Into<String>,
        headline: impl Into<String>,
        area_description: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            headline: headline.into(),
            area_description: area_description.into(),
            description: description.into(),
        }
    }

    /// `"Affected region(s): <area>\n\n<description>"`, shared by the social
    /// post and email bodies.
    pub fn region_and_body(&self) -> String {
        format!(
            "Affected region(s): {}\n\n{}",
            self.area_description, self.description
        )
    }
}
