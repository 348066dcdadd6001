use serde::{Deserialize, Serialize};

use crate::domain::{AttractionId, AttractionKind, DayNumber};

/// One attraction as it crosses the wire. The hotel/restaurant/activity
/// split is carried by the enclosing [`DayRecord`] slots; `kind` is
/// repeated on the record so a detached attraction stays self-describing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttractionRecord {
    pub id: AttractionId,
    pub kind: AttractionKind,
    pub name: String,
}

/// One itinerary day as returned by `GET /api/days/` and
/// `POST /api/days/addDay`: the 1-based number, at most one hotel, and
/// ordered restaurant/activity lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayRecord {
    pub number: DayNumber,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hotel: Option<AttractionRecord>,
    #[serde(default)]
    pub restaurant: Vec<AttractionRecord>,
    #[serde(default)]
    pub activity: Vec<AttractionRecord>,
}

impl DayRecord {
    /// A bare day with no attractions, as minted by the create endpoint.
    pub fn empty(number: DayNumber) -> Self {
        Self {
            number,
            hotel: None,
            restaurant: Vec::new(),
            activity: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CreateDayRequest {
    pub number: DayNumber,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DeleteDayRequest {
    pub number: DayNumber,
}
