use serde::{Deserialize, Serialize};
use std::fmt;

use crate::id::new_id;

/// Broad trip style, shown on the itinerary header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TravelType {
    Leisure,
    Work,
    Honeymoon,
    Adventure,
    Family,
    #[default]
    Unspecified,
}

impl TravelType {
    /// Lossy parse: anything unrecognized falls back to `Unspecified`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "leisure" => Self::Leisure,
            "work" => Self::Work,
            "honeymoon" => Self::Honeymoon,
            "adventure" => Self::Adventure,
            "family" => Self::Family,
            _ => Self::Unspecified,
        }
    }
}

impl fmt::Display for TravelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Leisure => "Leisure",
            Self::Work => "Work",
            Self::Honeymoon => "Honeymoon",
            Self::Adventure => "Adventure",
            Self::Family => "Family",
            Self::Unspecified => "Unspecified",
        };
        write!(f, "{s}")
    }
}

/// Fixed activity vocabulary the assistant is instructed to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ActivityCategory {
    Flight,
    Accommodation,
    Dining,
    #[default]
    Activity,
    Transit,
    Logistics,
}

impl ActivityCategory {
    /// Lossy parse: unrecognized categories normalize to `Activity`
    /// (e.g. "sightseeing" is stored as an activity).
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "flight" => Self::Flight,
            "accommodation" => Self::Accommodation,
            "dining" => Self::Dining,
            "transit" => Self::Transit,
            "logistics" => Self::Logistics,
            _ => Self::Activity,
        }
    }
}

impl fmt::Display for ActivityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Flight => "flight",
            Self::Accommodation => "accommodation",
            Self::Dining => "dining",
            Self::Activity => "activity",
            Self::Transit => "transit",
            Self::Logistics => "logistics",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Booked,
    Pending,
    Suggested,
}

impl BookingStatus {
    /// Strict parse: unrecognized statuses are dropped rather than guessed.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "booked" => Some(Self::Booked),
            "pending" => Some(Self::Pending),
            "suggested" => Some(Self::Suggested),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TravelerInfo {
    pub adults: u32,
    pub children: u32,
    pub infants: u32,
}

impl Default for TravelerInfo {
    fn default() -> Self {
        Self {
            adults: 1,
            children: 0,
            infants: 0,
        }
    }
}

/// One scheduled itinerary entry (flight, hotel night, dinner, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    /// Stable id when the assistant supplies one; matching falls back to
    /// the title otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_title: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub category: ActivityCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub booking_status: Option<BookingStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_query: Option<String>,
    #[serde(default)]
    pub is_locked: bool,
}

impl Activity {
    /// An activity the user has pinned (locked or already booked) must
    /// survive structural itinerary updates verbatim.
    pub fn is_pinned(&self) -> bool {
        self.is_locked || self.booking_status == Some(BookingStatus::Booked)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayPlan {
    /// Day label, e.g. "Day 1" or "2026-05-12".
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_title: Option<String>,
    #[serde(default)]
    pub activities: Vec<Activity>,
}

/// The single mutable itinerary root for a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Itinerary {
    pub title: String,
    pub destination: String,
    pub dates: String,
    pub travel_type: TravelType,
    pub travelers: TravelerInfo,
    pub days: Vec<DayPlan>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_estimated_cost: Option<String>,
}

impl Itinerary {
    /// The empty shell created at session start and filled in by merges.
    pub fn new_shell() -> Self {
        Self {
            title: "New Trip".to_string(),
            destination: String::new(),
            dates: String::new(),
            travel_type: TravelType::Unspecified,
            travelers: TravelerInfo::default(),
            days: Vec::new(),
            total_estimated_cost: None,
        }
    }

    pub fn activity_count(&self) -> usize {
        self.days.iter().map(|d| d.activities.len()).sum()
    }
}

impl Default for Itinerary {
    fn default() -> Self {
        Self::new_shell()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

/// One chat history entry. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: MessageRole,
    pub text: String,
    /// Suggestion chips attached to this assistant message, if any.
    #[serde(default)]
    pub suggestions: Vec<String>,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            role: MessageRole::User,
            text: text.into(),
            suggestions: Vec::new(),
        }
    }

    pub fn assistant(text: impl Into<String>, suggestions: Vec<String>) -> Self {
        Self {
            id: new_id(),
            role: MessageRole::Assistant,
            text: text.into(),
            suggestions,
        }
    }
}

/// A loyalty program the user holds; folded into the system prompt so the
/// assistant can steer bookings toward it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoyaltyCard {
    pub id: String,
    pub provider: String,
    pub card_name: String,
    pub points_balance: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default)]
    pub loyalty_cards: Vec<LoyaltyCard>,
}
