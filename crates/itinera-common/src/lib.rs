//! Shared types for the Itinera travel-planning engine.
//!
//! Holds the structured itinerary data model (trip, days, activities),
//! the chat message history type, and id generation. The itinerary is
//! mutated only through the merge engine in `itinera-ai`; everything
//! here is plain data.

pub mod id;
pub mod types;

pub use id::{new_id, SessionId};
pub use types::{
    Activity, ActivityCategory, BookingStatus, DayPlan, Itinerary, LoyaltyCard, Message,
    MessageRole, TravelType, TravelerInfo, UserProfile,
};
