//! Itinerary merge engine.
//!
//! Folds an `updateItinerary` payload into the persisted itinerary.
//! The merge is total: every field of the payload is optional and
//! defaulted, so a malformed payload degrades field by field instead of
//! discarding the update. The one structural rule is lock preservation:
//! pinned activities (locked or booked) survive a full `days` replacement
//! even when the assistant forgets to resend them.

use serde::Deserialize;

use itinera_common::{Activity, ActivityCategory, BookingStatus, DayPlan, Itinerary, TravelType};

/// The raw `updateItinerary` payload, validated leniently at the
/// dispatcher boundary. Enum-valued fields arrive as free-form strings
/// and are normalized during conversion.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ItineraryUpdate {
    pub title: Option<String>,
    pub destination: Option<String>,
    pub dates: Option<String>,
    pub travel_type: Option<String>,
    #[serde(deserialize_with = "lenient_count")]
    pub adults: Option<u32>,
    #[serde(deserialize_with = "lenient_count")]
    pub children: Option<u32>,
    #[serde(deserialize_with = "lenient_count")]
    pub infants: Option<u32>,
    pub days: Option<Vec<DayPlanPayload>>,
    pub total_estimated_cost: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DayPlanPayload {
    pub date: String,
    pub day_title: Option<String>,
    pub activities: Vec<ActivityPayload>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActivityPayload {
    pub id: Option<String>,
    pub time: String,
    pub end_time: Option<String>,
    pub title: String,
    pub sub_title: Option<String>,
    pub description: String,
    pub location: String,
    pub category: Option<String>,
    pub cost: Option<String>,
    pub notes: Option<String>,
    pub booking_status: Option<String>,
    pub image_query: Option<String>,
    pub is_locked: bool,
}

/// Models sometimes send counts as floats ("2.0"); accept any JSON number.
fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(|v| v.as_u64().or_else(|| v.as_f64().map(|f| f.max(0.0) as u64)))
        .map(|n| u32::try_from(n).unwrap_or(u32::MAX)))
}

impl From<DayPlanPayload> for DayPlan {
    fn from(payload: DayPlanPayload) -> Self {
        Self {
            date: payload.date,
            day_title: payload.day_title,
            activities: payload.activities.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<ActivityPayload> for Activity {
    fn from(payload: ActivityPayload) -> Self {
        Self {
            id: payload.id,
            time: payload.time,
            end_time: payload.end_time,
            title: payload.title,
            sub_title: payload.sub_title,
            description: payload.description,
            location: payload.location,
            category: ActivityCategory::parse(payload.category.as_deref().unwrap_or("")),
            cost: payload.cost,
            notes: payload.notes,
            booking_status: payload
                .booking_status
                .as_deref()
                .and_then(BookingStatus::parse),
            image_query: payload.image_query,
            is_locked: payload.is_locked,
        }
    }
}

/// Fold `update` into `current`.
///
/// Scalars: incoming wins if present and non-empty. Travelers: per-field,
/// an absent field keeps the prior value (the session shell supplies the
/// 1/0/0 defaults). Days: full replacement with pinned activities
/// re-inserted.
pub fn merge_update(current: &mut Itinerary, update: ItineraryUpdate) {
    if let Some(title) = non_empty(update.title) {
        current.title = title;
    }
    if let Some(destination) = non_empty(update.destination) {
        current.destination = destination;
    }
    if let Some(dates) = non_empty(update.dates) {
        current.dates = dates;
    }
    if let Some(travel_type) = non_empty(update.travel_type) {
        current.travel_type = TravelType::parse(&travel_type);
    }
    if let Some(adults) = update.adults {
        current.travelers.adults = adults;
    }
    if let Some(children) = update.children {
        current.travelers.children = children;
    }
    if let Some(infants) = update.infants {
        current.travelers.infants = infants;
    }
    if let Some(cost) = non_empty(update.total_estimated_cost) {
        current.total_estimated_cost = Some(cost);
    }

    if let Some(day_payloads) = update.days {
        let mut incoming: Vec<DayPlan> = day_payloads.into_iter().map(Into::into).collect();
        reinsert_pinned(&current.days, &mut incoming);
        current.days = incoming;
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// Re-insert pinned activities the incoming replacement dropped.
///
/// Days are matched by date label; activities by stable id when both
/// sides carry one, otherwise by title. A pinned activity whose whole
/// day is missing gets its day appended.
fn reinsert_pinned(prior: &[DayPlan], incoming: &mut Vec<DayPlan>) {
    for day in prior {
        let pinned: Vec<&Activity> = day.activities.iter().filter(|a| a.is_pinned()).collect();
        if pinned.is_empty() {
            continue;
        }

        match incoming.iter_mut().find(|d| d.date == day.date) {
            Some(target) => {
                for activity in pinned {
                    let present = target
                        .activities
                        .iter()
                        .any(|candidate| same_activity(activity, candidate));
                    if !present {
                        target.activities.push(activity.clone());
                    }
                }
            }
            None => {
                incoming.push(DayPlan {
                    date: day.date.clone(),
                    day_title: day.day_title.clone(),
                    activities: pinned.into_iter().cloned().collect(),
                });
            }
        }
    }
}

fn same_activity(a: &Activity, b: &Activity) -> bool {
    match (&a.id, &b.id) {
        (Some(x), Some(y)) => x == y,
        _ => a.title == b.title,
    }
}
