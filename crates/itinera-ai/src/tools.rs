//! Tool declarations for the travel-planning assistant.
//!
//! Three tools are exposed: `updateItinerary` (structured state sync),
//! `searchFlights` (simulated lookup), and `suggestNextSteps` (follow-up
//! chips). Parameter shapes are JSON Schema as the Gemini API expects.

use crate::ToolDefinition;

pub const UPDATE_ITINERARY: &str = "updateItinerary";
pub const SEARCH_FLIGHTS: &str = "searchFlights";
pub const SUGGEST_NEXT_STEPS: &str = "suggestNextSteps";

/// The tool set declared to the backend for every planning session.
pub fn planner_tools() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: UPDATE_ITINERARY.to_string(),
            description: "Update the structured travel itinerary. Use this to visualize \
                          flights, hotels, dining, and activities. Be specific with categories."
                .to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "title": { "type": "string", "description": "A catchy title for the trip" },
                    "destination": { "type": "string", "description": "The main location(s) of the trip" },
                    "dates": { "type": "string", "description": "Date range of the trip" },
                    "travelType": {
                        "type": "string",
                        "description": "Type of travel: Leisure, Work, Honeymoon, Adventure, Family"
                    },
                    "adults": { "type": "number", "description": "Number of adults" },
                    "children": { "type": "number", "description": "Number of children" },
                    "infants": { "type": "number", "description": "Number of infants" },
                    "days": {
                        "type": "array",
                        "description": "List of daily plans",
                        "items": {
                            "type": "object",
                            "properties": {
                                "date": { "type": "string", "description": "Day label or date e.g., 'Day 1' or '2024-05-12'" },
                                "dayTitle": { "type": "string", "description": "Theme for the day, e.g., 'Arrival & Check-in'" },
                                "activities": {
                                    "type": "array",
                                    "items": {
                                        "type": "object",
                                        "properties": {
                                            "id": { "type": "string", "description": "Unique ID for the activity (if updating existing)" },
                                            "time": { "type": "string", "description": "Start time e.g. 10:00 AM" },
                                            "endTime": { "type": "string", "description": "End time e.g. 12:00 PM" },
                                            "title": { "type": "string", "description": "Main title e.g. 'Flight to NYC'" },
                                            "subTitle": { "type": "string", "description": "Subtitle e.g. 'Flight UA123' or 'Italian Cuisine'" },
                                            "description": { "type": "string", "description": "Details about the activity" },
                                            "location": { "type": "string", "description": "Address or place name" },
                                            "category": {
                                                "type": "string",
                                                "description": "Category: flight, accommodation, dining, activity, transit, logistics"
                                            },
                                            "bookingStatus": {
                                                "type": "string",
                                                "description": "Status: booked, pending, suggested"
                                            },
                                            "notes": { "type": "string", "description": "Important notes, reservation numbers, etc." },
                                            "cost": { "type": "string", "description": "Estimated cost e.g. '$150', 'Free', '~$50/person'" },
                                            "imageQuery": { "type": "string", "description": "A short search term to find a photo of this place, e.g. 'Eiffel Tower'" },
                                            "isLocked": { "type": "boolean", "description": "If true, this activity has been saved/locked by the user. Do not change it." }
                                        }
                                    }
                                }
                            }
                        }
                    },
                    "totalEstimatedCost": { "type": "string", "description": "Total estimated trip cost (e.g. '$3,500')" }
                },
                "required": ["destination", "days"]
            }),
        },
        ToolDefinition {
            name: SEARCH_FLIGHTS.to_string(),
            description: "Search for real-world flight data (Simulated for this demo).".to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "origin": { "type": "string" },
                    "destination": { "type": "string" },
                    "date": { "type": "string" }
                },
                "required": ["origin", "destination", "date"]
            }),
        },
        ToolDefinition {
            name: SUGGEST_NEXT_STEPS.to_string(),
            description: "Provide a list of suggested follow-up actions or questions for the \
                          user to choose from."
                .to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "suggestions": {
                        "type": "array",
                        "description": "List of short, actionable suggestions for the user, \
                                        e.g., 'Swap the hotel', 'Add a dinner reservation'",
                        "items": { "type": "string" }
                    }
                },
                "required": ["suggestions"]
            }),
        },
    ]
}

/// Convert a tool definition to the Gemini API format.
pub fn to_gemini_tool(tool: &ToolDefinition) -> serde_json::Value {
    serde_json::json!({
        "name": tool.name,
        "description": tool.description,
        "parameters": tool.parameters,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn planner_tools_declares_all_three() {
        let tools = planner_tools();
        let names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            vec![UPDATE_ITINERARY, SEARCH_FLIGHTS, SUGGEST_NEXT_STEPS]
        );
    }

    #[test]
    fn update_itinerary_requires_destination_and_days() {
        let tools = planner_tools();
        let update = &tools[0];
        let required = update.parameters["required"].as_array().unwrap();
        assert!(required.iter().any(|v| v == "destination"));
        assert!(required.iter().any(|v| v == "days"));
    }

    #[test]
    fn gemini_format_carries_schema() {
        let tools = planner_tools();
        let gem = to_gemini_tool(&tools[1]);
        assert_eq!(gem["name"], SEARCH_FLIGHTS);
        assert_eq!(gem["parameters"]["required"].as_array().unwrap().len(), 3);
    }
}
