//! Ephemeral suggestion channel.
//!
//! Holds the follow-up chips for the currently displayed assistant
//! message only. Cleared at the start of every user turn so stale chips
//! never attach to the wrong message.

#[derive(Debug, Default)]
pub struct SuggestionChannel {
    items: Vec<String>,
}

impl SuggestionChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current list. An empty list is a no-op; returns
    /// whether the channel changed.
    pub fn set(&mut self, items: Vec<String>) -> bool {
        if items.is_empty() {
            return false;
        }
        self.items = items;
        true
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn current(&self) -> &[String] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.items.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_replaces_prior_list() {
        let mut channel = SuggestionChannel::new();
        assert!(channel.set(vec!["Swap the hotel".into()]));
        assert!(channel.set(vec!["Add a dinner".into(), "Find cheaper flights".into()]));
        assert_eq!(channel.current(), ["Add a dinner", "Find cheaper flights"]);
    }

    #[test]
    fn empty_set_is_ignored() {
        let mut channel = SuggestionChannel::new();
        channel.set(vec!["Swap the hotel".into()]);
        assert!(!channel.set(Vec::new()));
        assert_eq!(channel.current(), ["Swap the hotel"]);
    }

    #[test]
    fn clear_empties_channel() {
        let mut channel = SuggestionChannel::new();
        channel.set(vec!["Swap the hotel".into()]);
        channel.clear();
        assert!(channel.is_empty());
    }
}
