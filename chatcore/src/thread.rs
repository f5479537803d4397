//! Ordered, de-duplicated message thread for one conversation pair.
//!
//! A thread is seeded from a full history fetch and then grows as live rows
//! arrive. Rows are placed by creation timestamp rather than arrival order, so
//! a replayed or late delivery cannot break the ordering.

use crate::types::{Message, UserId};

/// The unordered pair of users that defines one conversation.
///
/// `me` and `contact` only matter for rendering; membership is symmetric.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConversationPair {
    pub me: UserId,
    pub contact: UserId,
}

impl ConversationPair {
    pub fn new(me: UserId, contact: UserId) -> Self {
        Self { me, contact }
    }

    /// True when a message between `sender` and `receiver` belongs to this pair,
    /// in either direction.
    pub fn matches(&self, sender: &UserId, receiver: &UserId) -> bool {
        (sender == &self.me && receiver == &self.contact)
            || (sender == &self.contact && receiver == &self.me)
    }

    pub fn admits(&self, message: &Message) -> bool {
        self.matches(&message.sender_id, &message.receiver_id)
    }

    /// Channel topic for this pair's live feed.
    pub fn topic(&self) -> String {
        format!("realtime:messages:{}:{}", self.me, self.contact)
    }
}

/// Outcome of offering a message to a [`Thread`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Inserted at the given index.
    Inserted(usize),
    /// A message with the same id is already present.
    Duplicate,
    /// The message belongs to a different conversation.
    Foreign,
}

#[derive(Debug, Clone)]
pub struct Thread {
    pair: ConversationPair,
    messages: Vec<Message>,
}

impl Thread {
    pub fn new(pair: ConversationPair) -> Self {
        Self {
            pair,
            messages: Vec::new(),
        }
    }

    /// Builds a thread from fetched history. Foreign rows and duplicate ids are
    /// dropped; the rest are stable-sorted by creation time.
    pub fn from_history(pair: ConversationPair, history: impl IntoIterator<Item = Message>) -> Self {
        let mut thread = Self::new(pair);
        for message in history {
            thread.insert(message);
        }
        thread
    }

    pub fn pair(&self) -> &ConversationPair {
        &self.pair
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn contains(&self, id: i64) -> bool {
        self.messages.iter().any(|m| m.id == id)
    }

    /// The trailing `n` messages (fewer if the thread is shorter).
    pub fn recent(&self, n: usize) -> &[Message] {
        let start = self.messages.len().saturating_sub(n);
        &self.messages[start..]
    }

    /// Offers a message to the thread.
    ///
    /// Equal timestamps keep arrival order: the new message goes after every
    /// message created at or before its own timestamp.
    pub fn insert(&mut self, message: Message) -> Admission {
        if !self.pair.admits(&message) {
            return Admission::Foreign;
        }
        if self.contains(message.id) {
            return Admission::Duplicate;
        }
        let index = self
            .messages
            .partition_point(|m| m.created_at <= message.created_at);
        self.messages.insert(index, message);
        Admission::Inserted(index)
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0)
            .single()
            .expect("valid timestamp")
    }

    fn msg(id: i64, from: &str, to: &str, text: &str, secs: i64) -> Message {
        Message {
            id,
            created_at: at(secs),
            content: Some(text.to_string()),
            media_url: None,
            sender_id: from.into(),
            receiver_id: to.into(),
            sender_name: from.to_string(),
        }
    }

    fn texts(thread: &Thread) -> Vec<&str> {
        thread
            .messages()
            .iter()
            .filter_map(|m| m.content.as_deref())
            .collect()
    }

    #[test]
    fn pair_membership_is_symmetric() {
        let ab = ConversationPair::new("A".into(), "B".into());
        let ba = ConversationPair::new("B".into(), "A".into());
        let rows = [
            ("A", "B"),
            ("B", "A"),
            ("A", "C"),
            ("C", "A"),
            ("B", "C"),
            ("A", "A"),
        ];
        for (s, r) in rows {
            assert_eq!(
                ab.matches(&s.into(), &r.into()),
                ba.matches(&s.into(), &r.into()),
                "pair disagreement for ({s},{r})"
            );
        }
        assert!(ab.matches(&"A".into(), &"B".into()));
        assert!(ab.matches(&"B".into(), &"A".into()));
        assert!(!ab.matches(&"A".into(), &"C".into()));
    }

    #[test]
    fn history_is_identical_from_either_side() {
        let history = vec![msg(2, "B", "A", "hey", 2), msg(1, "A", "B", "hi", 1)];
        let from_a = Thread::from_history(
            ConversationPair::new("A".into(), "B".into()),
            history.clone(),
        );
        let from_b = Thread::from_history(ConversationPair::new("B".into(), "A".into()), history);
        assert_eq!(texts(&from_a), vec!["hi", "hey"]);
        assert_eq!(from_a.messages(), from_b.messages());
    }

    #[test]
    fn foreign_rows_never_enter_the_thread() {
        let mut thread = Thread::new(ConversationPair::new("A".into(), "B".into()));
        assert_eq!(thread.insert(msg(1, "A", "C", "psst", 1)), Admission::Foreign);
        assert_eq!(thread.insert(msg(2, "C", "B", "psst", 2)), Admission::Foreign);
        assert!(thread.is_empty());
    }

    #[test]
    fn late_arrival_is_placed_by_creation_time() {
        let mut thread = Thread::new(ConversationPair::new("A".into(), "B".into()));
        thread.insert(msg(1, "A", "B", "one", 1));
        thread.insert(msg(3, "A", "B", "three", 3));
        assert_eq!(thread.insert(msg(2, "B", "A", "two", 2)), Admission::Inserted(1));
        assert_eq!(texts(&thread), vec!["one", "two", "three"]);
    }

    #[test]
    fn equal_timestamps_keep_arrival_order() {
        let mut thread = Thread::new(ConversationPair::new("A".into(), "B".into()));
        thread.insert(msg(1, "A", "B", "first", 5));
        thread.insert(msg(2, "B", "A", "second", 5));
        thread.insert(msg(3, "A", "B", "third", 5));
        assert_eq!(texts(&thread), vec!["first", "second", "third"]);
    }

    #[test]
    fn replayed_rows_are_deduplicated() {
        let mut thread = Thread::new(ConversationPair::new("A".into(), "B".into()));
        thread.insert(msg(1, "A", "B", "hi", 1));
        assert_eq!(thread.insert(msg(1, "A", "B", "hi", 1)), Admission::Duplicate);
        assert_eq!(thread.len(), 1);
    }

    #[test]
    fn recent_returns_trailing_slice() {
        let history = (1..=8).map(|i| msg(i, "A", "B", &format!("m{i}"), i));
        let thread = Thread::from_history(ConversationPair::new("A".into(), "B".into()), history);
        let recent: Vec<i64> = thread.recent(5).iter().map(|m| m.id).collect();
        assert_eq!(recent, vec![4, 5, 6, 7, 8]);
        assert_eq!(thread.recent(50).len(), 8);
    }

    #[test]
    fn topic_names_both_participants() {
        let pair = ConversationPair::new("A".into(), "B".into());
        assert_eq!(pair.topic(), "realtime:messages:A:B");
    }
}
