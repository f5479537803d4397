use crate::types::{Message, Payload};

/// Placeholder used for messages that carry only a media reference.
pub const MEDIA_PLACEHOLDER: &str = "[voice message]";

/// Renders messages as `speaker: text` lines, oldest first.
pub fn transcript(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|m| {
            let text = match m.payload() {
                Payload::Text(text) => text,
                Payload::Media(_) => MEDIA_PLACEHOLDER,
                Payload::Empty => "",
            };
            format!("{}: {}", m.sender_name, text)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Builds the reply-suggestion prompt around a conversation transcript.
pub fn suggestion_prompt(messages: &[Message]) -> String {
    format!(
        "You are a helpful assistant suggesting a short, casual reply in a chat conversation.\n\
         Here is the recent conversation history:\n\
         {}\n\n\
         Suggest a suitable reply from the perspective of the last person who received a message.\n\
         Keep the suggestion concise and natural-sounding.",
        transcript(messages)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn message(id: i64, name: &str, content: Option<&str>, media: Option<&str>) -> Message {
        Message {
            id,
            created_at: Utc.timestamp_opt(1_700_000_000 + id, 0).single().expect("valid"),
            content: content.map(str::to_string),
            media_url: media.map(str::to_string),
            sender_id: name.into(),
            receiver_id: "other".into(),
            sender_name: name.to_string(),
        }
    }

    #[test]
    fn transcript_renders_speaker_lines() {
        let messages = vec![
            message(1, "alice", Some("hi"), None),
            message(2, "bob", None, Some("https://cdn.test/a.webm")),
            message(3, "alice", Some("you there?"), None),
        ];
        assert_eq!(
            transcript(&messages),
            "alice: hi\nbob: [voice message]\nalice: you there?"
        );
    }

    #[test]
    fn prompt_embeds_transcript() {
        let prompt = suggestion_prompt(&[message(1, "alice", Some("lunch?"), None)]);
        assert!(prompt.contains("recent conversation history:\nalice: lunch?\n"));
        assert!(prompt.ends_with("Keep the suggestion concise and natural-sounding."));
    }
}
