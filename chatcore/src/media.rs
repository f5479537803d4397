use crate::types::UserId;

pub const AUDIO_MIME_TYPE: &str = "audio/webm";
pub const AUDIO_EXTENSION: &str = "webm";

/// Object path for a voice recording: `{sender}/audio-recording-{millis}.webm`.
pub fn audio_object_path(sender: &UserId, unix_millis: i64) -> String {
    format!("{sender}/audio-recording-{unix_millis}.{AUDIO_EXTENSION}")
}

/// Percent-encodes each segment of an object path, keeping the separators.
pub fn encode_object_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audio_path_is_keyed_by_sender_and_time() {
        assert_eq!(
            audio_object_path(&"u-1".into(), 1_714_557_600_000),
            "u-1/audio-recording-1714557600000.webm"
        );
    }

    #[test]
    fn object_path_segments_are_encoded() {
        assert_eq!(encode_object_path("u 1/clip#2.webm"), "u%201/clip%232.webm");
    }
}
