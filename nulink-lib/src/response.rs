//! Interpretation of the tool's console transcript.
//!
//! The tool prefixes payload lines with `>>>`. The first such line is its
//! banner; the second carries the answer, sometimes wrapped in a sentence
//! like `Read UID: 0x1234`. Anything else is noise.

use std::fmt;

/// Log prefix the tool puts in front of payload lines.
pub const MARKER: &str = ">>>";

/// Label preceding the value in a UID answer.
pub const UID_LABEL: &str = "UID:";

/// Rendering of [`ExtractedMessage::Unknown`].
pub const UNKNOWN_RESPONSE: &str = "Unknown response";

/// The single answer pulled out of a transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractedMessage {
    Value(String),
    /// The tool succeeded but said nothing recognisable. Means "no
    /// information", never success.
    Unknown,
}

impl ExtractedMessage {
    pub fn value(&self) -> Option<&str> {
        match self {
            Self::Value(v) => Some(v),
            Self::Unknown => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }

    pub fn into_value(self) -> Option<String> {
        match self {
            Self::Value(v) => Some(v),
            Self::Unknown => None,
        }
    }
}

impl fmt::Display for ExtractedMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => f.write_str(v),
            Self::Unknown => f.write_str(UNKNOWN_RESPONSE),
        }
    }
}

/// Marker-prefixed lines of `stdout`, each reduced to the text after its
/// last marker and trimmed.
///
/// A bare `\r` ends a line as well as `\n` and `\r\n`.
pub fn relevant_lines(stdout: &str) -> Vec<&str> {
    stdout
        .split(['\r', '\n'])
        .filter_map(|line| line.rsplit_once(MARKER).map(|(_, rest)| rest.trim()))
        .collect()
}

/// Pull the answer out of a successful tool run.
pub fn extract(stdout: &str) -> ExtractedMessage {
    let lines = relevant_lines(stdout);

    let Some(&answer) = lines.get(1) else {
        tracing::warn!("no answer in tool output ({} marked line(s))", lines.len());
        tracing::trace!("unrecognised output: {:?}", stdout);
        return ExtractedMessage::Unknown;
    };

    let answer = match answer.rsplit_once(UID_LABEL) {
        Some((_, uid)) => uid.trim(),
        None => answer,
    };

    ExtractedMessage::Value(answer.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_marked_line_is_the_answer() {
        let out = ">>> NuLink 8051 OT Tool v2.01\n>>> MS51FB9AE\n>>> Done\n";
        assert_eq!(extract(out), ExtractedMessage::Value("MS51FB9AE".into()));
    }

    #[test]
    fn uid_label_is_stripped() {
        let out = ">>> Tool vX.X\n>>> UID: ABCDEF1234\n";
        assert_eq!(extract(out).value(), Some("ABCDEF1234"));
    }

    #[test]
    fn uid_inside_sentence() {
        let out = "noise\n[I] >>> Tool v1\n[I] >>> Read UID:  0x00C0FFEE  \n";
        assert_eq!(extract(out).value(), Some("0x00C0FFEE"));
    }

    #[test]
    fn unmarked_lines_are_ignored() {
        let out = "Connecting...\n>>> banner\nprogress 50%\n>>> second\n";
        assert_eq!(relevant_lines(out), ["banner", "second"]);
        assert_eq!(extract(out).value(), Some("second"));
    }

    #[test]
    fn text_after_last_marker_wins() {
        assert_eq!(relevant_lines("a >>> b >>> c"), ["c"]);
    }

    #[test]
    fn single_marked_line_is_unknown() {
        let msg = extract(">>> Tool vX.X\nother\n");
        assert!(msg.is_unknown());
        assert_eq!(msg.to_string(), UNKNOWN_RESPONSE);
    }

    #[test]
    fn empty_output_is_unknown() {
        assert_eq!(extract(""), ExtractedMessage::Unknown);
    }

    #[test]
    fn bare_cr_transcript() {
        let out = ">>> NuLink_8051OT v1.10\r>>> Read UID: 0x8A2F1C04\r\n";
        assert_eq!(
            relevant_lines(out),
            ["NuLink_8051OT v1.10", "Read UID: 0x8A2F1C04"]
        );
        assert_eq!(extract(out).value(), Some("0x8A2F1C04"));
    }

    #[test]
    fn crlf_transcript() {
        let out = ">>> banner\r\n>>> UID: 42\r\n";
        assert_eq!(extract(out).into_value().as_deref(), Some("42"));
    }
}
