use bifrost_core::{ExtractedMessage, Role};

use crate::classify::{LineClass, LineClassifier};

/// Minimum trimmed length for a prefix-less line to open a message on its own.
const IMPLICIT_MIN_CHARS: usize = 10;

/// Tokens that make a bare line read as plausible response prose.
const RESPONSE_OPENERS: &[&str] = &[
    "sure", "here", "i'll", "i can", "you can", "the ", "this ", "to ", "let", "yes", "it ",
    "certainly", "of course",
];

/// Line-oriented state machine that cuts raw transcript text into discrete,
/// role-tagged messages. Output order is the order messages were opened;
/// never sorted by role.
pub struct MessageSegmenter {
    classifier: LineClassifier,
    original_prompt: Option<String>,
}

impl Default for MessageSegmenter {
    fn default() -> Self {
        Self {
            classifier: LineClassifier::default(),
            original_prompt: None,
        }
    }
}

impl MessageSegmenter {
    pub fn new(classifier: LineClassifier) -> Self {
        Self {
            classifier,
            original_prompt: None,
        }
    }

    /// Enable echo filtering for this prompt's text.
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.original_prompt = Some(prompt.into());
        self
    }

    pub fn segment(&self, text: &str) -> Vec<ExtractedMessage> {
        let prompt = self.original_prompt.as_deref();
        let mut messages: Vec<ExtractedMessage> = Vec::new();
        let mut open: Option<OpenMessage> = None;

        for line in text.lines() {
            let class = self.classifier.classify(line, prompt);
            match class {
                LineClass::Echo | LineClass::KnownUserMarker { .. } => {
                    // A requester turn closes the message in progress; the
                    // line itself never becomes message content.
                    flush(&mut open, &mut messages);
                }
                LineClass::KnownAssistantMarker { ref content }
                | LineClass::GenericPrefixed { ref content, .. } => {
                    flush(&mut open, &mut messages);
                    open = Some(OpenMessage::start(
                        self.classifier.role_for(&class),
                        content,
                        line,
                    ));
                }
                LineClass::Unmarked => match open {
                    Some(ref mut msg) => msg.lines.push(line.to_string()),
                    None => {
                        if reads_as_response(line) {
                            open = Some(OpenMessage::start(Role::Unknown, line.trim(), line));
                        }
                        // Otherwise: stray noise before any message; drop it.
                    }
                },
            }
        }

        flush(&mut open, &mut messages);
        messages
    }
}

struct OpenMessage {
    role: Role,
    raw_line: String,
    lines: Vec<String>,
}

impl OpenMessage {
    fn start(role: Role, content: &str, raw_line: &str) -> Self {
        Self {
            role,
            raw_line: raw_line.to_string(),
            lines: vec![content.to_string()],
        }
    }

    fn finish(self) -> Option<ExtractedMessage> {
        let content = self.lines.join("\n");
        let content = content.trim();
        if content.is_empty() {
            return None;
        }
        Some(ExtractedMessage::new(self.role, content, self.raw_line))
    }
}

fn flush(open: &mut Option<OpenMessage>, out: &mut Vec<ExtractedMessage>) {
    if let Some(msg) = open.take() {
        if let Some(done) = msg.finish() {
            out.push(done);
        }
    }
}

/// Heuristic for a prefix-less line that should open a message implicitly:
/// long enough, and containing a common response-opening token.
fn reads_as_response(line: &str) -> bool {
    let trimmed = line.trim();
    if trimmed.len() <= IMPLICIT_MIN_CHARS {
        return false;
    }
    let lowered = trimmed.to_lowercase();
    RESPONSE_OPENERS.iter().any(|t| lowered.contains(t))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roles_and_contents(messages: &[ExtractedMessage]) -> Vec<(Role, &str)> {
        messages
            .iter()
            .map(|m| (m.role, m.content.as_str()))
            .collect()
    }

    #[test]
    fn alternating_speakers_in_order() {
        let s = MessageSegmenter::default();
        let messages = s.segment("Alice: hello\nCopilot: hi there\nAlice: bye");
        assert_eq!(
            roles_and_contents(&messages),
            vec![
                (Role::User, "hello"),
                (Role::Assistant, "hi there"),
                (Role::User, "bye"),
            ]
        );
    }

    #[test]
    fn continuation_lines_attach_to_open_message() {
        let s = MessageSegmenter::default();
        let messages = s.segment("Copilot: the function\n  does two things:\n  read, then parse");
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, Role::Assistant);
        assert_eq!(
            messages[0].content,
            "the function\n  does two things:\n  read, then parse"
        );
    }

    #[test]
    fn blank_lines_preserved_inside_message() {
        let s = MessageSegmenter::default();
        let messages = s.segment("Copilot: first paragraph\n\nsecond paragraph");
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content, "first paragraph\n\nsecond paragraph");
    }

    #[test]
    fn empty_marker_line_emits_nothing() {
        let s = MessageSegmenter::default();
        let messages = s.segment("Copilot:\nAlice: actual content");
        assert_eq!(roles_and_contents(&messages), vec![(Role::User, "actual content")]);
    }

    #[test]
    fn requester_noise_is_filtered_entirely() {
        let s = MessageSegmenter::default().with_prompt("explain the parser");
        let text = "explain the parser\nYou: explain the parser\n@workspace /explain\nCopilot: it tokenizes input";
        let messages = s.segment(text);
        assert_eq!(
            roles_and_contents(&messages),
            vec![(Role::Assistant, "it tokenizes input")]
        );
    }

    #[test]
    fn implicit_open_for_plausible_prose() {
        let s = MessageSegmenter::default();
        let messages = s.segment("Sure, here is the summary you asked for.");
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, Role::Unknown);
        assert_eq!(messages[0].content, "Sure, here is the summary you asked for.");
    }

    #[test]
    fn short_stray_lines_are_dropped() {
        let s = MessageSegmenter::default();
        assert!(s.segment("ok").is_empty());
        assert!(s.segment("- done -").is_empty());
    }

    #[test]
    fn raw_line_is_the_opening_line() {
        let s = MessageSegmenter::default();
        let messages = s.segment("Copilot: hi there\nmore text follows here");
        assert_eq!(messages[0].raw_line, "Copilot: hi there");
    }

    #[test]
    fn requester_line_closes_the_open_message() {
        let s = MessageSegmenter::default();
        let messages = s.segment("Copilot: part one\nYou: another question\nextra prose line");
        // The user turn ends the assistant message; the stray prose after it
        // does not fuse back in.
        assert_eq!(roles_and_contents(&messages), vec![(Role::Assistant, "part one")]);
    }

    #[test]
    fn prose_after_requester_line_starts_fresh() {
        let s = MessageSegmenter::default();
        let messages = s.segment("Copilot: part one\nYou: go on\nSure, here is the second part.");
        assert_eq!(
            roles_and_contents(&messages),
            vec![
                (Role::Assistant, "part one"),
                (Role::Unknown, "Sure, here is the second part."),
            ]
        );
    }

    #[test]
    fn order_is_never_grouped_by_role() {
        let s = MessageSegmenter::default();
        let text = "Copilot: one\nAlice: two\nCopilot: three\nAlice: four";
        let messages = s.segment(text);
        assert_eq!(
            roles_and_contents(&messages),
            vec![
                (Role::Assistant, "one"),
                (Role::User, "two"),
                (Role::Assistant, "three"),
                (Role::User, "four"),
            ]
        );
    }

    #[test]
    fn empty_input_yields_no_messages() {
        let s = MessageSegmenter::default();
        assert!(s.segment("").is_empty());
        assert!(s.segment("\n\n\n").is_empty());
    }
}
