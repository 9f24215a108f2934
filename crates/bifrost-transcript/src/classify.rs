use bifrost_core::Role;
use regex::Regex;

/// Classification of a single transcript line. Matching rules live in
/// [`LineClassifier`] as data, not scattered conditionals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineClass {
    /// A known assistant marker ("Copilot:", "Assistant:"). Content follows
    /// the prefix.
    KnownAssistantMarker { content: String },
    /// A known requester marker ("You:", "Me:"). These lines are requester
    /// echo and never become message content.
    KnownUserMarker { content: String },
    /// A generic `Name:` prefix that is not an assistant alias. Treated as a
    /// user line.
    GenericPrefixed { name: String, content: String },
    /// Pure requester echo: the prompt itself or a directive line. Filtered
    /// out entirely.
    Echo,
    /// No speaker prefix.
    Unmarked,
}

/// Data-driven line classifier for the chat transcript's loose formatting.
///
/// The source has no formatting contract, so everything here is heuristic:
/// alias lists cover the markers observed in practice and can be extended
/// per deployment.
pub struct LineClassifier {
    assistant_aliases: Vec<String>,
    requester_aliases: Vec<String>,
    directive_markers: Vec<String>,
    generic_prefix: Regex,
}

impl Default for LineClassifier {
    fn default() -> Self {
        Self {
            assistant_aliases: vec![
                "assistant".into(),
                "copilot".into(),
                "github copilot".into(),
            ],
            requester_aliases: vec!["you".into(), "user".into(), "me".into()],
            directive_markers: vec![
                "@workspace".into(),
                "@vscode".into(),
                "@terminal".into(),
                "@github".into(),
            ],
            // `Name: ` — colon must be followed by whitespace so bare URLs
            // ("https://...") never read as a speaker prefix.
            generic_prefix: Regex::new(r"^([A-Za-z][A-Za-z0-9_.'-]{0,31}):\s+(.*)$")
                .expect("generic prefix pattern is valid"),
        }
    }
}

impl LineClassifier {
    /// Register an extra assistant marker (e.g. a vendor rename).
    pub fn with_assistant_alias(mut self, alias: impl Into<String>) -> Self {
        self.assistant_aliases.push(alias.into().to_lowercase());
        self
    }

    /// Register an extra requester marker.
    pub fn with_requester_alias(mut self, alias: impl Into<String>) -> Self {
        self.requester_aliases.push(alias.into().to_lowercase());
        self
    }

    /// Classify one line. `original_prompt` enables echo detection for the
    /// prompt text itself.
    pub fn classify(&self, line: &str, original_prompt: Option<&str>) -> LineClass {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return LineClass::Unmarked;
        }

        if let Some(prompt) = original_prompt {
            let prompt = prompt.trim();
            if !prompt.is_empty() && trimmed == prompt {
                return LineClass::Echo;
            }
        }

        let lowered = trimmed.to_lowercase();
        if self.directive_markers.iter().any(|m| lowered.starts_with(m)) {
            return LineClass::Echo;
        }

        for alias in &self.assistant_aliases {
            if let Some(content) = strip_marker(trimmed, alias) {
                return LineClass::KnownAssistantMarker {
                    content: content.to_string(),
                };
            }
        }

        for alias in &self.requester_aliases {
            if let Some(content) = strip_marker(trimmed, alias) {
                return LineClass::KnownUserMarker {
                    content: content.to_string(),
                };
            }
        }

        if let Some(caps) = self.generic_prefix.captures(trimmed) {
            return LineClass::GenericPrefixed {
                name: caps[1].to_string(),
                content: caps[2].to_string(),
            };
        }

        LineClass::Unmarked
    }

    /// Role attributed to a message opened by the given line class.
    pub fn role_for(&self, class: &LineClass) -> Role {
        match class {
            LineClass::KnownAssistantMarker { .. } => Role::Assistant,
            LineClass::KnownUserMarker { .. } | LineClass::GenericPrefixed { .. } => Role::User,
            LineClass::Echo | LineClass::Unmarked => Role::Unknown,
        }
    }

    /// True for lines that must never become message content.
    pub fn is_requester_noise(&self, class: &LineClass) -> bool {
        matches!(class, LineClass::Echo | LineClass::KnownUserMarker { .. })
    }
}

/// Case-insensitive `<alias>:` prefix match. Returns the content after the
/// colon, with leading whitespace stripped.
fn strip_marker<'a>(line: &'a str, alias: &str) -> Option<&'a str> {
    if line.len() <= alias.len() || !line.is_char_boundary(alias.len()) {
        return None;
    }
    let (head, tail) = line.split_at(alias.len());
    if head.eq_ignore_ascii_case(alias) && tail.starts_with(':') {
        Some(tail[1..].trim_start())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assistant_marker_case_insensitive() {
        let c = LineClassifier::default();
        assert_eq!(
            c.classify("Copilot: hi there", None),
            LineClass::KnownAssistantMarker {
                content: "hi there".into()
            }
        );
        assert_eq!(
            c.classify("ASSISTANT: ok", None),
            LineClass::KnownAssistantMarker {
                content: "ok".into()
            }
        );
        assert_eq!(
            c.classify("GitHub Copilot: done", None),
            LineClass::KnownAssistantMarker {
                content: "done".into()
            }
        );
    }

    #[test]
    fn requester_marker_is_noise() {
        let c = LineClassifier::default();
        let class = c.classify("You: please explain", None);
        assert_eq!(
            class,
            LineClass::KnownUserMarker {
                content: "please explain".into()
            }
        );
        assert!(c.is_requester_noise(&class));
    }

    #[test]
    fn generic_prefix_is_user() {
        let c = LineClassifier::default();
        let class = c.classify("Alice: hello", None);
        assert_eq!(
            class,
            LineClass::GenericPrefixed {
                name: "Alice".into(),
                content: "hello".into()
            }
        );
        assert_eq!(c.role_for(&class), Role::User);
    }

    #[test]
    fn prompt_echo_detected() {
        let c = LineClassifier::default();
        let class = c.classify("  explain this function  ", Some("explain this function"));
        assert_eq!(class, LineClass::Echo);
    }

    #[test]
    fn directive_line_is_echo() {
        let c = LineClassifier::default();
        assert_eq!(c.classify("@workspace /explain", None), LineClass::Echo);
        assert_eq!(c.classify("@Terminal what failed", None), LineClass::Echo);
    }

    #[test]
    fn plain_prose_is_unmarked() {
        let c = LineClassifier::default();
        assert_eq!(
            c.classify("The function reads a file.", None),
            LineClass::Unmarked
        );
    }

    #[test]
    fn empty_line_is_unmarked() {
        let c = LineClassifier::default();
        assert_eq!(c.classify("   ", None), LineClass::Unmarked);
    }

    #[test]
    fn custom_assistant_alias() {
        let c = LineClassifier::default().with_assistant_alias("Duet");
        assert_eq!(
            c.classify("Duet: sure thing", None),
            LineClass::KnownAssistantMarker {
                content: "sure thing".into()
            }
        );
    }

    #[test]
    fn colon_without_name_is_not_prefixed() {
        let c = LineClassifier::default();
        assert_eq!(c.classify(": dangling", None), LineClass::Unmarked);
    }

    #[test]
    fn url_is_not_a_speaker_prefix() {
        let c = LineClassifier::default();
        assert_eq!(
            c.classify("https://example.com/docs", None),
            LineClass::Unmarked
        );
        assert_eq!(
            c.classify("see https://example.com/docs", None),
            LineClass::Unmarked
        );
    }
}
