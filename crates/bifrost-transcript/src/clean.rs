use crate::classify::LineClassifier;

/// Strip requester-attributable lines from freshly diffed text: the echoed
/// prompt, directive lines, and known requester markers. What survives is
/// the response side of the exchange.
pub fn clean_response(text: &str, original_prompt: &str, classifier: &LineClassifier) -> String {
    let kept: Vec<&str> = text
        .lines()
        .filter(|line| {
            let class = classifier.classify(line, Some(original_prompt));
            !classifier.is_requester_noise(&class)
        })
        .collect();
    kept.join("\n").trim().to_string()
}
