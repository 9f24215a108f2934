use std::path::Path;

use anyhow::Result;
use bifrost_transcript::MessageSegmenter;

/// Execute `bifrost segment <file>`: offline segmentation for inspection.
pub fn run(file: &Path, json: bool, prompt: Option<&str>) -> Result<()> {
    let text = std::fs::read_to_string(file)?;

    let segmenter = match prompt {
        Some(p) => MessageSegmenter::default().with_prompt(p),
        None => MessageSegmenter::default(),
    };
    let messages = segmenter.segment(&text);

    if json {
        for message in &messages {
            println!("{}", serde_json::to_string(message)?);
        }
    } else {
        for message in &messages {
            println!("[{}] {}", message.role, message.content);
        }
        eprintln!("{} message(s)", messages.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segments_a_transcript_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("t.txt");
        std::fs::write(&path, "Alice: hello\nCopilot: hi there").unwrap();
        run(&path, true, None).unwrap();
        run(&path, false, Some("hello")).unwrap();
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(run(Path::new("/nonexistent/t.txt"), false, None).is_err());
    }
}
