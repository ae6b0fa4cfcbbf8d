//! Paragraph extraction from raw input text.

use crate::error::ImageError;

/// One paragraph of input, destined for a single image request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    /// 1-based position in the input; also names the output file.
    pub index: usize,
    /// Trimmed paragraph text, capped in length.
    pub text: String,
}

/// Split `content` into prompts.
///
/// Paragraphs are separated by one or more blank lines (a line holding only
/// whitespace counts as blank). Each paragraph is trimmed, empty ones are
/// dropped, and the rest are cut to at most `max_chars` characters.
///
/// # Errors
///
/// Returns [`ImageError::EmptyInput`] if no paragraph survives.
pub fn extract_prompts(content: &str, max_chars: usize) -> Result<Vec<Prompt>, ImageError> {
    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in content.lines() {
        if line.trim().is_empty() {
            flush_paragraph(&mut current, &mut paragraphs);
        } else {
            current.push(line);
        }
    }
    flush_paragraph(&mut current, &mut paragraphs);

    if paragraphs.is_empty() {
        return Err(ImageError::EmptyInput);
    }

    Ok(paragraphs
        .into_iter()
        .enumerate()
        .map(|(i, text)| Prompt { index: i + 1, text: truncate_chars(&text, max_chars) })
        .collect())
}

fn flush_paragraph(lines: &mut Vec<&str>, out: &mut Vec<String>) {
    if lines.is_empty() {
        return;
    }
    let joined = lines.join("\n");
    lines.clear();
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        out.push(trimmed.to_string());
    }
}

/// Cut `text` to at most `max_chars` characters without splitting one.
#[must_use]
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}
