//! Shared utility functions.

/// Extract the JSON object embedded in an LLM response.
///
/// Strips markdown code fences and slices from the first `{` to the last
/// `}`. Models frequently wrap JSON in ```` ```json ```` blocks or prepend
/// commentary; downstream parsers only want the object itself.
///
/// Returns `None` if no braces are found.
pub fn extract_json_object(response: &str) -> Option<String> {
    let cleaned = response.replace("```json", "").replace("```", "");
    let cleaned = cleaned.trim();

    let start = cleaned.find('{')?;
    let end = cleaned.rfind('}')?;
    if end < start {
        return None;
    }

    Some(cleaned[start..=end].to_string())
}

/// Split text into fixed-size character chunks.
///
/// Chunks are counted in characters, not bytes, so multibyte input never
/// splits inside a UTF-8 sequence. The final chunk may be shorter. Empty
/// input yields no chunks; a `chunk_size` of zero is treated as one.
///
/// Concatenating the returned chunks in order reproduces the input exactly.
pub fn chunk_text(text: &str, chunk_size: usize) -> Vec<String> {
    let chunk_size = chunk_size.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut count = 0;

    for ch in text.chars() {
        current.push(ch);
        count += 1;
        if count == chunk_size {
            chunks.push(std::mem::take(&mut current));
            count = 0;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}
