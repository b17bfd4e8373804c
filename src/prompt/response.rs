pub const DOCTYPE_MARKER: &str = "<!DOCTYPE html>";

/// Strips a leading ```` ```html ```` (or bare ```` ``` ````) fence and a trailing
/// ```` ``` ```` fence, plus surrounding whitespace.
pub fn clean_response(raw: &str) -> String {
    let mut text = raw.trim();

    if let Some(rest) = text.strip_prefix("```") {
        // Drop the language tag line, whatever it says.
        text = match rest.find('\n') {
            Some(idx) => &rest[idx + 1..],
            None => rest.trim_start_matches(|c: char| c.is_ascii_alphabetic()),
        };
    }
    text = text.trim_end();
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    text.trim().to_string()
}

pub fn has_doctype(text: &str) -> bool {
    text.to_ascii_lowercase().contains(&DOCTYPE_MARKER.to_ascii_lowercase())
}

/// Cleaned document starting at the doctype, or `None` if the response is unusable.
pub fn extract_document(raw: &str) -> Option<String> {
    let cleaned = clean_response(raw);
    let start = cleaned.to_ascii_lowercase().find(&DOCTYPE_MARKER.to_ascii_lowercase())?;
    Some(cleaned[start..].to_string())
}
