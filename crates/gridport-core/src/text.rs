//! Text helpers for export-safe identifiers.

/// Sanitizes a display name into an export-safe identifier.
///
/// The target schema rejects whitespace in job and port names, so runs of
/// whitespace are collapsed into a single underscore. Leading and trailing
/// whitespace is dropped entirely, and a name that is empty after trimming
/// becomes `"untitled"`.
pub fn sanitize_name(name: &str) -> String {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return String::from("untitled");
    }

    let mut sanitized = String::with_capacity(trimmed.len());
    let mut in_whitespace = false;
    for ch in trimmed.chars() {
        if ch.is_whitespace() {
            if !in_whitespace {
                sanitized.push('_');
                in_whitespace = true;
            }
        } else {
            sanitized.push(ch);
            in_whitespace = false;
        }
    }
    sanitized
}
