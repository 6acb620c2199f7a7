//! Heading extraction and line-window slicing. The only "Markdown" handling
//! the core performs — no parsing or rendering beyond this.

/// Builds the `"<line>: <heading>"` map of every ATX (`#`...`######`)
/// heading in `content`, newline-joined. Lines are 1-based.
#[must_use]
pub fn extract_headings(content: &str) -> String {
    let mut out = Vec::new();
    for (index, line) in content.lines().enumerate() {
        let trimmed = line.trim_start();
        let hashes = trimmed.chars().take_while(|c| *c == '#').count();
        if hashes == 0 || hashes > 6 {
            continue;
        }
        let rest = &trimmed[hashes..];
        if !rest.is_empty() && !rest.starts_with(' ') && !rest.starts_with('\t') {
            // "#no-space" is not a heading.
            continue;
        }
        let heading = rest.trim();
        out.push(format!("{}: {heading}", index + 1));
    }
    out.join("\n")
}

/// The full-page line count.
#[must_use]
pub fn total_lines(content: &str) -> usize {
    content.lines().count()
}

/// Lines `[offset, offset + limit)` of `content`, 1-based inclusive lower,
/// exclusive upper, newline-joined. Out-of-range bounds clamp rather than
/// panic or error.
#[must_use]
pub fn window(content: &str, offset: usize, limit: usize) -> String {
    let lines: Vec<&str> = content.lines().collect();
    if offset == 0 || offset > lines.len() {
        return String::new();
    }
    let start = offset - 1;
    let end = (start + limit).min(lines.len());
    lines[start..end].join("\n")
}
