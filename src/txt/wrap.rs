//! Greedy word wrapping on character columns.

/// Wrap `line` into rows of at most `width` characters.
///
/// Breaks fall on whitespace; runs of whitespace collapse to a single
/// space. A word longer than `width` is split across rows since it cannot
/// fit anywhere. A blank line yields one empty row so vertical spacing in
/// the source survives.
pub fn wrap_line(line: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut rows = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in line.split_whitespace() {
        let mut word = word;
        let mut word_len = word.chars().count();

        if current_len > 0 && current_len + 1 + word_len <= width {
            current.push(' ');
            current.push_str(word);
            current_len += 1 + word_len;
            continue;
        }

        if current_len > 0 {
            rows.push(std::mem::take(&mut current));
            current_len = 0;
        }

        while word_len > width {
            let split = word
                .char_indices()
                .nth(width)
                .map_or(word.len(), |(i, _)| i);
            rows.push(word[..split].to_string());
            word = &word[split..];
            word_len -= width;
        }

        current.push_str(word);
        current_len = word_len;
    }

    if current_len > 0 || rows.is_empty() {
        rows.push(current);
    }
    rows
}
