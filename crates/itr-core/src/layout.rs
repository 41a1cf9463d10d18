//! Text fitting inside a bounding box.
//!
//! Fitting order follows the writer contract: shrink the font from the
//! default size down to the configured floor first, then wrap lines at
//! the floor, then truncate. Truncation is always flagged, never silent.

use crate::geom::BoundingBox;

/// Vertical advance per line as a multiple of the font size.
const LINE_SPACING: f64 = 1.2;

/// A value laid out for one box.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedText {
    pub lines: Vec<String>,
    pub font_size: f64,
    /// Content was cut (or still overflows the box width at the floor
    /// size); the record gets an overflow flag in the report.
    pub truncated: bool,
}

/// Helvetica-flavoured advance width as a fraction of the font size.
/// Close enough for fitting decisions; exact metrics live in the viewer.
fn char_width_factor(c: char) -> f64 {
    match c {
        'i' | 'j' | 'l' | '.' | ',' | '\'' | '|' | '!' | ':' | ';' => 0.28,
        'f' | 't' | 'r' | 'I' | '(' | ')' | '[' | ']' | '-' | ' ' | '/' => 0.35,
        'm' | 'w' | 'M' | 'W' | '@' => 0.85,
        c if c.is_ascii_uppercase() || c.is_ascii_digit() => 0.66,
        c if c.is_ascii() => 0.52,
        // CJK and other full-width glyphs
        _ => 1.0,
    }
}

/// Estimated rendered width of a line at the given font size.
pub fn text_width(text: &str, font_size: f64) -> f64 {
    text.chars().map(char_width_factor).sum::<f64>() * font_size
}

/// Fit `text` into `bounds`, shrinking from `default_size` down to
/// `min_size`, then wrapping, then truncating.
///
/// An empty value fits trivially: one empty line at the default size,
/// written as an explicit blank.
pub fn fit_text(text: &str, bounds: &BoundingBox, default_size: f64, min_size: f64) -> FittedText {
    if text.is_empty() {
        return FittedText {
            lines: vec![String::new()],
            font_size: default_size,
            truncated: false,
        };
    }

    // Shrink pass: a single line at the largest size that fits both axes.
    let mut size = default_size;
    while size >= min_size {
        if text_width(text, size) <= bounds.width() && size * LINE_SPACING <= bounds.height() {
            return FittedText {
                lines: vec![text.to_string()],
                font_size: size,
                truncated: false,
            };
        }
        size -= 0.5;
    }

    // Wrap pass at the floor size.
    let size = min_size;
    let max_lines = ((bounds.height() / (size * LINE_SPACING)).floor() as usize).max(1);
    let mut lines = wrap_line(text, bounds.width(), size);
    let mut truncated = false;
    if lines.len() > max_lines {
        lines.truncate(max_lines);
        truncated = true;
    }
    // A box narrower than a single glyph still gets its one-char lines;
    // flag the width overflow instead of dropping the value.
    if lines.iter().any(|line| text_width(line, size) > bounds.width()) {
        truncated = true;
    }

    FittedText {
        lines,
        font_size: size,
        truncated,
    }
}

/// Greedy word wrap; words wider than the box are hard-split.
fn wrap_line(text: &str, max_width: f64, font_size: f64) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if text_width(&candidate, font_size) <= max_width {
            current = candidate;
            continue;
        }
        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if text_width(word, font_size) <= max_width {
            current = word.to_string();
        } else {
            current = split_long_word(word, max_width, font_size, &mut lines);
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// Push full chunks of an over-wide word; the trailing remainder comes
/// back as the new current line.
fn split_long_word(
    word: &str,
    max_width: f64,
    font_size: f64,
    lines: &mut Vec<String>,
) -> String {
    let mut chunk = String::new();
    for c in word.chars() {
        let mut candidate = chunk.clone();
        candidate.push(c);
        if !chunk.is_empty() && text_width(&candidate, font_size) > max_width {
            lines.push(std::mem::take(&mut chunk));
            chunk.push(c);
        } else {
            chunk = candidate;
        }
    }
    chunk
}
