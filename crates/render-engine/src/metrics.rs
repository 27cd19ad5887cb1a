//! Text measurement and line wrapping.
//!
//! Widths follow the Helvetica advance widths so that lines wrapped here fit
//! when drawn with the PDF base font. Characters outside printable ASCII
//! fall back to the configured average width.

use unicode_segmentation::UnicodeSegmentation;

use framedoc_project_model::options::{Typography, PT_PER_MM};

/// Helvetica advance widths for ' '..='~', in 1/1000 em.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
    278, 278, 584, 584, 584, 556, 1015, // ':'..'@'
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // 'A'..'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N'..'Z'
    278, 278, 278, 469, 556, 333, // '['..'`'
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // 'a'..'m'
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // 'n'..'z'
    334, 260, 334, 584, // '{'..'~'
];

/// Bold glyphs run wider than regular ones.
const BOLD_WIDTH_FACTOR: f64 = 1.08;

/// Measures text at a given font size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextMetrics {
    /// Fallback advance for characters without a table entry, in em.
    pub fallback_em: f64,
}

impl TextMetrics {
    pub fn new(typography: &Typography) -> Self {
        Self {
            fallback_em: typography.avg_char_width_em,
        }
    }

    /// Advance of `c` in em.
    pub fn char_em(&self, c: char) -> f64 {
        match c {
            ' '..='~' => f64::from(HELVETICA_WIDTHS[c as usize - 0x20]) / 1000.0,
            '\u{2022}' => 0.35,
            _ => self.fallback_em,
        }
    }

    /// Width of `text` in mm at `font_size_pt`.
    pub fn width(&self, text: &str, font_size_pt: f64, bold: bool) -> f64 {
        let em: f64 = text.chars().map(|c| self.char_em(c)).sum();
        let factor = if bold { BOLD_WIDTH_FACTOR } else { 1.0 };
        em * font_size_pt / PT_PER_MM * factor
    }

    /// Greedy word wrap into lines no wider than `max_width` mm.
    ///
    /// Words wider than a whole line are broken between grapheme clusters. Empty
    /// input yields a single empty line so the block still takes up space.
    pub fn wrap(&self, text: &str, max_width: f64, font_size_pt: f64, bold: bool) -> Vec<String> {
        let mut lines = Vec::new();
        for paragraph in text.split('\n') {
            self.wrap_paragraph(paragraph, max_width, font_size_pt, bold, &mut lines);
        }
        if lines.is_empty() {
            lines.push(String::new());
        }
        lines
    }

    fn wrap_paragraph(
        &self,
        paragraph: &str,
        max_width: f64,
        size: f64,
        bold: bool,
        lines: &mut Vec<String>,
    ) {
        let space = self.width(" ", size, bold);
        let mut current = String::new();
        let mut current_width = 0.0;

        for word in paragraph.split_whitespace() {
            let word_width = self.width(word, size, bold);
            let needed = if current.is_empty() {
                word_width
            } else {
                current_width + space + word_width
            };

            if needed <= max_width {
                if !current.is_empty() {
                    current.push(' ');
                }
                current.push_str(word);
                current_width = needed;
                continue;
            }

            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
                current_width = 0.0;
            }

            if word_width <= max_width {
                current.push_str(word);
                current_width = word_width;
            } else {
                for piece in self.break_word(word, max_width, size, bold) {
                    if !current.is_empty() {
                        lines.push(std::mem::take(&mut current));
                    }
                    current_width = self.width(&piece, size, bold);
                    current = piece;
                }
            }
        }

        if !current.is_empty() || paragraph.trim().is_empty() {
            lines.push(current);
        }
    }

    /// Split an over-long word into pieces that each fit, at least one
    /// grapheme cluster per piece.
    fn break_word(&self, word: &str, max_width: f64, size: f64, bold: bool) -> Vec<String> {
        let mut pieces = Vec::new();
        let mut piece = String::new();
        for grapheme in word.graphemes(true) {
            let widened = self.width(&piece, size, bold) + self.width(grapheme, size, bold);
            if !piece.is_empty() && widened > max_width {
                pieces.push(std::mem::take(&mut piece));
            }
            piece.push_str(grapheme);
        }
        if !piece.is_empty() {
            pieces.push(piece);
        }
        pieces
    }
}

impl Default for TextMetrics {
    fn default() -> Self {
        Self::new(&Typography::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_width_scales_with_font_size() {
        let m = TextMetrics::default();
        let small = m.width("Hello", 10.0, false);
        let large = m.width("Hello", 20.0, false);
        assert!((large - 2.0 * small).abs() < 1e-9);
        assert!(m.width("Hello", 10.0, true) > small);
    }

    #[test]
    fn test_digits_share_width() {
        let m = TextMetrics::default();
        assert_eq!(m.char_em('0'), m.char_em('9'));
        assert_eq!(m.char_em('é'), 0.5);
    }

    #[test]
    fn test_wrap_respects_width() {
        let m = TextMetrics::default();
        let text = "the quick brown fox jumps over the lazy dog ".repeat(8);
        let lines = m.wrap(&text, 60.0, 12.0, false);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(m.width(line, 12.0, false) <= 60.0, "{line:?} too wide");
        }
        let rejoined = lines.join(" ");
        assert_eq!(rejoined, text.trim_end());
    }

    #[test]
    fn test_wrap_breaks_long_words() {
        let m = TextMetrics::default();
        let word = "x".repeat(200);
        let lines = m.wrap(&word, 30.0, 12.0, false);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), word);
    }

    #[test]
    fn test_wrap_keeps_combining_marks_with_base() {
        let m = TextMetrics::default();
        let word = "e\u{301}".repeat(60);
        let lines = m.wrap(&word, 20.0, 12.0, false);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), word);
        for line in &lines {
            assert!(line.starts_with('e'), "line starts mid-cluster: {line:?}");
            assert!(line.ends_with('\u{301}'), "line ends mid-cluster: {line:?}");
        }
    }

    #[test]
    fn test_wrap_empty_and_newlines() {
        let m = TextMetrics::default();
        assert_eq!(m.wrap("", 50.0, 12.0, false), vec![String::new()]);
        assert_eq!(m.wrap("a\nb", 50.0, 12.0, false), vec!["a", "b"]);
    }
}
