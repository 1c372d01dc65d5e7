use crate::types::Range;

/// Splits text into token ranges over the original string, so callers can
/// keep byte offsets and rebuild partial words.
pub trait RangeTokenizer: Send + Sync {
    fn tokenize_as_ranges(&self, data: &str, range: Range) -> Vec<Range>;

    fn tokenize(&self, data: &str) -> Vec<String> {
        self.tokenize_as_ranges(data, Range::new(0, data.len()))
            .into_iter()
            .map(|r| data[r.start..r.end].to_string())
            .collect()
    }
}

/// Joins tokens back into display text.
pub trait Detokenizer: Send + Sync {
    fn detokenize(&self, tokens: &[String]) -> String;
}

/// Tokenizer that splits on Unicode whitespace plus zero-width space and
/// zero-width no-break space.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceTokenizer;

fn is_separator(c: char) -> bool {
    c.is_whitespace() || c == '\u{200b}' || c == '\u{feff}'
}

impl RangeTokenizer for WhitespaceTokenizer {
    fn tokenize_as_ranges(&self, data: &str, range: Range) -> Vec<Range> {
        let mut tokens = Vec::new();
        let mut start = None;
        for (offset, c) in data[range.start..range.end].char_indices() {
            let index = range.start + offset;
            if is_separator(c) {
                if let Some(s) = start.take() {
                    tokens.push(Range::new(s, index));
                }
            } else if start.is_none() {
                start = Some(index);
            }
        }
        if let Some(s) = start {
            tokens.push(Range::new(s, range.end));
        }
        tokens
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceDetokenizer;

impl Detokenizer for WhitespaceDetokenizer {
    fn detokenize(&self, tokens: &[String]) -> String {
        tokens.join(" ")
    }
}
