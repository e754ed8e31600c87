use std::io;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ByteRange {
    pub start: usize,
    pub end: usize,
}

impl ByteRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn slice<'a>(&self, text: &'a str) -> &'a str {
        &text[self.start..self.end]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Splice {
    range: ByteRange,
    replacement: String,
}

/// Ordered set of replacements over one document.
///
/// Everything outside the recorded ranges is copied through untouched, which
/// is what keeps unrelated markup byte-identical after a rewrite.
#[derive(Debug, Clone, Default)]
pub struct Splices {
    edits: Vec<Splice>,
}

impl Splices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, range: ByteRange, replacement: impl Into<String>) {
        self.edits.push(Splice {
            range,
            replacement: replacement.into(),
        });
    }

    /// Orders edits by start offset for callers that record them out of order.
    pub fn sort(&mut self) {
        self.edits.sort_by_key(|edit| edit.range.start);
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    pub fn validate(&self, text_len: usize) -> io::Result<()> {
        let mut expected_min = 0usize;
        for edit in &self.edits {
            if edit.range.end < edit.range.start {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!(
                        "invalid splice range {}..{}",
                        edit.range.start, edit.range.end
                    ),
                ));
            }
            if edit.range.start < expected_min {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!(
                        "splice overlap at {}: previous edit ended at {}",
                        edit.range.start, expected_min
                    ),
                ));
            }
            if edit.range.end > text_len {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!(
                        "splice ends at {}, document length {}",
                        edit.range.end, text_len
                    ),
                ));
            }
            expected_min = edit.range.end;
        }
        Ok(())
    }

    pub fn apply(&self, text: &str) -> io::Result<String> {
        self.validate(text.len())?;

        let mut out = String::with_capacity(text.len());
        let mut cursor = 0usize;
        for edit in &self.edits {
            out.push_str(&text[cursor..edit.range.start]);
            out.push_str(&edit.replacement);
            cursor = edit.range.end;
        }
        out.push_str(&text[cursor..]);
        Ok(out)
    }
}
