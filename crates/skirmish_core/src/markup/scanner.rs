use crate::span::ByteRange;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    Open,
    Close,
    SelfClosing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tag<'a> {
    pub kind: TagKind,
    pub name: &'a str,
    pub range: ByteRange,
}

/// Forward-only tokenizer that yields element tags and nothing else.
///
/// Comments, processing instructions, doctype declarations and CDATA sections
/// are stepped over. A `<` that does not start a well-formed tag is treated as
/// text, so a damaged fragment costs at most the tag it sits in.
#[derive(Debug, Clone)]
pub struct TagScanner<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> TagScanner<'a> {
    pub fn new(text: &'a str) -> Self {
        Self::at(text, 0)
    }

    pub fn at(text: &'a str, pos: usize) -> Self {
        Self {
            text,
            pos: pos.min(text.len()),
        }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    fn skip_past(&mut self, from: usize, terminator: &str) -> bool {
        match self.text[from..].find(terminator) {
            Some(offset) => {
                self.pos = from + offset + terminator.len();
                true
            }
            None => {
                self.pos = self.text.len();
                false
            }
        }
    }
}

impl<'a> Iterator for TagScanner<'a> {
    type Item = Tag<'a>;

    fn next(&mut self) -> Option<Tag<'a>> {
        let bytes = self.text.as_bytes();

        loop {
            let offset = self.text[self.pos..].find('<')?;
            let start = self.pos + offset;
            let rest = &self.text[start..];

            if rest.starts_with("<!--") {
                if !self.skip_past(start + 4, "-->") {
                    return None;
                }
                continue;
            }
            if rest.starts_with("<![CDATA[") {
                if !self.skip_past(start + 9, "]]>") {
                    return None;
                }
                continue;
            }
            if rest.starts_with("<?") {
                if !self.skip_past(start + 2, "?>") {
                    return None;
                }
                continue;
            }
            if rest.starts_with("<!") {
                if !self.skip_past(start + 2, ">") {
                    return None;
                }
                continue;
            }

            let (mut kind, name_start) = if rest.starts_with("</") {
                (TagKind::Close, start + 2)
            } else {
                (TagKind::Open, start + 1)
            };

            let mut name_end = name_start;
            while name_end < bytes.len() && is_name_byte(bytes[name_end]) {
                name_end += 1;
            }
            if name_end == name_start {
                self.pos = start + 1;
                continue;
            }

            let Some(close) = find_tag_end(bytes, name_end) else {
                // A stray `<` inside the tag: resume right after the opener.
                self.pos = start + 1;
                continue;
            };

            if kind == TagKind::Open && close > name_end && bytes[close - 1] == b'/' {
                kind = TagKind::SelfClosing;
            }

            self.pos = close + 1;
            return Some(Tag {
                kind,
                name: &self.text[name_start..name_end],
                range: ByteRange::new(start, close + 1),
            });
        }
    }
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.' | b':')
}

/// Index of the `>` closing a tag whose name ends at `from`, honouring quoted
/// attribute values. `None` when another `<` or the end of input comes first.
fn find_tag_end(bytes: &[u8], from: usize) -> Option<usize> {
    let mut quote: Option<u8> = None;
    for (i, &b) in bytes.iter().enumerate().skip(from) {
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None => match b {
                b'"' | b'\'' => quote = Some(b),
                b'>' => return Some(i),
                b'<' => return None,
                _ => {}
            },
        }
    }
    None
}

/// Value of the first attribute called `key` (ASCII case-insensitive) in a tag.
pub fn attribute<'a>(tag_text: &'a str, key: &str) -> Option<&'a str> {
    let bytes = tag_text.as_bytes();
    let mut i = tag_text.find(|c: char| c.is_ascii_whitespace())?;

    while i < bytes.len() {
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        let name_start = i;
        while i < bytes.len() && is_name_byte(bytes[i]) {
            i += 1;
        }
        if i == name_start {
            return None;
        }
        let name = &tag_text[name_start..i];

        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= bytes.len() || bytes[i] != b'=' {
            continue;
        }
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= bytes.len() || !matches!(bytes[i], b'"' | b'\'') {
            return None;
        }
        let quote = bytes[i];
        let value_start = i + 1;
        let value_end = value_start + tag_text[value_start..].find(quote as char)?;
        if name.eq_ignore_ascii_case(key) {
            return Some(&tag_text[value_start..value_end]);
        }
        i = value_end + 1;
    }

    None
}
