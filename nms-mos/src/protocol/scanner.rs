//! Tolerant tagged-element scanning
//!
//! MOS peers send loosely formed XML: attributes on tags, inconsistent
//! whitespace, unrelated elements in any order. Instead of a full XML parser
//! the gateway locates elements by name with a forward-only cursor. Matching
//! is non-nested: an element ends at the first closing tag with its name
//! after the start tag.

use std::borrow::Cow;

/// One located element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Element<'a> {
    /// Text from `<name` through the closing `>` of `</name>`
    pub outer: &'a str,
    /// Text between the start and end tags (empty for `<name/>`)
    pub inner: &'a str,
    /// Byte offset of `<` of the start tag in the scanned text
    pub start: usize,
    /// Byte offset just past the end tag
    pub end: usize,
}

/// Forward-only cursor over a document
#[derive(Debug, Clone)]
pub struct Scanner<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    /// Locate the next start tag named `name` at or after the cursor
    ///
    /// Returns `(tag_start, content_start, self_closing)` and does not move
    /// the cursor.
    fn find_start_tag(&self, name: &str) -> Option<(usize, usize, bool)> {
        let mut search = self.pos;
        while search < self.src.len() {
            let open = search + self.src[search..].find('<')?;
            let name_start = open + 1;
            if !self.src[name_start..].starts_with(name) {
                search = name_start;
                continue;
            }

            let name_end = name_start + name.len();
            match self.src[name_end..].chars().next() {
                Some('>') => return Some((open, name_end + 1, false)),
                Some(c) if c.is_whitespace() || c == '/' => {
                    let gt = name_end + self.src[name_end..].find('>')?;
                    let self_closing = self.src[..gt].ends_with('/');
                    return Some((open, gt + 1, self_closing));
                }
                // Longer tag sharing the prefix (`<storyIDBefore>` vs `<storyID>`)
                _ => search = name_end,
            }
        }
        None
    }

    /// Next element named `name`; advances the cursor past it
    ///
    /// Returns `None` when no start tag is found or when the start tag has
    /// no matching end tag (unbalanced).
    pub fn next_element(&mut self, name: &str) -> Option<Element<'a>> {
        let (start, content_start, self_closing) = self.find_start_tag(name)?;

        if self_closing {
            self.pos = content_start;
            return Some(Element {
                outer: &self.src[start..content_start],
                inner: "",
                start,
                end: content_start,
            });
        }

        let (close_start, end) = find_end_tag(self.src, content_start, name)?;
        self.pos = end;
        Some(Element {
            outer: &self.src[start..end],
            inner: &self.src[content_start..close_start],
            start,
            end,
        })
    }

    /// True when a start tag named `name` exists at or after the cursor
    pub fn has_start_tag(&self, name: &str) -> bool {
        self.find_start_tag(name).is_some()
    }

    /// Byte offset of the next start tag named `name`, balanced or not
    pub fn start_tag_offset(&self, name: &str) -> Option<usize> {
        self.find_start_tag(name).map(|(start, _, _)| start)
    }
}

/// Find `</name>` (optionally `</name >`) at or after `from`
fn find_end_tag(src: &str, from: usize, name: &str) -> Option<(usize, usize)> {
    let mut search = from;
    while search < src.len() {
        let close = search + src[search..].find("</")?;
        let name_start = close + 2;
        if src[name_start..].starts_with(name) {
            let name_end = name_start + name.len();
            let rest = &src[name_end..];
            let trimmed = rest.trim_start();
            if trimmed.starts_with('>') {
                let gt = name_end + (rest.len() - trimmed.len());
                return Some((close, gt + 1));
            }
        }
        search = name_start;
    }
    None
}

/// First element named `name` anywhere in `src`
pub fn find_element<'a>(src: &'a str, name: &str) -> Option<Element<'a>> {
    Scanner::new(src).next_element(name)
}

/// Trimmed, entity-decoded text of the first element named `name`
pub fn element_text(src: &str, name: &str) -> Option<String> {
    find_element(src, name).map(|element| decode_entities(element.inner.trim()).into_owned())
}

/// Decode the predefined XML entities and numeric character references
///
/// Unknown or malformed references are kept verbatim.
pub fn decode_entities(text: &str) -> Cow<'_, str> {
    if !text.contains('&') {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let candidate = &rest[amp..];
        let decoded = candidate
            .find(';')
            .filter(|&semi| semi <= 10)
            .and_then(|semi| decode_reference(&candidate[1..semi]).map(|c| (c, semi)));

        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &candidate[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &candidate[1..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

fn decode_reference(reference: &str) -> Option<char> {
    match reference {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let code = if let Some(hex) = reference
                .strip_prefix("#x")
                .or_else(|| reference.strip_prefix("#X"))
            {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                reference.strip_prefix('#')?.parse::<u32>().ok()?
            };
            char::from_u32(code)
        }
    }
}

/// Escape text for inclusion in element content
pub fn escape_text(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>']) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            other => out.push(other),
        }
    }
    Cow::Owned(out)
}
