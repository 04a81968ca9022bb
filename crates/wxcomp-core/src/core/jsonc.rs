//! Comment-tolerant JSON ("JSON with comments") helpers.
//!
//! Mini-program manifests (`app.json`, `pages.json`) are routinely hand edited
//! and may carry `//` and `/* */` comments. Parsing goes through
//! [`strip_comments`], which blanks comments out byte-for-byte so that offsets
//! in the stripped text line up with the original. That lets [`find_member_span`]
//! locate a nested value and [`update_object`] edit that object member by
//! member, leaving every other byte of the file (comments included) untouched.

use crate::core::{WxcError, WxcResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::ops::Range;

/// Replace every comment with spaces, keeping newlines and byte offsets intact
pub fn strip_comments(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    let mut in_string = false;

    while i < bytes.len() {
        let b = bytes[i];
        if in_string {
            out.push(b);
            if b == b'\\' && i + 1 < bytes.len() {
                out.push(bytes[i + 1]);
                i += 2;
                continue;
            }
            if b == b'"' {
                in_string = false;
            }
            i += 1;
            continue;
        }

        match (b, bytes.get(i + 1)) {
            (b'"', _) => {
                in_string = true;
                out.push(b);
                i += 1;
            }
            (b'/', Some(b'/')) => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    out.push(b' ');
                    i += 1;
                }
            }
            (b'/', Some(b'*')) => {
                out.extend_from_slice(b"  ");
                i += 2;
                while i < bytes.len() && !(bytes[i] == b'*' && bytes.get(i + 1) == Some(&b'/')) {
                    out.push(if bytes[i] == b'\n' { b'\n' } else { b' ' });
                    i += 1;
                }
                if i < bytes.len() {
                    out.extend_from_slice(b"  ");
                    i += 2;
                }
            }
            _ => {
                out.push(b);
                i += 1;
            }
        }
    }

    // Comments are blanked whole, so multi-byte sequences are never split
    String::from_utf8(out).unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
}

/// Parse comment-tolerant JSON into a typed value
pub fn parse<T: DeserializeOwned>(text: &str) -> WxcResult<T> {
    Ok(serde_json::from_str(&strip_comments(text))?)
}

/// Parse comment-tolerant JSON into a `serde_json::Value`
pub fn parse_value(text: &str) -> WxcResult<Value> {
    parse(text)
}

/// Locate the byte range of the value stored at a nested key path
///
/// `find_member_span(text, &["globalStyle", "usingComponents"])` returns the
/// span of the `usingComponents` object inside `globalStyle`, or `None` when
/// any key along the path is missing or an intermediate value is not an object.
pub fn find_member_span(text: &str, path: &[&str]) -> Option<Range<usize>> {
    let stripped = strip_comments(text);
    let scanner = Scanner { bytes: stripped.as_bytes() };

    let mut object_start = scanner.skip_ws(0);
    if scanner.bytes.get(object_start) != Some(&b'{') {
        return None;
    }

    let mut span = None;
    for (depth, key) in path.iter().enumerate() {
        let found = scanner.object_member(object_start, key)?;
        if depth + 1 < path.len() {
            if scanner.bytes.get(found.start) != Some(&b'{') {
                return None;
            }
            object_start = found.start;
        }
        span = Some(found);
    }
    span
}

/// Replace `span` in `text` with `replacement`
pub fn splice(text: &str, span: Range<usize>, replacement: &str) -> String {
    let mut out = String::with_capacity(text.len() + replacement.len());
    out.push_str(&text[..span.start]);
    out.push_str(replacement);
    out.push_str(&text[span.end..]);
    out
}

/// Leading whitespace of the line containing byte offset `pos`
pub fn line_indent(text: &str, pos: usize) -> &str {
    let line_start = text[..pos].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let line = &text[line_start..];
    let width = line.len() - line.trim_start_matches([' ', '\t']).len();
    &line[..width]
}

/// Guess the indent unit of a document (a tab, or the first run of spaces)
pub fn detect_indent(text: &str) -> String {
    for line in text.lines().skip(1) {
        if line.starts_with('\t') {
            return "\t".to_string();
        }
        let spaces = line.len() - line.trim_start_matches(' ').len();
        if spaces > 0 && !line.trim().is_empty() {
            return " ".repeat(spaces);
        }
    }
    "  ".to_string()
}

/// One `"key": value` member of an object, as byte offsets into the text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberSpan {
    pub key: String,
    /// Offset of the key's opening quote
    pub key_start: usize,
    pub value: Range<usize>,
    /// Offset of the comma following the value, if any
    pub comma: Option<usize>,
}

/// Members of the object whose span is `object`, or `None` if it is not an object
pub fn object_members(text: &str, object: Range<usize>) -> Option<Vec<MemberSpan>> {
    let stripped = strip_comments(text);
    let scanner = Scanner { bytes: stripped.as_bytes() };
    if scanner.bytes.get(object.start) != Some(&b'{') {
        return None;
    }
    scanner.members(object.start)
}

/// Rewrite the object at `object` so that it holds exactly `map`
///
/// Members whose key and value are unchanged keep their bytes, including any
/// comments around them. Dropped members are cut out with their comma (and
/// their line, when they sit alone on it), changed values are replaced in
/// place, and new members are appended before the closing brace in map order.
pub fn update_object(text: &str, object: Range<usize>, map: &Map<String, Value>, unit: &str) -> WxcResult<String> {
    let malformed = || WxcError::Manifest("Cannot edit a malformed JSON object".to_string());
    let base_indent = line_indent(text, object.start).to_string();
    let members = object_members(text, object.clone()).ok_or_else(malformed)?;
    let stripped = strip_comments(text);

    // Drop and rewrite existing members in place
    let mut edits: Vec<(Range<usize>, String)> = Vec::new();
    let mut last_kept = None;
    for member in &members {
        match map.get(&member.key) {
            Some(value) => {
                let current: Option<Value> = serde_json::from_str(&stripped[member.value.clone()]).ok();
                if current.as_ref() != Some(value) {
                    edits.push((member.value.clone(), serde_json::to_string(value)?));
                }
                last_kept = Some(member);
            }
            None => edits.push((removal_span(text, &stripped, member), String::new())),
        }
    }
    if let Some(comma) = last_kept.and_then(|member| member.comma) {
        edits.push((comma..comma + 1, String::new()));
    }
    edits.sort_by_key(|(range, _)| std::cmp::Reverse(range.start));

    let mut edited = text.to_string();
    for (range, replacement) in edits {
        edited.replace_range(range, &replacement);
    }

    let object = object_span_at(&edited, object.start).ok_or_else(malformed)?;
    let close = object.end - 1;
    let remaining = object_members(&edited, object.clone()).ok_or_else(malformed)?;
    let interior_blank = edited[object.start + 1..close].trim().is_empty();

    let additions: Vec<(&String, &Value)> = map
        .iter()
        .filter(|(key, _)| !members.iter().any(|member| &member.key == *key))
        .collect();
    if additions.is_empty() {
        if remaining.is_empty() && interior_blank {
            return Ok(splice(&edited, object, "{}"));
        }
        return Ok(edited);
    }
    if remaining.is_empty() && interior_blank {
        return Ok(splice(&edited, object, &render_object(map, &base_indent, unit)?));
    }

    let inner_indent = remaining
        .first()
        .and_then(|member| own_line_indent(&edited, member.key_start))
        .map(str::to_string)
        .unwrap_or_else(|| format!("{}{}", base_indent, unit));

    let mut insert_at = close;
    while insert_at > object.start + 1 && edited.as_bytes()[insert_at - 1].is_ascii_whitespace() {
        insert_at -= 1;
    }

    let mut block = String::new();
    for (i, (key, value)) in additions.iter().enumerate() {
        if i > 0 {
            block.push(',');
        }
        block.push('\n');
        block.push_str(&inner_indent);
        block.push_str(&serde_json::to_string(key)?);
        block.push_str(": ");
        block.push_str(&serde_json::to_string(value)?);
    }
    let gap = &edited[insert_at..close];
    if gap.contains('\n') {
        block.push_str(gap);
    } else {
        block.push('\n');
        block.push_str(&base_indent);
    }

    let mut out = splice(&edited, insert_at..close, &block);
    if let Some(last) = remaining.last() {
        out.insert(last.value.end, ',');
    }
    Ok(out)
}

/// Byte range a dropped member occupies: its whole line when it sits alone on
/// one (trailing comment included), otherwise the member, its comma and the
/// spaces after them
fn removal_span(text: &str, stripped: &str, member: &MemberSpan) -> Range<usize> {
    let mut end = member.comma.map(|comma| comma + 1).unwrap_or(member.value.end);
    let line_start = text[..member.key_start].rfind('\n').map(|i| i + 1).unwrap_or(0);

    if text[line_start..member.key_start].trim().is_empty() {
        if let Some(newline) = stripped[end..].find('\n').map(|i| end + i) {
            if stripped[end..newline].trim().is_empty() {
                return line_start..newline + 1;
            }
        }
    }

    while end < text.len() && matches!(text.as_bytes()[end], b' ' | b'\t') {
        end += 1;
    }
    member.key_start..end
}

/// Indent of the line holding `pos`, when nothing but whitespace precedes `pos` on it
fn own_line_indent(text: &str, pos: usize) -> Option<&str> {
    let indent = line_indent(text, pos);
    let line_start = text[..pos].rfind('\n').map(|i| i + 1).unwrap_or(0);
    (line_start + indent.len() == pos).then_some(indent)
}

/// Span of the object or array starting at `start`
fn object_span_at(text: &str, start: usize) -> Option<Range<usize>> {
    let stripped = strip_comments(text);
    let scanner = Scanner { bytes: stripped.as_bytes() };
    scanner.value_end(start).map(|end| start..end)
}

/// Render an object as pretty JSON whose closing brace sits at `base_indent`
pub fn render_object(map: &Map<String, Value>, base_indent: &str, unit: &str) -> WxcResult<String> {
    if map.is_empty() {
        return Ok("{}".to_string());
    }

    let inner = format!("{}{}", base_indent, unit);
    let mut out = String::from("{\n");
    for (i, (key, value)) in map.iter().enumerate() {
        out.push_str(&inner);
        out.push_str(&serde_json::to_string(key)?);
        out.push_str(": ");
        out.push_str(&serde_json::to_string(value)?);
        if i + 1 < map.len() {
            out.push(',');
        }
        out.push('\n');
    }
    out.push_str(base_indent);
    out.push('}');
    Ok(out)
}

/// Serialize a whole document with the given indent unit and a trailing newline
pub fn to_string_pretty<T: Serialize>(value: &T, unit: &str) -> WxcResult<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(unit.as_bytes());
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    let mut out = String::from_utf8(buf)
        .map_err(|e| WxcError::Manifest(format!("Serialized JSON is not UTF-8: {}", e)))?;
    out.push('\n');
    Ok(out)
}

/// Minimal structural scanner over comment-free JSON text
struct Scanner<'a> {
    bytes: &'a [u8],
}

impl Scanner<'_> {
    fn skip_ws(&self, mut pos: usize) -> usize {
        while pos < self.bytes.len() && self.bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        pos
    }

    /// `pos` points at the opening quote; returns the offset just past the closing quote
    fn string_end(&self, mut pos: usize) -> Option<usize> {
        pos += 1;
        while pos < self.bytes.len() {
            match self.bytes[pos] {
                b'\\' => pos += 2,
                b'"' => return Some(pos + 1),
                _ => pos += 1,
            }
        }
        None
    }

    /// Returns the offset just past the value starting at `pos`
    fn value_end(&self, pos: usize) -> Option<usize> {
        match self.bytes.get(pos)? {
            b'"' => self.string_end(pos),
            b'{' | b'[' => {
                let mut depth = 0usize;
                let mut i = pos;
                while i < self.bytes.len() {
                    match self.bytes[i] {
                        b'"' => {
                            i = self.string_end(i)?;
                            continue;
                        }
                        b'{' | b'[' => depth += 1,
                        b'}' | b']' => {
                            depth -= 1;
                            if depth == 0 {
                                return Some(i + 1);
                            }
                        }
                        _ => {}
                    }
                    i += 1;
                }
                None
            }
            _ => {
                let mut i = pos;
                while i < self.bytes.len()
                    && !matches!(self.bytes[i], b',' | b'}' | b']')
                    && !self.bytes[i].is_ascii_whitespace()
                {
                    i += 1;
                }
                Some(i)
            }
        }
    }

    /// Span of the value stored under `key` in the object starting at `object_start`
    fn object_member(&self, object_start: usize, key: &str) -> Option<Range<usize>> {
        self.members(object_start)?
            .into_iter()
            .find(|member| member.key == key)
            .map(|member| member.value)
    }

    /// Every member of the object starting at `object_start`, in text order
    fn members(&self, object_start: usize) -> Option<Vec<MemberSpan>> {
        let mut members = Vec::new();
        let mut pos = self.skip_ws(object_start + 1);
        if self.bytes.get(pos) == Some(&b'}') {
            return Some(members);
        }

        loop {
            if self.bytes.get(pos) != Some(&b'"') {
                return None;
            }
            let key_end = self.string_end(pos)?;
            let raw_key = std::str::from_utf8(&self.bytes[pos..key_end]).ok()?;
            let key: String = serde_json::from_str(raw_key).ok()?;

            let colon = self.skip_ws(key_end);
            if self.bytes.get(colon) != Some(&b':') {
                return None;
            }
            let value_start = self.skip_ws(colon + 1);
            let value_end = self.value_end(value_start)?;

            let next = self.skip_ws(value_end);
            let comma = match self.bytes.get(next)? {
                b',' => Some(next),
                b'}' => None,
                _ => return None,
            };
            members.push(MemberSpan {
                key,
                key_start: pos,
                value: value_start..value_end,
                comma,
            });
            match comma {
                Some(comma) => pos = self.skip_ws(comma + 1),
                None => return Some(members),
            }
        }
    }
}
