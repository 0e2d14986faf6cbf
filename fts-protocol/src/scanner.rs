//! Incremental decoder for a streamed select response body.
//!
//! The scanner is fed raw body chunks and yields [`ScanEvent`]s as soon as
//! the corresponding JSON value is complete, so the first document is
//! available before the rest of the body has arrived. It only tracks
//! enough structure to find the sections it cares about; each section is
//! handed to `serde_json` once its closing bracket is seen.
//!
//! Sections captured (all others are skipped):
//!
//! - `responseHeader` (top level) → [`ScanEvent::Header`]
//! - each element of `response.docs` → [`ScanEvent::Doc`]
//! - `highlighting` (top level) → [`ScanEvent::Highlighting`]
//! - `error` (top level) → [`ScanEvent::Error`]
//!
//! Bytes before the start of the section being captured are discarded, so
//! memory use is bounded by the largest single section. Scalars outside the
//! captured sections are still checked to be JSON tokens, and a body that
//! never closes a `response.docs` array is rejected by [`DocScanner::finish`].

use serde::de::IgnoredAny;
use serde_json::{Map, Value as JsonValue};

use crate::error::{ProtocolError, Result};
use crate::response::{Highlighting, ResponseHeader, SolrErrorDetail};

/// A decoded section of the response body.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanEvent {
    Header(ResponseHeader),
    Doc(Map<String, JsonValue>),
    Highlighting(Highlighting),
    Error(SolrErrorDetail),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameKind {
    Object,
    Array,
}

#[derive(Debug)]
struct Frame {
    kind: FrameKind,
    /// Key under which this container appears in its parent object.
    key: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Header,
    Doc,
    Highlighting,
    Error,
}

impl Section {
    fn name(self) -> &'static str {
        match self {
            Section::Header => "responseHeader",
            Section::Doc => "document",
            Section::Highlighting => "highlighting",
            Section::Error => "error",
        }
    }
}

#[derive(Debug)]
struct Capture {
    section: Section,
    /// Offset of the opening bracket in `buf`.
    start: usize,
    /// Stack depth of the captured container once pushed.
    depth: usize,
}

/// Keys are only tracked this deep (top-level object and `response`).
const KEY_TRACK_DEPTH: usize = 2;

/// Incremental select-response decoder.
#[derive(Debug, Default)]
pub struct DocScanner {
    buf: Vec<u8>,
    pos: usize,
    stack: Vec<Frame>,
    in_string: bool,
    escape: bool,
    collecting: bool,
    string_buf: Vec<u8>,
    last_string: Option<String>,
    pending_key: Option<String>,
    capture: Option<Capture>,
    /// Scalar token being read outside a capture.
    token: Vec<u8>,
    docs_opened: bool,
    docs_closed: bool,
    started: bool,
    finished: bool,
}

impl DocScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a body chunk.
    pub fn push(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Whether the top-level object has been closed.
    pub fn is_complete(&self) -> bool {
        self.finished
    }

    /// Decode the next complete section from the buffered bytes.
    ///
    /// Returns `Ok(None)` when more input is needed (or the body is
    /// complete). Call [`DocScanner::finish`] after the last chunk.
    pub fn next_event(&mut self) -> Result<Option<ScanEvent>> {
        while self.pos < self.buf.len() {
            let b = self.buf[self.pos];

            if self.in_string {
                self.scan_string_byte(b);
                self.pos += 1;
                continue;
            }

            let delimiter = matches!(
                b,
                b'"' | b':' | b',' | b'{' | b'[' | b'}' | b']' | b' ' | b'\t' | b'\n' | b'\r'
            );
            if delimiter {
                self.end_token()?;
            }

            match b {
                b'"' => {
                    self.in_string = true;
                    self.collecting =
                        self.capture.is_none() && self.stack.len() <= KEY_TRACK_DEPTH;
                    self.string_buf.clear();
                    self.last_string = None;
                }
                b':' => {
                    if self.top_kind() == Some(FrameKind::Object) {
                        self.pending_key = self.last_string.take();
                    }
                }
                b',' => {
                    self.pending_key = None;
                    self.last_string = None;
                }
                b'{' | b'[' => self.open_container(b)?,
                b'}' | b']' => {
                    if let Some(event) = self.close_container(b)? {
                        self.pos += 1;
                        self.compact();
                        return Ok(Some(event));
                    }
                }
                b' ' | b'\t' | b'\n' | b'\r' => {}
                _ => {
                    if self.stack.is_empty() {
                        return Err(ProtocolError::UnexpectedStructure(format!(
                            "unexpected byte 0x{b:02x} outside the top-level object"
                        )));
                    }
                    if self.capture.is_none() {
                        self.token.push(b);
                    }
                }
            }
            self.pos += 1;
        }

        self.compact();
        Ok(None)
    }

    /// Check that the body formed one complete select response: a single
    /// top-level object holding a `response.docs` array.
    pub fn finish(&self) -> Result<()> {
        if !self.started {
            return Err(ProtocolError::UnexpectedStructure(
                "empty response body".to_string(),
            ));
        }
        if !self.finished {
            return Err(ProtocolError::Truncated);
        }
        if !self.docs_closed {
            return Err(ProtocolError::UnexpectedStructure(
                "no response.docs array".to_string(),
            ));
        }
        Ok(())
    }

    /// Validate the scalar token just ended (number, `true`, `false`, `null`).
    fn end_token(&mut self) -> Result<()> {
        if self.token.is_empty() {
            return Ok(());
        }
        let valid = serde_json::from_slice::<IgnoredAny>(&self.token).is_ok();
        if !valid {
            let token = String::from_utf8_lossy(&self.token).into_owned();
            self.token.clear();
            return Err(ProtocolError::UnexpectedStructure(format!(
                "invalid JSON token '{token}'"
            )));
        }
        self.token.clear();
        Ok(())
    }

    fn scan_string_byte(&mut self, b: u8) {
        if self.escape {
            self.escape = false;
        } else if b == b'\\' {
            self.escape = true;
        } else if b == b'"' {
            self.in_string = false;
            if self.collecting {
                self.last_string = Some(String::from_utf8_lossy(&self.string_buf).into_owned());
                self.collecting = false;
            }
            return;
        }
        if self.collecting {
            self.string_buf.push(b);
        }
    }

    fn top_kind(&self) -> Option<FrameKind> {
        self.stack.last().map(|f| f.kind)
    }

    fn open_container(&mut self, b: u8) -> Result<()> {
        if self.stack.is_empty() {
            if self.finished {
                return Err(ProtocolError::UnexpectedStructure(
                    "trailing data after the top-level object".to_string(),
                ));
            }
            if b != b'{' {
                return Err(ProtocolError::UnexpectedStructure(
                    "top-level JSON value is not an object".to_string(),
                ));
            }
            self.started = true;
        }

        let kind = if b == b'{' {
            FrameKind::Object
        } else {
            FrameKind::Array
        };
        let key = self.pending_key.take();
        self.stack.push(Frame { kind, key });
        if self.at_docs_array() {
            self.docs_opened = true;
        }

        if self.capture.is_none() {
            if let Some(section) = self.section_at_top() {
                self.capture = Some(Capture {
                    section,
                    start: self.pos,
                    depth: self.stack.len(),
                });
            }
        }
        Ok(())
    }

    /// Whether the top of the stack is the `response.docs` array.
    fn at_docs_array(&self) -> bool {
        self.stack.len() == 3
            && self.stack[1].kind == FrameKind::Object
            && self.stack[1].key.as_deref() == Some("response")
            && self.stack[2].kind == FrameKind::Array
            && self.stack[2].key.as_deref() == Some("docs")
    }

    /// Section starting at the container just pushed, if any.
    fn section_at_top(&self) -> Option<Section> {
        let top = self.stack.last()?;
        if top.kind != FrameKind::Object {
            return None;
        }
        match self.stack.len() {
            2 => match top.key.as_deref() {
                Some("responseHeader") => Some(Section::Header),
                Some("highlighting") => Some(Section::Highlighting),
                Some("error") => Some(Section::Error),
                _ => None,
            },
            4 => {
                let response = &self.stack[1];
                let docs = &self.stack[2];
                let is_docs = response.kind == FrameKind::Object
                    && response.key.as_deref() == Some("response")
                    && docs.kind == FrameKind::Array
                    && docs.key.as_deref() == Some("docs");
                is_docs.then_some(Section::Doc)
            }
            _ => None,
        }
    }

    fn close_container(&mut self, b: u8) -> Result<Option<ScanEvent>> {
        let expected = if b == b'}' {
            FrameKind::Object
        } else {
            FrameKind::Array
        };
        if self.docs_opened && self.at_docs_array() {
            self.docs_closed = true;
        }
        let frame = self.stack.pop().ok_or_else(|| {
            ProtocolError::UnexpectedStructure("unbalanced closing bracket".to_string())
        })?;
        if frame.kind != expected {
            return Err(ProtocolError::UnexpectedStructure(
                "mismatched brackets".to_string(),
            ));
        }
        self.pending_key = None;
        self.last_string = None;
        if self.stack.is_empty() {
            self.finished = true;
        }

        let Some(capture) = self.capture.as_ref() else {
            return Ok(None);
        };
        if self.stack.len() + 1 != capture.depth {
            return Ok(None);
        }

        let section = capture.section;
        let bytes = &self.buf[capture.start..=self.pos];
        let event = decode_section(section, bytes)?;
        self.capture = None;
        Ok(Some(event))
    }

    /// Drop bytes that can no longer be part of a captured section.
    fn compact(&mut self) {
        let keep_from = match &self.capture {
            Some(c) => c.start,
            None => self.pos,
        };
        if keep_from == 0 {
            return;
        }
        self.buf.drain(..keep_from);
        self.pos -= keep_from;
        if let Some(c) = self.capture.as_mut() {
            c.start = 0;
        }
    }
}

fn decode_section(section: Section, bytes: &[u8]) -> Result<ScanEvent> {
    let wrap = |source| ProtocolError::MalformedSection {
        section: section.name(),
        source,
    };
    Ok(match section {
        Section::Header => ScanEvent::Header(serde_json::from_slice(bytes).map_err(wrap)?),
        Section::Doc => ScanEvent::Doc(serde_json::from_slice(bytes).map_err(wrap)?),
        Section::Highlighting => {
            ScanEvent::Highlighting(serde_json::from_slice(bytes).map_err(wrap)?)
        }
        Section::Error => ScanEvent::Error(serde_json::from_slice(bytes).map_err(wrap)?),
    })
}
