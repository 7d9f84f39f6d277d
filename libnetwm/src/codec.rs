//! Batched property reads, typed decoding of the replies and encoding of property writes.
//!
//! Every decoder is total: a reply of the wrong type or format, or one with a ragged length,
//! decodes to the zero value of the field instead of an error.
use tracing::{debug, trace};

use crate::{
    atoms::{CARDINAL, STRING},
    model::*,
    transport::{PropertyReply, PropertyRequest, Transport},
    NetwmResult,
};

/// Read length, in 32 bit units, for lists and strings
pub(crate) const MAX_PROP_SIZE: u32 = 100_000;

/// PropertyBatch collects reads so they are all issued before any reply is awaited
#[derive(Debug, Default)]
pub(crate) struct PropertyBatch {
    requests: Vec<Option<PropertyRequest>>,
}

impl PropertyBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a read; a `NONE` property still takes a slot but is never sent
    pub fn push(&mut self, window: Window, property: Atom, type_: Atom, long_length: u32) {
        let req = (property != NONE).then_some(PropertyRequest { window, property, type_, long_length });
        self.requests.push(req);
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Send every queued request then collect the replies in queue order
    pub fn fetch<T: Transport + ?Sized>(self, transport: &T) -> NetwmResult<Replies> {
        let wire: Vec<PropertyRequest> = self.requests.iter().flatten().copied().collect();
        debug!("fetch: queued: {}, sent: {}", self.requests.len(), wire.len());
        let fetched = match wire.is_empty() {
            true => vec![],
            false => transport.get_properties(&wire)?,
        };
        let mut fetched = fetched.into_iter();

        let replies = self
            .requests
            .iter()
            .map(|req| match req {
                Some(_) => fetched.next().flatten(),
                None => None,
            })
            .collect::<Vec<_>>();
        Ok(Replies { replies: replies.into_iter() })
    }
}

/// Replies of a batch, consumed in the order the requests were queued
#[derive(Debug)]
pub(crate) struct Replies {
    replies: std::vec::IntoIter<Option<PropertyReply>>,
}

impl Replies {
    pub fn take(&mut self) -> Option<PropertyReply> {
        self.replies.next().flatten()
    }
}

/// Raw bytes of a reply that matches the expected type and format and is not empty
fn matching(reply: Option<&PropertyReply>, type_: Atom, format: u8) -> Option<&[u8]> {
    let reply = reply?;
    if reply.type_ != type_ || reply.format != format || reply.value.is_empty() {
        if reply.type_ != NONE {
            trace!("matching: dropped: type: {}, format: {}, expected: {}/{}", reply.type_, reply.format, type_, format);
        }
        return None;
    }
    Some(&reply.value)
}

/// Array of 32 bit items, empty on any mismatch or a length that is not a whole number of items
pub(crate) fn array32(reply: Option<&PropertyReply>, type_: Atom) -> Vec<u32> {
    match matching(reply, type_, 32) {
        Some(bytes) if bytes.len() % 4 == 0 => {
            bytes.chunks_exact(4).map(|x| u32::from_ne_bytes([x[0], x[1], x[2], x[3]])).collect()
        },
        Some(bytes) => {
            debug!("array32: ragged reply of {} bytes", bytes.len());
            vec![]
        },
        None => vec![],
    }
}

/// Single 32 bit value; the reply must carry exactly one item
pub(crate) fn value32(reply: Option<&PropertyReply>, type_: Atom) -> Option<u32> {
    match array32(reply, type_).as_slice() {
        [x] => Some(*x),
        _ => None,
    }
}

/// Fixed size struct of 32 bit items, `None` when the reply is shorter
pub(crate) fn fixed32<const N: usize>(reply: Option<&PropertyReply>, type_: Atom) -> Option<[i32; N]> {
    let words = array32(reply, type_);
    if words.len() < N {
        return None;
    }
    let mut out = [0i32; N];
    for (dst, src) in out.iter_mut().zip(words) {
        *dst = src as i32;
    }
    Some(out)
}

fn text(bytes: &[u8], type_: Atom) -> String {
    match type_ {
        // STRING is Latin-1
        STRING => bytes.iter().map(|x| *x as char).collect(),
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// 8 bit text with a single trailing NUL removed
pub(crate) fn string(reply: Option<&PropertyReply>, type_: Atom) -> String {
    match matching(reply, type_, 8) {
        Some(bytes) => text(bytes.strip_suffix(&[0]).unwrap_or(bytes), type_),
        None => String::new(),
    }
}

/// NUL separated strings; the trailing NUL does not produce an extra empty entry
pub(crate) fn string_list(reply: Option<&PropertyReply>, type_: Atom) -> Vec<String> {
    match matching(reply, type_, 8) {
        Some(bytes) => bytes.strip_suffix(&[0]).unwrap_or(bytes).split(|x| *x == 0).map(|x| text(x, type_)).collect(),
        None => vec![],
    }
}

/// Icons stored back to back as width, height and width*height pixels
pub(crate) fn icons(reply: Option<&PropertyReply>) -> Vec<Icon> {
    let words = array32(reply, CARDINAL);
    let mut icons = vec![];
    let mut rest = words.as_slice();
    while rest.len() >= 2 {
        let (width, height) = (rest[0], rest[1]);
        let area = (width as usize).saturating_mul(height as usize);
        if area == 0 || rest.len() - 2 < area {
            debug!("icons: truncated icon {}x{}", width, height);
            break;
        }
        icons.push(Icon::new(width as i32, height as i32, rest[2..2 + area].to_vec()));
        rest = &rest[2 + area..];
    }
    icons
}

pub(crate) fn icons_words(icons: &[Icon]) -> Vec<u32> {
    let mut words = vec![];
    for icon in icons.iter().filter(|x| !x.is_empty()) {
        words.push(icon.size.width as u32);
        words.push(icon.size.height as u32);
        words.extend_from_slice(&icon.data);
    }
    words
}

/// Each entry followed by a NUL, absent entries written as empty strings
pub(crate) fn string_list_bytes<S: AsRef<str>>(items: &[Option<S>]) -> Vec<u8> {
    let mut bytes = vec![];
    for item in items {
        if let Some(x) = item {
            bytes.extend_from_slice(x.as_ref().as_bytes());
        }
        bytes.push(0);
    }
    bytes
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Value {
    Words(Atom, Vec<u32>),
    Bytes(Atom, Vec<u8>),
    Delete,
}

/// PropertyWrite is one pending change of a property value
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PropertyWrite {
    pub window: Window,
    pub property: Atom,
    pub value: Value,
}

impl PropertyWrite {
    pub fn words(window: Window, property: Atom, type_: Atom, words: Vec<u32>) -> Self {
        Self { window, property, value: Value::Words(type_, words) }
    }

    pub fn bytes(window: Window, property: Atom, type_: Atom, bytes: Vec<u8>) -> Self {
        Self { window, property, value: Value::Bytes(type_, bytes) }
    }

    pub fn delete(window: Window, property: Atom) -> Self {
        Self { window, property, value: Value::Delete }
    }

    /// Perform the write; writes to a property that could not be interned are skipped
    pub fn apply<T: Transport + ?Sized>(&self, transport: &T) -> NetwmResult<()> {
        if self.property == NONE {
            trace!("apply: skipped write to uninterned property on {}", self.window);
            return Ok(());
        }
        match &self.value {
            Value::Words(type_, words) => {
                let data: Vec<u8> = words.iter().flat_map(|x| x.to_ne_bytes()).collect();
                debug!("apply: window: {}, property: {}, items: {}", self.window, self.property, words.len());
                transport.change_property(self.window, self.property, *type_, 32, &data)
            },
            Value::Bytes(type_, bytes) => {
                debug!("apply: window: {}, property: {}, bytes: {}", self.window, self.property, bytes.len());
                transport.change_property(self.window, self.property, *type_, 8, bytes)
            },
            Value::Delete => {
                debug!("apply: window: {}, delete: {}", self.window, self.property);
                transport.delete_property(self.window, self.property)
            },
        }
    }
}
