//! In-memory display used by the unit tests
use std::{
    collections::{HashMap, HashSet},
    sync::{Mutex, MutexGuard},
};

use x11rb::protocol::xproto::EventMask;

use crate::{model::*, transport::*, NetwmResult};

pub(crate) const ROOT: Window = 0x1;

/// A client message as it went over the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Sent {
    pub destination: Window,
    pub mask: u32,
    pub message: ClientMessage,
}

#[derive(Debug, Default)]
struct MockState {
    atoms: HashMap<String, Atom>,
    failing: HashSet<String>,
    intern_batches: usize,
    property_batches: usize,
    properties: HashMap<(Window, Atom), PropertyReply>,
    writes: usize,
    sent: Vec<Sent>,
    geometry: HashMap<Window, (Rect, Point)>,
    geometry_queries: usize,
}

/// MockTransport keeps properties in a map and records every request it is given
#[derive(Debug, Default)]
pub(crate) struct MockTransport {
    state: Mutex<MockState>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    /// Atom the server handed out for `name`, interning it on demand
    pub fn atom(&self, name: &str) -> Atom {
        let mut state = self.lock();
        let next = 100 + state.atoms.len() as Atom;
        *state.atoms.entry(name.to_string()).or_insert(next)
    }

    pub fn fail_atom(&self, name: &str) {
        self.lock().failing.insert(name.to_string());
    }

    pub fn intern_batches(&self) -> usize {
        self.lock().intern_batches
    }

    pub fn property_batches(&self) -> usize {
        self.lock().property_batches
    }

    pub fn writes(&self) -> usize {
        self.lock().writes
    }

    pub fn set_raw(&self, window: Window, property: Atom, type_: Atom, format: u8, value: Vec<u8>) {
        self.lock().properties.insert((window, property), PropertyReply { type_, format, value });
    }

    pub fn set_words(&self, window: Window, property: Atom, type_: Atom, words: &[u32]) {
        let value = words.iter().flat_map(|x| x.to_ne_bytes()).collect();
        self.set_raw(window, property, type_, 32, value);
    }

    pub fn set_text(&self, window: Window, property: Atom, type_: Atom, text: &str) {
        self.set_raw(window, property, type_, 8, text.as_bytes().to_vec());
    }

    pub fn property(&self, window: Window, property: Atom) -> Option<PropertyReply> {
        self.lock().properties.get(&(window, property)).cloned()
    }

    /// Property value as 32 bit words, `None` when unset
    pub fn words(&self, window: Window, property: Atom) -> Option<Vec<u32>> {
        self.property(window, property).map(|reply| {
            reply.value.chunks_exact(4).map(|x| u32::from_ne_bytes([x[0], x[1], x[2], x[3]])).collect()
        })
    }

    pub fn text(&self, window: Window, property: Atom) -> Option<String> {
        self.property(window, property).map(|reply| String::from_utf8_lossy(&reply.value).into_owned())
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.lock().sent.clone()
    }

    pub fn clear_sent(&self) {
        self.lock().sent.clear();
    }

    /// Geometry relative to the parent plus the absolute origin of the window
    pub fn set_geometry(&self, window: Window, rect: Rect, origin: Point) {
        self.lock().geometry.insert(window, (rect, origin));
    }

    pub fn geometry_queries(&self) -> usize {
        self.lock().geometry_queries
    }
}

impl Transport for MockTransport {
    fn default_screen(&self) -> usize {
        0
    }

    fn screen(&self, screen: usize) -> Option<ScreenInfo> {
        (screen == 0).then_some(ScreenInfo { root: ROOT, size: Size::new(1920, 1080) })
    }

    fn intern_atoms(&self, names: &[&str]) -> NetwmResult<Vec<Option<Atom>>> {
        self.lock().intern_batches += 1;
        Ok(names
            .iter()
            .map(|name| {
                let failing = self.lock().failing.contains(*name);
                (!failing).then(|| self.atom(name))
            })
            .collect())
    }

    fn get_properties(&self, requests: &[PropertyRequest]) -> NetwmResult<Vec<Option<PropertyReply>>> {
        let mut state = self.lock();
        state.property_batches += 1;
        Ok(requests
            .iter()
            .map(|req| match state.properties.get(&(req.window, req.property)) {
                None => Some(PropertyReply::default()),

                // Type mismatch returns the actual type with no data, like the server does
                Some(reply) if req.type_ != NONE && reply.type_ != req.type_ => {
                    Some(PropertyReply { type_: reply.type_, format: reply.format, value: vec![] })
                },
                Some(reply) => {
                    let mut reply = reply.clone();
                    reply.value.truncate(req.long_length.saturating_mul(4) as usize);
                    Some(reply)
                },
            })
            .collect())
    }

    fn change_property(
        &self, window: Window, property: Atom, type_: Atom, format: u8, data: &[u8],
    ) -> NetwmResult<()> {
        let mut state = self.lock();
        state.writes += 1;
        state.properties.insert((window, property), PropertyReply { type_, format, value: data.to_vec() });
        Ok(())
    }

    fn delete_property(&self, window: Window, property: Atom) -> NetwmResult<()> {
        let mut state = self.lock();
        state.writes += 1;
        state.properties.remove(&(window, property));
        Ok(())
    }

    fn send_event(&self, destination: Window, mask: EventMask, message: &ClientMessage) -> NetwmResult<()> {
        let message = match NetEvent::parse(&message.to_wire()) {
            NetEvent::ClientMessage(message) => message,
            other => panic!("client message did not survive the wire: {:?}", other),
        };
        self.lock().sent.push(Sent { destination, mask: mask.into(), message });
        Ok(())
    }

    fn get_geometry(&self, window: Window) -> NetwmResult<Option<Rect>> {
        let mut state = self.lock();
        state.geometry_queries += 1;
        Ok(state.geometry.get(&window).map(|(rect, _)| *rect))
    }

    fn translate_coordinates(&self, window: Window, _dest: Window) -> NetwmResult<Option<Point>> {
        Ok(self.lock().geometry.get(&window).map(|(_, origin)| *origin))
    }

    fn flush(&self) -> NetwmResult<()> {
        Ok(())
    }
}
