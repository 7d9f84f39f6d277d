//! The display connection as seen by the protocol engine.
//!
//! `RootInfo` and `WinInfo` only ever talk to the display through the object safe [`Transport`]
//! trait so that the engine can be driven by `x11rb` in production and by an in-memory fake in
//! tests. Events come back in as raw 32 byte X11 packets and are decoded by [`NetEvent::parse`].
use x11rb::protocol::xproto::EventMask;

use crate::{model::*, NetwmResult};

/// Event mask every root window request is sent with
pub fn netwm_sendevent_mask() -> EventMask {
    EventMask::SUBSTRUCTURE_REDIRECT | EventMask::SUBSTRUCTURE_NOTIFY
}

// X11 event codes the engine cares about
const CONFIGURE_NOTIFY: u8 = 22;
const PROPERTY_NOTIFY: u8 = 28;
const CLIENT_MESSAGE: u8 = 33;

/// Screen geometry published in the connection setup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenInfo {
    pub root: Window,
    pub size: Size,
}

/// One "get property" request of a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyRequest {
    pub window: Window,
    pub property: Atom,
    pub type_: Atom,
    /// Maximum length to read, in 32 bit units
    pub long_length: u32,
}

/// Raw property value exactly as the server returned it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyReply {
    pub type_: Atom,
    pub format: u8,
    pub value: Vec<u8>,
}

/// Client message with a 32 bit payload of five words
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientMessage {
    pub format: u8,
    pub window: Window,
    pub message_type: Atom,
    pub data: [u32; 5],
}

impl ClientMessage {
    pub fn new(window: Window, message_type: Atom, data: [u32; 5]) -> Self {
        Self { format: 32, window, message_type, data }
    }

    /// Encode as the 32 byte event body carried by a SendEvent request
    pub fn to_wire(&self) -> [u8; 32] {
        let mut buf = [0u8; 32];
        buf[0] = CLIENT_MESSAGE;
        buf[1] = self.format;
        buf[4..8].copy_from_slice(&self.window.to_ne_bytes());
        buf[8..12].copy_from_slice(&self.message_type.to_ne_bytes());
        for (i, word) in self.data.iter().enumerate() {
            let at = 12 + i * 4;
            buf[at..at + 4].copy_from_slice(&word.to_ne_bytes());
        }
        buf
    }
}

/// NetEvent is the part of an X11 event the protocol engine understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetEvent {
    PropertyNotify { window: Window, atom: Atom },
    ClientMessage(ClientMessage),
    ConfigureNotify { window: Window, geometry: Rect },
    Other,
}

impl NetEvent {
    /// Decode a raw X11 event; short or unrelated packets become `Other`
    pub fn parse(raw: &[u8]) -> NetEvent {
        if raw.len() < 32 {
            return NetEvent::Other;
        }
        let u32_at = |at: usize| u32::from_ne_bytes([raw[at], raw[at + 1], raw[at + 2], raw[at + 3]]);
        let i16_at = |at: usize| i16::from_ne_bytes([raw[at], raw[at + 1]]) as i32;
        let u16_at = |at: usize| u16::from_ne_bytes([raw[at], raw[at + 1]]) as i32;

        // High bit marks events delivered through SendEvent
        match raw[0] & 0x7f {
            PROPERTY_NOTIFY => NetEvent::PropertyNotify { window: u32_at(4), atom: u32_at(8) },
            CLIENT_MESSAGE => {
                let mut data = [0u32; 5];
                for (i, word) in data.iter_mut().enumerate() {
                    *word = u32_at(12 + i * 4);
                }
                NetEvent::ClientMessage(ClientMessage {
                    format: raw[1],
                    window: u32_at(4),
                    message_type: u32_at(8),
                    data,
                })
            },
            CONFIGURE_NOTIFY => NetEvent::ConfigureNotify {
                window: u32_at(8),
                geometry: Rect::new(i16_at(16), i16_at(18), u16_at(20), u16_at(22)),
            },
            _ => NetEvent::Other,
        }
    }
}

/// Transport is the display connection the engine issues its requests through.
///
/// Methods that collect replies block; everything else only queues the request. A reply that is
/// missing because the server returned an X11 error is `None`, a broken connection is an `Err`.
pub trait Transport {
    /// Screen selected by the display name the connection was opened with
    fn default_screen(&self) -> usize;

    /// Root window and size of the given screen
    fn screen(&self, screen: usize) -> Option<ScreenInfo>;

    /// Intern every name in one round trip, replies in request order
    fn intern_atoms(&self, names: &[&str]) -> NetwmResult<Vec<Option<Atom>>>;

    /// Issue every request before collecting any reply, replies in request order
    fn get_properties(&self, requests: &[PropertyRequest]) -> NetwmResult<Vec<Option<PropertyReply>>>;

    /// Replace a property; `data` holds native endian items of `format` bits
    fn change_property(
        &self, window: Window, property: Atom, type_: Atom, format: u8, data: &[u8],
    ) -> NetwmResult<()>;

    fn delete_property(&self, window: Window, property: Atom) -> NetwmResult<()>;

    fn send_event(&self, destination: Window, mask: EventMask, message: &ClientMessage) -> NetwmResult<()>;

    /// Geometry of the window relative to its parent
    fn get_geometry(&self, window: Window) -> NetwmResult<Option<Rect>>;

    /// Position of the window origin in the coordinate space of `dest`
    fn translate_coordinates(&self, window: Window, dest: Window) -> NetwmResult<Option<Point>>;

    fn flush(&self) -> NetwmResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_message_wire() {
        let msg = ClientMessage::new(0x400001, 321, [1, 2, 3, 4, 0xFFFF_FFFF]);
        let wire = msg.to_wire();
        assert_eq!(wire[0], 33);
        assert_eq!(wire[1], 32);
        assert_eq!(&wire[4..8], &0x400001u32.to_ne_bytes());
        assert_eq!(&wire[28..32], &[0xff; 4]);
        assert_eq!(NetEvent::parse(&wire), NetEvent::ClientMessage(msg));
    }

    #[test]
    fn test_parse_send_event_flag() {
        let mut wire = ClientMessage::new(7, 8, [0; 5]).to_wire();
        wire[0] |= 0x80;
        assert!(matches!(NetEvent::parse(&wire), NetEvent::ClientMessage(m) if m.window == 7));
    }

    #[test]
    fn test_parse_property_notify() {
        let mut raw = [0u8; 32];
        raw[0] = 28;
        raw[4..8].copy_from_slice(&99u32.to_ne_bytes());
        raw[8..12].copy_from_slice(&301u32.to_ne_bytes());
        assert_eq!(NetEvent::parse(&raw), NetEvent::PropertyNotify { window: 99, atom: 301 });
    }

    #[test]
    fn test_parse_configure_notify() {
        let mut raw = [0u8; 32];
        raw[0] = 22;
        raw[8..12].copy_from_slice(&5u32.to_ne_bytes());
        raw[16..18].copy_from_slice(&(-10i16).to_ne_bytes());
        raw[18..20].copy_from_slice(&20i16.to_ne_bytes());
        raw[20..22].copy_from_slice(&640u16.to_ne_bytes());
        raw[22..24].copy_from_slice(&480u16.to_ne_bytes());
        assert_eq!(NetEvent::parse(&raw), NetEvent::ConfigureNotify { window: 5, geometry: Rect::new(-10, 20, 640, 480) });
    }

    #[test]
    fn test_parse_other() {
        assert_eq!(NetEvent::parse(&[0u8; 8]), NetEvent::Other);
        let mut raw = [0u8; 32];
        raw[0] = 12;
        assert_eq!(NetEvent::parse(&raw), NetEvent::Other);
    }
}
