//! [`Transport`] over a live X server using `x11rb`'s pure Rust connection
use tracing::{debug, trace};
use x11rb::{
    connection::Connection,
    errors::ReplyError,
    protocol::xproto::{ChangeWindowAttributesAux, ConnectionExt, EventMask, PropMode},
    rust_connection::RustConnection,
};

use crate::{
    model::*,
    transport::{ClientMessage, NetEvent, PropertyReply, PropertyRequest, ScreenInfo, Transport},
    NetwmResult,
};

/// X11Transport owns the display connection the engine talks through
#[derive(Debug)]
pub struct X11Transport {
    conn: RustConnection,
    screen: usize,
}

impl X11Transport {
    /// Connect to the X server
    ///
    /// ### Arguments
    /// * `display` - display name such as `:1`, `$DISPLAY` is used when `None`
    pub fn connect(display: Option<&str>) -> NetwmResult<Self> {
        let (conn, screen) = x11rb::connect(display)?;
        let display_name = display;
        debug!("connect: display: {:?}, screen: {}", display_name, screen);
        Ok(Self { conn, screen })
    }

    /// Underlying connection for requests outside the protocol engine
    pub fn connection(&self) -> &RustConnection {
        &self.conn
    }

    /// Subscribe to the property and configure notifications of a window
    pub fn select_events(&self, window: Window) -> NetwmResult<()> {
        let aux = ChangeWindowAttributesAux::new().event_mask(EventMask::PROPERTY_CHANGE | EventMask::STRUCTURE_NOTIFY);
        self.conn.change_window_attributes(window, &aux)?;
        self.conn.flush()?;
        Ok(())
    }

    /// Block until the next event arrives and decode it
    pub fn next_event(&self) -> NetwmResult<NetEvent> {
        let raw = self.conn.wait_for_raw_event()?;
        let event = NetEvent::parse(&raw);
        trace!("next_event: code: {}, event: {:?}", raw.first().copied().unwrap_or_default(), event);
        Ok(event)
    }
}

// Server side errors mean the reply is missing, anything else is a broken connection
fn optional<R>(reply: Result<R, ReplyError>) -> NetwmResult<Option<R>> {
    match reply {
        Ok(reply) => Ok(Some(reply)),
        Err(ReplyError::X11Error(err)) => {
            debug!("optional: x11 error: {:?}", err.error_kind);
            Ok(None)
        },
        Err(err) => Err(err.into()),
    }
}

impl Transport for X11Transport {
    fn default_screen(&self) -> usize {
        self.screen
    }

    fn screen(&self, screen: usize) -> Option<ScreenInfo> {
        self.conn.setup().roots.get(screen).map(|x| ScreenInfo {
            root: x.root,
            size: Size::new(x.width_in_pixels as i32, x.height_in_pixels as i32),
        })
    }

    fn intern_atoms(&self, names: &[&str]) -> NetwmResult<Vec<Option<Atom>>> {
        let mut cookies = Vec::with_capacity(names.len());
        for name in names {
            cookies.push(self.conn.intern_atom(false, name.as_bytes())?);
        }
        let mut atoms = Vec::with_capacity(names.len());
        for cookie in cookies {
            atoms.push(optional(cookie.reply())?.map(|x| x.atom).filter(|x| *x != NONE));
        }
        Ok(atoms)
    }

    fn get_properties(&self, requests: &[PropertyRequest]) -> NetwmResult<Vec<Option<PropertyReply>>> {
        let mut cookies = Vec::with_capacity(requests.len());
        for req in requests {
            cookies.push(self.conn.get_property(false, req.window, req.property, req.type_, 0, req.long_length)?);
        }
        let mut replies = Vec::with_capacity(requests.len());
        for cookie in cookies {
            let reply = optional(cookie.reply())?;
            replies.push(reply.map(|x| PropertyReply { type_: x.type_, format: x.format, value: x.value }));
        }
        Ok(replies)
    }

    fn change_property(
        &self, window: Window, property: Atom, type_: Atom, format: u8, data: &[u8],
    ) -> NetwmResult<()> {
        let items = match format {
            32 => data.len() / 4,
            16 => data.len() / 2,
            _ => data.len(),
        };
        self.conn.change_property(PropMode::REPLACE, window, property, type_, format, items as u32, data)?;
        Ok(())
    }

    fn delete_property(&self, window: Window, property: Atom) -> NetwmResult<()> {
        self.conn.delete_property(window, property)?;
        Ok(())
    }

    fn send_event(&self, destination: Window, mask: EventMask, message: &ClientMessage) -> NetwmResult<()> {
        self.conn.send_event(false, destination, mask, message.to_wire())?;
        Ok(())
    }

    fn get_geometry(&self, window: Window) -> NetwmResult<Option<Rect>> {
        let reply = optional(self.conn.get_geometry(window)?.reply())?;
        Ok(reply.map(|x| Rect::new(x.x as i32, x.y as i32, x.width as i32, x.height as i32)))
    }

    fn translate_coordinates(&self, window: Window, dest: Window) -> NetwmResult<Option<Point>> {
        let reply = optional(self.conn.translate_coordinates(window, dest, 0, 0)?.reply())?;
        Ok(reply.map(|x| Point::new(x.dst_x as i32, x.dst_y as i32)))
    }

    fn flush(&self) -> NetwmResult<()> {
        self.conn.flush()?;
        Ok(())
    }
}
