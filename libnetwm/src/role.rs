//! Role strategies.
//!
//! Every mutator of `RootInfo` and `WinInfo` describes what it wants as a [`Change`] and hands it
//! to the strategy picked at construction. The window manager writes properties itself while a
//! client asks the window manager to do so with a client message, or does nothing at all when
//! the property is not its to change.
use std::fmt;

use tracing::debug;
use x11rb::protocol::xproto::EventMask;

use crate::{
    codec::PropertyWrite,
    model::*,
    transport::{netwm_sendevent_mask, ClientMessage, Transport},
    NetwmResult,
};

/// Request is a client message together with where and how it is sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Request {
    pub destination: Window,
    pub mask: EventMask,
    pub message: ClientMessage,
}

impl Request {
    /// Message for the window manager, sent to the root window
    pub fn to_root(root: Window, window: Window, message_type: Atom, data: [u32; 5]) -> Self {
        Self { destination: root, mask: netwm_sendevent_mask(), message: ClientMessage::new(window, message_type, data) }
    }

    /// Message delivered to the window itself without any event mask
    pub fn to_window(window: Window, message_type: Atom, data: [u32; 5]) -> Self {
        Self { destination: window, mask: EventMask::NO_EVENT, message: ClientMessage::new(window, message_type, data) }
    }

    /// Send the message; messages of an uninterned type are skipped
    pub fn send<T: Transport + ?Sized>(&self, transport: &T) -> NetwmResult<()> {
        if self.message.message_type == NONE {
            return Ok(());
        }
        debug!(
            "send: destination: {}, window: {}, type: {}, data: {:?}",
            self.destination, self.message.window, self.message.message_type, self.message.data
        );
        transport.send_event(self.destination, self.mask, &self.message)
    }
}

/// Change describes who may change a property and how
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Change {
    /// Only the named role writes, the other role's call is a no-op
    Owned(Role, PropertyWrite),
    /// The window manager writes, clients send the request instead
    Negotiated(PropertyWrite, Request),
    /// Either role writes
    Shared(PropertyWrite),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Applied {
    /// The property was written and local state may follow
    Written,
    /// A request went to the window manager, local state follows its notification
    Requested,
    Ignored,
}

pub(crate) trait ChangeApplier: fmt::Debug + Send + Sync {
    fn role(&self) -> Role;

    fn apply(&self, transport: &dyn Transport, change: Change) -> NetwmResult<Applied>;
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct WindowManagerWriter;

impl ChangeApplier for WindowManagerWriter {
    fn role(&self) -> Role {
        Role::WindowManager
    }

    fn apply(&self, transport: &dyn Transport, change: Change) -> NetwmResult<Applied> {
        let write = match change {
            Change::Owned(Role::Client, write) => {
                debug!("apply: client owned property {} ignored", write.property);
                return Ok(Applied::Ignored);
            },
            Change::Owned(Role::WindowManager, write) | Change::Negotiated(write, _) | Change::Shared(write) => write,
        };
        write.apply(transport)?;
        transport.flush()?;
        Ok(Applied::Written)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ClientRequester;

impl ChangeApplier for ClientRequester {
    fn role(&self) -> Role {
        Role::Client
    }

    fn apply(&self, transport: &dyn Transport, change: Change) -> NetwmResult<Applied> {
        match change {
            Change::Owned(Role::WindowManager, write) => {
                debug!("apply: window manager owned property {} ignored", write.property);
                Ok(Applied::Ignored)
            },
            Change::Owned(Role::Client, write) | Change::Shared(write) => {
                write.apply(transport)?;
                transport.flush()?;
                Ok(Applied::Written)
            },
            Change::Negotiated(_, request) => {
                request.send(transport)?;
                transport.flush()?;
                Ok(Applied::Requested)
            },
        }
    }
}

/// Strategy for the given role
pub(crate) fn applier(role: Role) -> Box<dyn ChangeApplier> {
    match role {
        Role::Client => Box::new(ClientRequester),
        Role::WindowManager => Box::new(WindowManagerWriter),
    }
}
