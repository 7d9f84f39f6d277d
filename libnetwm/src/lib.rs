//! `libnetwm` implements the [Extended Window Manager Hints (EWMH) specification](https://specifications.freedesktop.org/wm-spec/latest/)
//! as a protocol engine usable from both sides of the conversation: by window managers publishing
//! the desktop state and by clients such as pagers, taskbars and applications reading it and
//! requesting changes. The EWMH specification builds on the lower level Inter Client Communication
//! Conventions Manual (ICCCM) which is why a few ICCCM properties are tracked alongside.
//!
//! [Root Window Properties](https://specifications.freedesktop.org/wm-spec/latest/ar01s03.html)
//! [`RootInfo`] keeps the desktop wide state found on the root window: supported features, client
//! lists, desktops, viewports, work areas, the active window and so on.
//!
//! [Application Window Properties](https://specifications.freedesktop.org/wm-spec/latest/ar01s05.html)
//! [`WinInfo`] keeps the state of a single window: names, desktop, type, state, struts and icons.
//!
//! Both are created in a [`Role`]. In the `WindowManager` role changes are written straight to the
//! properties, in the `Client` role they are sent to the window manager as client messages and the
//! local value only follows once the window manager has written the property. Events are fed in
//! with `event`, which returns the properties they made stale, and `update` re-reads those.
//!
//! ### Examples
//! ```no_run
//! use std::sync::Arc;
//! use libnetwm::prelude::*;
//!
//! let conn = Arc::new(NetConnection::new(X11Transport::connect(None).unwrap()));
//! let interest = PropertySet::from(Properties::NUMBER_OF_DESKTOPS | Properties::CURRENT_DESKTOP);
//! let root = RootInfo::client(conn, interest, None, true).unwrap();
//! println!("desktop {} of {}", root.current_desktop(true), root.number_of_desktops(true));
//! ```
pub mod atoms;
mod capabilities;
mod codec;
mod connection;
mod error;
#[cfg(test)]
mod mock;
mod model;
mod policy;
mod role;
mod root;
mod slots;
mod transport;
mod win;
mod x11;
pub use atoms::AtomCollection;
pub use connection::NetConnection;
pub use error::*;
pub use model::*;
pub use policy::*;
pub use root::{ClientListDiff, RootInfo};
pub use transport::*;
pub use win::WinInfo;
pub use x11::X11Transport;

/// All essential symbols in a simple consumable form
///
/// ### Examples
/// ```
/// use libnetwm::prelude::*;
/// ```
pub mod prelude {
    pub use crate::*;
}
