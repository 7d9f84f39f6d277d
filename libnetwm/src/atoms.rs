//! Protocol atom table and its one-shot registry.
use std::sync::OnceLock;

use tracing::{debug, trace, warn};

use crate::{model::*, transport::Transport, NetwmError, NetwmResult};

// Atoms predefined by the core protocol, these never need interning
pub const ATOM: Atom = 4;
pub const CARDINAL: Atom = 6;
pub const STRING: Atom = 31;
pub const WINDOW: Atom = 33;
pub const WM_HINTS: Atom = 35;
pub const WM_CLIENT_MACHINE: Atom = 36;
pub const WM_CLASS: Atom = 67;
pub const WM_TRANSIENT_FOR: Atom = 68;

/// Names whose failure to intern makes the protocol unusable
const MANDATORY: [&str; 3] = ["UTF8_STRING", "_NET_SUPPORTED", "_NET_SUPPORTING_WM_CHECK"];

macro_rules! atom_table {
    ($($name:ident),* $(,)?) => {
        /// AtomCollection holds the interned value of every protocol name, `NONE` when missing
        #[allow(non_snake_case)]
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
        pub struct AtomCollection {
            $(pub $name: Atom,)*
        }

        impl AtomCollection {
            /// Every protocol name in table order
            pub const NAMES: &'static [&'static str] = &[$(stringify!($name),)*];

            fn from_values(values: &[Atom]) -> Self {
                let mut values = values.iter().copied();
                Self {
                    $($name: values.next().unwrap_or(NONE),)*
                }
            }
        }
    };
}

atom_table! {
    UTF8_STRING,

    // root window properties and messages
    _NET_SUPPORTED,
    _NET_SUPPORTING_WM_CHECK,
    _NET_CLIENT_LIST,
    _NET_CLIENT_LIST_STACKING,
    _NET_NUMBER_OF_DESKTOPS,
    _NET_DESKTOP_GEOMETRY,
    _NET_DESKTOP_VIEWPORT,
    _NET_CURRENT_DESKTOP,
    _NET_DESKTOP_NAMES,
    _NET_ACTIVE_WINDOW,
    _NET_WORKAREA,
    _NET_VIRTUAL_ROOTS,
    _NET_DESKTOP_LAYOUT,
    _NET_SHOWING_DESKTOP,
    _NET_CLOSE_WINDOW,
    _NET_RESTACK_WINDOW,
    _NET_WM_MOVERESIZE,
    _NET_MOVERESIZE_WINDOW,

    // application window properties
    _NET_WM_NAME,
    _NET_WM_VISIBLE_NAME,
    _NET_WM_ICON_NAME,
    _NET_WM_VISIBLE_ICON_NAME,
    _NET_WM_DESKTOP,
    _NET_WM_WINDOW_TYPE,
    _NET_WM_STATE,
    _NET_WM_STRUT,
    _NET_WM_STRUT_PARTIAL,
    _NET_WM_ICON_GEOMETRY,
    _NET_WM_ICON,
    _NET_WM_PID,
    _NET_WM_USER_TIME,
    _NET_WM_HANDLED_ICONS,
    _NET_STARTUP_ID,
    _NET_WM_ALLOWED_ACTIONS,
    _NET_WM_PING,
    _NET_WM_TAKE_ACTIVITY,
    WM_WINDOW_ROLE,
    _NET_FRAME_EXTENTS,
    _NET_WM_WINDOW_OPACITY,
    _NET_WM_FULLSCREEN_MONITORS,

    // window types
    _NET_WM_WINDOW_TYPE_NORMAL,
    _NET_WM_WINDOW_TYPE_DESKTOP,
    _NET_WM_WINDOW_TYPE_DOCK,
    _NET_WM_WINDOW_TYPE_TOOLBAR,
    _NET_WM_WINDOW_TYPE_MENU,
    _NET_WM_WINDOW_TYPE_DIALOG,
    _NET_WM_WINDOW_TYPE_UTILITY,
    _NET_WM_WINDOW_TYPE_SPLASH,
    _NET_WM_WINDOW_TYPE_DROPDOWN_MENU,
    _NET_WM_WINDOW_TYPE_POPUP_MENU,
    _NET_WM_WINDOW_TYPE_TOOLTIP,
    _NET_WM_WINDOW_TYPE_NOTIFICATION,
    _NET_WM_WINDOW_TYPE_COMBO,
    _NET_WM_WINDOW_TYPE_DND,

    // window states
    _NET_WM_STATE_MODAL,
    _NET_WM_STATE_STICKY,
    _NET_WM_STATE_MAXIMIZED_VERT,
    _NET_WM_STATE_MAXIMIZED_HORZ,
    _NET_WM_STATE_SHADED,
    _NET_WM_STATE_SKIP_TASKBAR,
    _NET_WM_STATE_SKIP_PAGER,
    _NET_WM_STATE_HIDDEN,
    _NET_WM_STATE_FULLSCREEN,
    _NET_WM_STATE_ABOVE,
    _NET_WM_STATE_BELOW,
    _NET_WM_STATE_DEMANDS_ATTENTION,
    _NET_WM_STATE_STAYS_ON_TOP,

    // allowed actions
    _NET_WM_ACTION_MOVE,
    _NET_WM_ACTION_RESIZE,
    _NET_WM_ACTION_MINIMIZE,
    _NET_WM_ACTION_SHADE,
    _NET_WM_ACTION_STICK,
    _NET_WM_ACTION_MAXIMIZE_VERT,
    _NET_WM_ACTION_MAXIMIZE_HORZ,
    _NET_WM_ACTION_FULLSCREEN,
    _NET_WM_ACTION_CHANGE_DESKTOP,
    _NET_WM_ACTION_CLOSE,

    // KDE extensions
    _KDE_NET_WM_FRAME_STRUT,
    _KDE_NET_WM_WINDOW_TYPE_OVERRIDE,
    _KDE_NET_WM_WINDOW_TYPE_TOPMENU,
    _KDE_NET_WM_TEMPORARY_RULES,
    _NET_WM_FRAME_OVERLAP,
    _KDE_NET_WM_ACTIVITIES,
    _KDE_NET_WM_BLOCK_COMPOSITING,
    _KDE_NET_WM_SHADOW,

    // ICCCM
    WM_STATE,
    WM_PROTOCOLS,

    _NET_WM_FULL_PLACEMENT,
}

impl AtomCollection {
    /// Intern the whole table in a single batch
    pub fn intern<T: Transport + ?Sized>(transport: &T) -> NetwmResult<Self> {
        debug!("intern: atoms: {}", Self::NAMES.len());
        let replies = transport.intern_atoms(Self::NAMES)?;

        let mut values = Vec::with_capacity(Self::NAMES.len());
        for (i, name) in Self::NAMES.iter().enumerate() {
            match replies.get(i).copied().flatten().filter(|x| *x != NONE) {
                Some(atom) => {
                    trace!("intern: {}: {}", name, atom);
                    values.push(atom);
                },
                None if MANDATORY.contains(name) => {
                    return Err(NetwmError::AtomNotInterned(name.to_string()).into());
                },
                None => {
                    warn!("intern: {} is unavailable", name);
                    values.push(NONE);
                },
            }
        }
        Ok(Self::from_values(&values))
    }

    /// Atom of a window type, `NONE` for `Unknown`
    pub fn window_type(&self, kind: WindowType) -> Atom {
        match kind {
            WindowType::Unknown => NONE,
            WindowType::Normal => self._NET_WM_WINDOW_TYPE_NORMAL,
            WindowType::Desktop => self._NET_WM_WINDOW_TYPE_DESKTOP,
            WindowType::Dock => self._NET_WM_WINDOW_TYPE_DOCK,
            WindowType::Toolbar => self._NET_WM_WINDOW_TYPE_TOOLBAR,
            WindowType::Menu => self._NET_WM_WINDOW_TYPE_MENU,
            WindowType::Dialog => self._NET_WM_WINDOW_TYPE_DIALOG,
            WindowType::Override => self._KDE_NET_WM_WINDOW_TYPE_OVERRIDE,
            WindowType::TopMenu => self._KDE_NET_WM_WINDOW_TYPE_TOPMENU,
            WindowType::Utility => self._NET_WM_WINDOW_TYPE_UTILITY,
            WindowType::Splash => self._NET_WM_WINDOW_TYPE_SPLASH,
            WindowType::DropdownMenu => self._NET_WM_WINDOW_TYPE_DROPDOWN_MENU,
            WindowType::PopupMenu => self._NET_WM_WINDOW_TYPE_POPUP_MENU,
            WindowType::Tooltip => self._NET_WM_WINDOW_TYPE_TOOLTIP,
            WindowType::Notification => self._NET_WM_WINDOW_TYPE_NOTIFICATION,
            WindowType::ComboBox => self._NET_WM_WINDOW_TYPE_COMBO,
            WindowType::DNDIcon => self._NET_WM_WINDOW_TYPE_DND,
        }
    }

    /// Reverse of `window_type`, `Unknown` for anything unrecognized
    pub fn window_type_of(&self, atom: Atom) -> WindowType {
        if atom == NONE {
            return WindowType::Unknown;
        }
        WindowType::ALL
            .iter()
            .copied()
            .find(|kind| self.window_type(*kind) == atom)
            .unwrap_or(WindowType::Unknown)
    }

    /// State atoms paired with their flag, `STAYS_ON_TOP` last so `ABOVE` is preferred when writing
    pub fn states(&self) -> [(State, Atom); 13] {
        [
            (State::MODAL, self._NET_WM_STATE_MODAL),
            (State::STICKY, self._NET_WM_STATE_STICKY),
            (State::MAX_VERT, self._NET_WM_STATE_MAXIMIZED_VERT),
            (State::MAX_HORIZ, self._NET_WM_STATE_MAXIMIZED_HORZ),
            (State::SHADED, self._NET_WM_STATE_SHADED),
            (State::SKIP_TASKBAR, self._NET_WM_STATE_SKIP_TASKBAR),
            (State::SKIP_PAGER, self._NET_WM_STATE_SKIP_PAGER),
            (State::HIDDEN, self._NET_WM_STATE_HIDDEN),
            (State::FULL_SCREEN, self._NET_WM_STATE_FULLSCREEN),
            (State::KEEP_ABOVE, self._NET_WM_STATE_ABOVE),
            (State::KEEP_BELOW, self._NET_WM_STATE_BELOW),
            (State::DEMANDS_ATTENTION, self._NET_WM_STATE_DEMANDS_ATTENTION),
            (State::STAYS_ON_TOP, self._NET_WM_STATE_STAYS_ON_TOP),
        ]
    }

    /// State flag of an atom, empty when the atom is not a state
    pub fn state_of(&self, atom: Atom) -> State {
        if atom == NONE {
            return State::empty();
        }
        self.states().iter().find(|(_, x)| *x == atom).map(|(state, _)| *state).unwrap_or_default()
    }

    pub fn actions(&self) -> [(Actions, Atom); 10] {
        [
            (Actions::MOVE, self._NET_WM_ACTION_MOVE),
            (Actions::RESIZE, self._NET_WM_ACTION_RESIZE),
            (Actions::MINIMIZE, self._NET_WM_ACTION_MINIMIZE),
            (Actions::SHADE, self._NET_WM_ACTION_SHADE),
            (Actions::STICK, self._NET_WM_ACTION_STICK),
            (Actions::MAX_VERT, self._NET_WM_ACTION_MAXIMIZE_VERT),
            (Actions::MAX_HORIZ, self._NET_WM_ACTION_MAXIMIZE_HORZ),
            (Actions::FULL_SCREEN, self._NET_WM_ACTION_FULLSCREEN),
            (Actions::CHANGE_DESKTOP, self._NET_WM_ACTION_CHANGE_DESKTOP),
            (Actions::CLOSE, self._NET_WM_ACTION_CLOSE),
        ]
    }

    pub fn action_of(&self, atom: Atom) -> Actions {
        if atom == NONE {
            return Actions::empty();
        }
        self.actions().iter().find(|(_, x)| *x == atom).map(|(action, _)| *action).unwrap_or_default()
    }
}

/// AtomRegistry interns the table on first use and hands out the same table afterwards
#[derive(Debug, Default)]
pub struct AtomRegistry {
    atoms: OnceLock<AtomCollection>,
}

impl AtomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern every protocol atom unless that already happened
    pub fn intern_all<T: Transport + ?Sized>(&self, transport: &T) -> NetwmResult<&AtomCollection> {
        if let Some(atoms) = self.atoms.get() {
            return Ok(atoms);
        }
        let atoms = AtomCollection::intern(transport)?;
        Ok(self.atoms.get_or_init(|| atoms))
    }

    /// The table if it has been interned
    pub fn get(&self) -> Option<&AtomCollection> {
        self.atoms.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockTransport;

    #[test]
    fn test_names_match_fields() {
        assert_eq!(AtomCollection::NAMES[0], "UTF8_STRING");
        assert_eq!(AtomCollection::NAMES.last(), Some(&"_NET_WM_FULL_PLACEMENT"));
        assert!(AtomCollection::NAMES.len() > 85);
    }

    #[test]
    fn test_intern_all_is_idempotent() {
        let transport = MockTransport::new();
        let registry = AtomRegistry::new();
        let first = *registry.intern_all(&transport).unwrap();
        assert_eq!(transport.intern_batches(), 1);

        let second = *registry.intern_all(&transport).unwrap();
        assert_eq!(first, second);
        assert_eq!(transport.intern_batches(), 1);
        assert_eq!(first._NET_WM_STATE, transport.atom("_NET_WM_STATE"));
    }

    #[test]
    fn test_optional_atom_failure_leaves_none() {
        let transport = MockTransport::new();
        transport.fail_atom("_KDE_NET_WM_SHADOW");
        let atoms = AtomCollection::intern(&transport).unwrap();
        assert_eq!(atoms._KDE_NET_WM_SHADOW, NONE);
        assert_ne!(atoms._NET_WM_NAME, NONE);
    }

    #[test]
    fn test_mandatory_atom_failure_is_fatal() {
        let transport = MockTransport::new();
        transport.fail_atom("_NET_SUPPORTED");
        let registry = AtomRegistry::new();
        let err = registry.intern_all(&transport).unwrap_err();
        assert_eq!(err.netwm(), Some(&NetwmError::AtomNotInterned("_NET_SUPPORTED".into())));
        assert!(registry.get().is_none());
    }

    #[test]
    fn test_reverse_lookups() {
        let transport = MockTransport::new();
        let atoms = AtomCollection::intern(&transport).unwrap();
        assert_eq!(atoms.window_type_of(atoms._NET_WM_WINDOW_TYPE_DND), WindowType::DNDIcon);
        assert_eq!(atoms.window_type_of(NONE), WindowType::Unknown);
        assert_eq!(atoms.state_of(atoms._NET_WM_STATE_STAYS_ON_TOP), State::KEEP_ABOVE);
        assert_eq!(atoms.action_of(atoms._NET_WM_ACTION_CLOSE), Actions::CLOSE);
        assert_eq!(atoms.action_of(atoms._NET_WM_NAME), Actions::empty());
    }
}
