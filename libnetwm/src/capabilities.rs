//! Mapping between the capability bitmap and the atoms listed in `_NET_SUPPORTED`.
use crate::{atoms::AtomCollection, model::*};

/// Protocol word bits in advertising order, with the atom each one stands for
fn properties(atoms: &AtomCollection) -> [(Properties, Atom); 27] {
    [
        (Properties::SUPPORTED, atoms._NET_SUPPORTED),
        (Properties::SUPPORTING_WM_CHECK, atoms._NET_SUPPORTING_WM_CHECK),
        (Properties::CLIENT_LIST, atoms._NET_CLIENT_LIST),
        (Properties::CLIENT_LIST_STACKING, atoms._NET_CLIENT_LIST_STACKING),
        (Properties::NUMBER_OF_DESKTOPS, atoms._NET_NUMBER_OF_DESKTOPS),
        (Properties::DESKTOP_GEOMETRY, atoms._NET_DESKTOP_GEOMETRY),
        (Properties::DESKTOP_VIEWPORT, atoms._NET_DESKTOP_VIEWPORT),
        (Properties::CURRENT_DESKTOP, atoms._NET_CURRENT_DESKTOP),
        (Properties::DESKTOP_NAMES, atoms._NET_DESKTOP_NAMES),
        (Properties::ACTIVE_WINDOW, atoms._NET_ACTIVE_WINDOW),
        (Properties::WORK_AREA, atoms._NET_WORKAREA),
        (Properties::VIRTUAL_ROOTS, atoms._NET_VIRTUAL_ROOTS),
        (Properties::CLOSE_WINDOW, atoms._NET_CLOSE_WINDOW),
        (Properties::WM_MOVE_RESIZE, atoms._NET_WM_MOVERESIZE),
        (Properties::WM_NAME, atoms._NET_WM_NAME),
        (Properties::WM_VISIBLE_NAME, atoms._NET_WM_VISIBLE_NAME),
        (Properties::WM_ICON_NAME, atoms._NET_WM_ICON_NAME),
        (Properties::WM_VISIBLE_ICON_NAME, atoms._NET_WM_VISIBLE_ICON_NAME),
        (Properties::WM_DESKTOP, atoms._NET_WM_DESKTOP),
        (Properties::WM_WINDOW_TYPE, atoms._NET_WM_WINDOW_TYPE),
        (Properties::WM_STATE, atoms._NET_WM_STATE),
        (Properties::WM_STRUT, atoms._NET_WM_STRUT),
        (Properties::WM_ICON_GEOMETRY, atoms._NET_WM_ICON_GEOMETRY),
        (Properties::WM_ICON, atoms._NET_WM_ICON),
        (Properties::WM_PID, atoms._NET_WM_PID),
        (Properties::WM_HANDLED_ICONS, atoms._NET_WM_HANDLED_ICONS),
        (Properties::WM_PING, atoms._NET_WM_PING),
    ]
}

fn properties2(atoms: &AtomCollection) -> [(Properties2, Atom); 17] {
    [
        (Properties2::DESKTOP_LAYOUT, atoms._NET_DESKTOP_LAYOUT),
        (Properties2::RESTACK_WINDOW, atoms._NET_RESTACK_WINDOW),
        (Properties2::SHOWING_DESKTOP, atoms._NET_SHOWING_DESKTOP),
        (Properties2::MOVE_RESIZE_WINDOW, atoms._NET_MOVERESIZE_WINDOW),
        (Properties2::EXTENDED_STRUT, atoms._NET_WM_STRUT_PARTIAL),
        (Properties2::TAKE_ACTIVITY, atoms._NET_WM_TAKE_ACTIVITY),
        (Properties2::USER_TIME, atoms._NET_WM_USER_TIME),
        (Properties2::STARTUP_ID, atoms._NET_STARTUP_ID),
        (Properties2::OPACITY, atoms._NET_WM_WINDOW_OPACITY),
        (Properties2::FULLSCREEN_MONITORS, atoms._NET_WM_FULLSCREEN_MONITORS),
        (Properties2::ALLOWED_ACTIONS, atoms._NET_WM_ALLOWED_ACTIONS),
        (Properties2::FRAME_OVERLAP, atoms._NET_WM_FRAME_OVERLAP),
        (Properties2::KDE_TEMPORARY_RULES, atoms._KDE_NET_WM_TEMPORARY_RULES),
        (Properties2::FULL_PLACEMENT, atoms._NET_WM_FULL_PLACEMENT),
        (Properties2::ACTIVITIES, atoms._KDE_NET_WM_ACTIVITIES),
        (Properties2::BLOCK_COMPOSITING, atoms._KDE_NET_WM_BLOCK_COMPOSITING),
        (Properties2::KDE_SHADOW, atoms._KDE_NET_WM_SHADOW),
    ]
}

impl Capabilities {
    /// Atoms to publish in `_NET_SUPPORTED`, in the fixed advertising order
    pub fn to_atoms(&self, atoms: &AtomCollection) -> Vec<Atom> {
        let mut out = vec![];
        let props = properties(atoms);
        let props2 = properties2(atoms);
        let mut push = |on: bool, atom: Atom| {
            if on && atom != NONE {
                out.push(atom);
            }
        };

        // root window properties and messages first, then window properties
        for (flag, atom) in &props[..12] {
            push(self.properties.contains(*flag), *atom);
        }
        push(self.properties2.contains(Properties2::DESKTOP_LAYOUT), atoms._NET_DESKTOP_LAYOUT);
        push(self.properties.contains(Properties::CLOSE_WINDOW), atoms._NET_CLOSE_WINDOW);
        push(self.properties2.contains(Properties2::RESTACK_WINDOW), atoms._NET_RESTACK_WINDOW);
        push(self.properties2.contains(Properties2::SHOWING_DESKTOP), atoms._NET_SHOWING_DESKTOP);
        push(self.properties.contains(Properties::WM_MOVE_RESIZE), atoms._NET_WM_MOVERESIZE);
        push(self.properties2.contains(Properties2::MOVE_RESIZE_WINDOW), atoms._NET_MOVERESIZE_WINDOW);
        for (flag, atom) in &props[14..19] {
            push(self.properties.contains(*flag), *atom);
        }

        let types = self.properties.contains(Properties::WM_WINDOW_TYPE);
        push(types, atoms._NET_WM_WINDOW_TYPE);
        for kind in WindowType::ALL {
            push(types && self.window_types.contains(kind.mask()), atoms.window_type(kind));
        }

        let states = self.properties.contains(Properties::WM_STATE);
        push(states, atoms._NET_WM_STATE);
        for (flag, atom) in atoms.states() {
            push(states && self.states.contains(flag), atom);
        }

        push(self.properties.contains(Properties::WM_STRUT), atoms._NET_WM_STRUT);
        push(self.properties2.contains(Properties2::EXTENDED_STRUT), atoms._NET_WM_STRUT_PARTIAL);
        for (flag, atom) in &props[22..27] {
            push(self.properties.contains(*flag), *atom);
        }
        for (flag, atom) in &props2[5..10] {
            push(self.properties2.contains(*flag), *atom);
        }

        let actions = self.properties2.contains(Properties2::ALLOWED_ACTIONS);
        push(actions, atoms._NET_WM_ALLOWED_ACTIONS);
        for (flag, atom) in atoms.actions() {
            push(actions && self.actions.contains(flag), atom);
        }

        let extents = self.properties.contains(Properties::WM_FRAME_EXTENTS);
        push(extents, atoms._NET_FRAME_EXTENTS);
        push(extents, atoms._KDE_NET_WM_FRAME_STRUT);
        for (flag, atom) in &props2[11..] {
            push(self.properties2.contains(*flag), *atom);
        }
        out
    }

    /// Set the capability bit `atom` stands for; unrelated atoms are ignored
    pub fn add_atom(&mut self, atoms: &AtomCollection, atom: Atom) {
        if atom == NONE {
            return;
        }
        if let Some((flag, _)) = properties(atoms).iter().find(|(_, x)| *x == atom) {
            self.properties |= *flag;
        } else if let Some((flag, _)) = properties2(atoms).iter().find(|(_, x)| *x == atom) {
            self.properties2 |= *flag;
        } else if atom == atoms._NET_FRAME_EXTENTS || atom == atoms._KDE_NET_WM_FRAME_STRUT {
            self.properties |= Properties::WM_FRAME_EXTENTS;
        } else if atoms.window_type_of(atom) != WindowType::Unknown {
            self.window_types |= atoms.window_type_of(atom).mask();
        } else if !atoms.state_of(atom).is_empty() {
            self.states |= atoms.state_of(atom);
        } else if !atoms.action_of(atom).is_empty() {
            self.actions |= atoms.action_of(atom);
        }
    }

    /// Rebuild a capability bitmap from the atoms of `_NET_SUPPORTED`
    pub fn from_atoms(atoms: &AtomCollection, list: &[Atom]) -> Self {
        let mut caps = Capabilities::default();
        for atom in list {
            caps.add_atom(atoms, *atom);
        }
        caps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockTransport;

    fn atoms() -> AtomCollection {
        AtomCollection::intern(&MockTransport::new()).unwrap()
    }

    #[test]
    fn test_advertising_order() {
        let atoms = atoms();
        let caps = Capabilities {
            properties: Properties::SUPPORTED
                | Properties::SUPPORTING_WM_CHECK
                | Properties::CURRENT_DESKTOP
                | Properties::WM_STATE,
            properties2: Properties2::DESKTOP_LAYOUT,
            states: State::STICKY | State::KEEP_ABOVE,
            ..Default::default()
        };
        assert_eq!(
            caps.to_atoms(&atoms),
            vec![
                atoms._NET_SUPPORTED,
                atoms._NET_SUPPORTING_WM_CHECK,
                atoms._NET_CURRENT_DESKTOP,
                atoms._NET_DESKTOP_LAYOUT,
                atoms._NET_WM_STATE,
                atoms._NET_WM_STATE_STICKY,
                atoms._NET_WM_STATE_ABOVE,
                atoms._NET_WM_STATE_STAYS_ON_TOP,
            ]
        );
    }

    #[test]
    fn test_round_trip_everything() {
        let atoms = atoms();
        let caps = Capabilities {
            properties: Properties::all() - Properties::XA_WM_STATE - Properties::WM_GEOMETRY,
            properties2: Properties2::all()
                - Properties2::TRANSIENT_FOR
                - Properties2::GROUP_LEADER
                - Properties2::WINDOW_CLASS
                - Properties2::WINDOW_ROLE
                - Properties2::CLIENT_MACHINE,
            window_types: WindowTypeMask::all(),
            states: State::all(),
            actions: Actions::all(),
        };
        let list = caps.to_atoms(&atoms);
        assert_eq!(Capabilities::from_atoms(&atoms, &list), caps);
    }

    #[test]
    fn test_types_need_their_property() {
        let atoms = atoms();
        let caps = Capabilities {
            properties: Properties::SUPPORTED,
            window_types: WindowTypeMask::DOCK,
            ..Default::default()
        };
        assert_eq!(caps.to_atoms(&atoms), vec![atoms._NET_SUPPORTED]);
    }

    #[test]
    fn test_unknown_atom_is_ignored() {
        let atoms = atoms();
        let mut caps = Capabilities::default();
        caps.add_atom(&atoms, atoms.UTF8_STRING);
        caps.add_atom(&atoms, NONE);
        assert_eq!(caps, Capabilities::default());
    }
}
