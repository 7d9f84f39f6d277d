//! `WinInfo` carries the per window half of the protocol: names, desktop, type, state, struts,
//! icons, frame extents and the ICCCM properties the window manager needs alongside them.
//!
//! [Application Window Properties](https://specifications.freedesktop.org/wm-spec/latest/ar01s05.html)
use std::sync::Arc;

use tracing::{debug, trace};

use crate::{
    atoms::*,
    codec::{self, PropertyBatch, PropertyWrite, MAX_PROP_SIZE},
    connection::NetConnection,
    model::*,
    policy::{AcceptAll, NoViewport, ViewportPolicy, WinPolicy},
    role::{applier, Applied, Change, ChangeApplier, Request},
    transport::{ClientMessage, NetEvent, Transport},
    NetwmError, NetwmResult,
};

// Read lengths of the atom lists
const MAX_ATOM_LIST: u32 = 2048;

// WM_HINTS flag announcing a window group and the word holding it
const WINDOW_GROUP_HINT: u32 = 1 << 6;
const WINDOW_GROUP_WORD: usize = 8;

// _NET_WM_STATE message actions
const STATE_REMOVE: u32 = 0;
const STATE_ADD: u32 = 1;
const STATE_TOGGLE: u32 = 2;

/// WinInfo is the protocol state of a single window
pub struct WinInfo<T: Transport> {
    conn: Arc<NetConnection<T>>,
    atoms: AtomCollection,
    applier: Box<dyn ChangeApplier>,
    viewport_policy: Box<dyn ViewportPolicy>,

    window: Window,
    root: Window,
    interest: PropertySet,

    mapping_state: MappingState,
    mapping_state_dirty: bool,
    state: State,
    types: Vec<WindowType>,
    has_net_support: bool,
    name: String,
    visible_name: String,
    icon_name: String,
    visible_icon_name: String,
    desktop: i32,
    strut: Strut,
    extended_strut: ExtendedStrut,
    fullscreen_monitors: FullscreenMonitors,
    icon_geometry: Rect,
    icons: Vec<Icon>,
    frame_extents: Strut,
    frame_overlap: Strut,
    activities: String,
    blocking_compositing: bool,
    pid: u32,
    handled_icons: bool,
    user_time: Timestamp,
    startup_id: String,
    opacity: u32,
    allowed_actions: Actions,
    transient_for: Window,
    group_leader: Window,
    class_name: String,
    class_class: String,
    window_role: String,
    client_machine: String,

    // absolute window geometry, queried on first use
    geometry: Option<Rect>,
}

impl<T: Transport> WinInfo<T> {
    /// Track `window` in the given role, reading every property in `interest` right away
    ///
    /// ### Arguments
    /// * `conn` - shared connection
    /// * `window` - window to track
    /// * `root` - root window of the screen the window lives on
    /// * `role` - window manager or client
    /// * `interest` - properties to keep current
    pub fn new(
        conn: Arc<NetConnection<T>>, window: Window, root: Window, role: Role, interest: PropertySet,
    ) -> NetwmResult<Self> {
        let atoms = *conn.atoms()?;
        debug!("new: window: {}, role: {}", window, role);
        let mut info = Self {
            conn,
            atoms,
            applier: applier(role),
            viewport_policy: Box::new(NoViewport),
            window,
            root,
            interest,
            mapping_state: MappingState::Withdrawn,
            mapping_state_dirty: true,
            state: State::empty(),
            types: vec![],
            has_net_support: false,
            name: String::new(),
            visible_name: String::new(),
            icon_name: String::new(),
            visible_icon_name: String::new(),
            desktop: 0,
            strut: Strut::default(),
            extended_strut: ExtendedStrut::default(),
            fullscreen_monitors: FullscreenMonitors::default(),
            icon_geometry: Rect::default(),
            icons: vec![],
            frame_extents: Strut::default(),
            frame_overlap: Strut::default(),
            activities: String::new(),
            blocking_compositing: false,
            pid: 0,
            handled_icons: false,
            user_time: u32::MAX,
            startup_id: String::new(),
            opacity: u32::MAX,
            allowed_actions: Actions::empty(),
            transient_for: NONE,
            group_leader: NONE,
            class_name: String::new(),
            class_class: String::new(),
            window_role: String::new(),
            client_machine: String::new(),
            geometry: None,
        };
        info.update(interest)?;
        Ok(info)
    }

    /// Route desktop requests through a viewport emulating collaborator
    pub fn with_viewport_policy(mut self, policy: impl ViewportPolicy + 'static) -> Self {
        self.viewport_policy = Box::new(policy);
        self
    }

    fn transport(&self) -> &T {
        self.conn.transport()
    }

    fn apply(&self, change: Change) -> NetwmResult<Applied> {
        self.applier.apply(self.conn.transport(), change)
    }

    fn request(&self, message_type: Atom, data: [u32; 5]) -> Request {
        Request::to_root(self.root, self.window, message_type, data)
    }

    fn client_owned(&self, write: PropertyWrite) -> NetwmResult<bool> {
        Ok(self.apply(Change::Owned(Role::Client, write))? == Applied::Written)
    }

    fn wm_owned(&self, write: PropertyWrite) -> NetwmResult<bool> {
        Ok(self.apply(Change::Owned(Role::WindowManager, write))? == Applied::Written)
    }

    /// Text write, an empty value removes the property instead
    fn text_write(&self, property: Atom, type_: Atom, text: &str) -> PropertyWrite {
        match text.is_empty() {
            true => PropertyWrite::delete(self.window, property),
            false => PropertyWrite::bytes(self.window, property, type_, text.as_bytes().to_vec()),
        }
    }

    pub fn role(&self) -> Role {
        self.applier.role()
    }

    pub fn window(&self) -> Window {
        self.window
    }

    pub fn root_window(&self) -> Window {
        self.root
    }

    /// Properties this instance keeps current
    pub fn passed_properties(&self) -> PropertySet {
        self.interest
    }

    // Negotiated state
    //----------------------------------------------------------------------------------------------

    /// Change the state bits selected by `mask` to their value in `state`.
    ///
    /// A managed client asks the window manager with one message per changed bit, the two
    /// maximization bits travel together when both change. The window manager, or a client whose
    /// window is not mapped yet, writes the complete list.
    pub fn set_state(&mut self, state: State, mask: State) -> NetwmResult<()> {
        if self.mapping_state_dirty {
            self.update_mapping_state()?;
        }

        // The current state is needed even when nobody asked to track it
        if !self.interest.properties.contains(Properties::WM_STATE) {
            self.refresh(Properties::WM_STATE.into())?;
        }

        // A managed client may need several messages and an unmapped one writes even in Client
        // role, neither fits a single Change
        if self.role() == Role::Client && self.mapping_state != MappingState::Withdrawn {
            debug!("set_state: window: {}, state: {:?}, mask: {:?}", self.window, state, mask);
            for data in self.state_messages(state, mask) {
                self.request(self.atoms._NET_WM_STATE, data).send(self.transport())?;
            }
            return self.transport().flush();
        }

        self.state = (self.state & !mask) | (state & mask);
        let list = self
            .atoms
            .states()
            .iter()
            .filter(|(flag, atom)| *atom != NONE && self.state.contains(*flag))
            .map(|x| x.1)
            .collect();
        debug!("set_state: window: {}, state: {:?}", self.window, self.state);
        PropertyWrite::words(self.window, self.atoms._NET_WM_STATE, ATOM, list).apply(self.transport())?;
        self.transport().flush()
    }

    /// Client messages toggling the bits that differ from the current state
    fn state_messages(&self, state: State, mask: State) -> Vec<[u32; 5]> {
        let a = &self.atoms;
        let current = self.state;
        let mut messages = vec![];
        for (flag, atom) in a.states() {
            if flag.intersects(State::MAX) {
                if flag == State::MAX_VERT {
                    messages.extend(self.max_messages(state, mask));
                }
                continue;
            }
            // the stays on top atom is an alias of keep above
            if atom == a._NET_WM_STATE_STAYS_ON_TOP || atom == NONE {
                continue;
            }
            if mask.contains(flag) && current.contains(flag) != state.contains(flag) {
                messages.push([state.contains(flag) as u32, atom, 0, 0, 0]);
            }
        }
        messages
    }

    fn max_messages(&self, state: State, mask: State) -> Vec<[u32; 5]> {
        let (vert, horiz) = (self.atoms._NET_WM_STATE_MAXIMIZED_VERT, self.atoms._NET_WM_STATE_MAXIMIZED_HORZ);
        let current = self.state;
        let wish = (current & !mask) | (state & mask);
        let vert_changed = wish.contains(State::MAX_VERT) != current.contains(State::MAX_VERT);
        let horiz_changed = wish.contains(State::MAX_HORIZ) != current.contains(State::MAX_HORIZ);

        match (vert_changed, horiz_changed) {
            (true, true) if wish.contains(State::MAX) => vec![[STATE_ADD, horiz, vert, 0, 0]],
            (true, true) if !wish.intersects(State::MAX) => vec![[STATE_REMOVE, horiz, vert, 0, 0]],
            (true, true) => vec![
                [wish.contains(State::MAX_HORIZ) as u32, horiz, 0, 0, 0],
                [wish.contains(State::MAX_VERT) as u32, vert, 0, 0, 0],
            ],
            (true, false) => vec![[wish.contains(State::MAX_VERT) as u32, vert, 0, 0, 0]],
            (false, true) => vec![[wish.contains(State::MAX_HORIZ) as u32, horiz, 0, 0, 0]],
            (false, false) => vec![],
        }
    }

    /// Move the window to a desktop, numbered from 1, or to every desktop with `ON_ALL_DESKTOPS`.
    ///
    /// A client may only ask for this once the window is managed, before that the call fails
    /// with `WindowNotManaged`.
    pub fn set_desktop(&mut self, desktop: i32, ignore_viewport: bool) -> NetwmResult<()> {
        if desktop < 1 && desktop != ON_ALL_DESKTOPS {
            debug!("set_desktop: ignoring desktop {}", desktop);
            return Ok(());
        }
        if self.mapping_state_dirty {
            self.update_mapping_state()?;
        }
        if self.role() == Role::Client {
            if self.mapping_state == MappingState::Withdrawn {
                return Err(NetwmError::WindowNotManaged(self.window).into());
            }
            if !ignore_viewport && self.viewport_policy.map_viewport() {
                self.viewport_policy.set_on_desktop(self.window, desktop);
                return Ok(());
            }
        }

        let wire = match desktop {
            ON_ALL_DESKTOPS => ON_ALL_DESKTOPS_WIRE,
            _ => (desktop - 1) as u32,
        };
        let atom = self.atoms._NET_WM_DESKTOP;
        let change = Change::Negotiated(
            PropertyWrite::words(self.window, atom, CARDINAL, vec![wire]),
            self.request(atom, [wire, 0, 0, 0, 0]),
        );
        if self.apply(change)? == Applied::Written {
            self.desktop = desktop;
        }
        Ok(())
    }

    /// Remove the desktop property; a managed client can't do that
    pub fn clear_desktop(&mut self) -> NetwmResult<()> {
        if self.role() == Role::Client {
            if self.mapping_state_dirty {
                self.update_mapping_state()?;
            }
            if self.mapping_state != MappingState::Withdrawn {
                return Ok(());
            }
        }
        let write = PropertyWrite::delete(self.window, self.atoms._NET_WM_DESKTOP);
        if self.apply(Change::Shared(write))? == Applied::Written {
            self.desktop = 0;
        }
        Ok(())
    }

    /// Monitors a fullscreen window spans
    pub fn set_fullscreen_monitors(&mut self, topology: FullscreenMonitors) -> NetwmResult<()> {
        let words = [topology.top, topology.bottom, topology.left, topology.right].map(|x| x as u32);
        let atom = self.atoms._NET_WM_FULLSCREEN_MONITORS;
        let source: u32 = RequestSource::Application.into();
        let change = Change::Negotiated(
            PropertyWrite::words(self.window, atom, CARDINAL, words.to_vec()),
            self.request(atom, [words[0], words[1], words[2], words[3], source]),
        );
        if self.apply(change)? == Applied::Written {
            self.fullscreen_monitors = topology;
        }
        Ok(())
    }

    // Client owned properties
    //----------------------------------------------------------------------------------------------

    /// Add an icon, or make it the only one when `replace` is set
    pub fn set_icon(&mut self, icon: Icon, replace: bool) -> NetwmResult<()> {
        let mut icons = match replace {
            true => vec![],
            false => self.icons.clone(),
        };
        icons.push(icon);
        let write = PropertyWrite::words(self.window, self.atoms._NET_WM_ICON, CARDINAL, codec::icons_words(&icons));
        if self.client_owned(write)? {
            self.icons = icons;
        }
        Ok(())
    }

    /// Where the window iconifies to, an empty rectangle removes it
    pub fn set_icon_geometry(&mut self, geometry: Rect) -> NetwmResult<()> {
        let atom = self.atoms._NET_WM_ICON_GEOMETRY;
        let write = match geometry.is_empty() {
            true => PropertyWrite::delete(self.window, atom),
            false => PropertyWrite::words(self.window, atom, CARDINAL, rect_words(geometry)),
        };
        if self.client_owned(write)? {
            self.icon_geometry = geometry;
        }
        Ok(())
    }

    pub fn set_strut(&mut self, strut: Strut) -> NetwmResult<()> {
        let write = PropertyWrite::words(self.window, self.atoms._NET_WM_STRUT, CARDINAL, strut_words(strut));
        if self.client_owned(write)? {
            self.strut = strut;
        }
        Ok(())
    }

    pub fn set_extended_strut(&mut self, strut: ExtendedStrut) -> NetwmResult<()> {
        let words = [
            strut.left_width,
            strut.right_width,
            strut.top_width,
            strut.bottom_width,
            strut.left_start,
            strut.left_end,
            strut.right_start,
            strut.right_end,
            strut.top_start,
            strut.top_end,
            strut.bottom_start,
            strut.bottom_end,
        ]
        .map(|x| x as u32);
        let write = PropertyWrite::words(self.window, self.atoms._NET_WM_STRUT_PARTIAL, CARDINAL, words.to_vec());
        if self.client_owned(write)? {
            self.extended_strut = strut;
        }
        Ok(())
    }

    /// Declare the window type; extension types carry a standard fallback second
    pub fn set_window_type(&mut self, kind: WindowType) -> NetwmResult<()> {
        let a = &self.atoms;
        let fallback = match kind {
            WindowType::Override => Some(WindowType::Normal),
            WindowType::TopMenu => Some(WindowType::Dock),
            WindowType::Utility => Some(WindowType::Dialog),
            WindowType::Splash => Some(WindowType::Dock),
            _ => None,
        };
        let kind = match kind {
            WindowType::Unknown => WindowType::Normal,
            x => x,
        };
        let list: Vec<Atom> = [Some(kind), fallback].into_iter().flatten().map(|x| a.window_type(x)).collect();
        let write = PropertyWrite::words(self.window, a._NET_WM_WINDOW_TYPE, ATOM, list);
        if self.client_owned(write)? {
            self.types = [Some(kind), fallback].into_iter().flatten().collect();
            self.has_net_support = true;
        }
        Ok(())
    }

    pub fn set_name(&mut self, name: &str) -> NetwmResult<()> {
        let write = self.text_write(self.atoms._NET_WM_NAME, self.atoms.UTF8_STRING, name);
        if self.client_owned(write)? {
            self.name = name.to_string();
        }
        Ok(())
    }

    pub fn set_icon_name(&mut self, name: &str) -> NetwmResult<()> {
        let write = self.text_write(self.atoms._NET_WM_ICON_NAME, self.atoms.UTF8_STRING, name);
        if self.client_owned(write)? {
            self.icon_name = name.to_string();
        }
        Ok(())
    }

    pub fn set_pid(&mut self, pid: u32) -> NetwmResult<()> {
        let write = PropertyWrite::words(self.window, self.atoms._NET_WM_PID, CARDINAL, vec![pid]);
        if self.client_owned(write)? {
            self.pid = pid;
        }
        Ok(())
    }

    pub fn set_handled_icons(&mut self, handled: bool) -> NetwmResult<()> {
        let write = PropertyWrite::words(self.window, self.atoms._NET_WM_HANDLED_ICONS, CARDINAL, vec![handled as u32]);
        if self.client_owned(write)? {
            self.handled_icons = handled;
        }
        Ok(())
    }

    pub fn set_startup_id(&mut self, id: &str) -> NetwmResult<()> {
        let bytes = id.as_bytes().to_vec();
        let write = PropertyWrite::bytes(self.window, self.atoms._NET_STARTUP_ID, self.atoms.UTF8_STRING, bytes);
        if self.client_owned(write)? {
            self.startup_id = id.to_string();
        }
        Ok(())
    }

    pub fn set_user_time(&mut self, time: Timestamp) -> NetwmResult<()> {
        let write = PropertyWrite::words(self.window, self.atoms._NET_WM_USER_TIME, CARDINAL, vec![time]);
        if self.client_owned(write)? {
            self.user_time = time;
        }
        Ok(())
    }

    pub fn set_blocking_compositing(&mut self, active: bool) -> NetwmResult<()> {
        let atom = self.atoms._KDE_NET_WM_BLOCK_COMPOSITING;
        let write = match active {
            true => PropertyWrite::words(self.window, atom, CARDINAL, vec![1]),
            false => PropertyWrite::delete(self.window, atom),
        };
        if self.client_owned(write)? {
            self.blocking_compositing = active;
        }
        Ok(())
    }

    pub fn set_activities(&mut self, activities: &str) -> NetwmResult<()> {
        let write = self.text_write(self.atoms._KDE_NET_WM_ACTIVITIES, STRING, activities);
        if self.client_owned(write)? {
            self.activities = activities.to_string();
        }
        Ok(())
    }

    // Window manager owned properties
    //----------------------------------------------------------------------------------------------

    pub fn set_visible_name(&mut self, name: &str) -> NetwmResult<()> {
        let write = self.text_write(self.atoms._NET_WM_VISIBLE_NAME, self.atoms.UTF8_STRING, name);
        if self.wm_owned(write)? {
            self.visible_name = name.to_string();
        }
        Ok(())
    }

    pub fn set_visible_icon_name(&mut self, name: &str) -> NetwmResult<()> {
        let write = self.text_write(self.atoms._NET_WM_VISIBLE_ICON_NAME, self.atoms.UTF8_STRING, name);
        if self.wm_owned(write)? {
            self.visible_icon_name = name.to_string();
        }
        Ok(())
    }

    pub fn set_allowed_actions(&mut self, actions: Actions) -> NetwmResult<()> {
        let list = self.atoms.actions().iter().filter(|(flag, _)| actions.contains(*flag)).map(|x| x.1).collect();
        let write = PropertyWrite::words(self.window, self.atoms._NET_WM_ALLOWED_ACTIONS, ATOM, list);
        if self.wm_owned(write)? {
            self.allowed_actions = actions;
        }
        Ok(())
    }

    /// Decoration sizes, published under both the standard and the KDE name
    pub fn set_frame_extents(&mut self, extents: Strut) -> NetwmResult<()> {
        let words = strut_words(extents);
        let standard = PropertyWrite::words(self.window, self.atoms._NET_FRAME_EXTENTS, CARDINAL, words.clone());
        if self.wm_owned(standard)? {
            let kde = PropertyWrite::words(self.window, self.atoms._KDE_NET_WM_FRAME_STRUT, CARDINAL, words);
            self.wm_owned(kde)?;
            self.frame_extents = extents;
        }
        Ok(())
    }

    // Shared properties
    //----------------------------------------------------------------------------------------------

    pub fn set_opacity(&mut self, opacity: u32) -> NetwmResult<()> {
        let write = PropertyWrite::words(self.window, self.atoms._NET_WM_WINDOW_OPACITY, CARDINAL, vec![opacity]);
        if self.apply(Change::Shared(write))? == Applied::Written {
            self.opacity = opacity;
        }
        Ok(())
    }

    /// Frame overlap; negative sides become 0 unless every side is -1
    pub fn set_frame_overlap(&mut self, overlap: Strut) -> NetwmResult<()> {
        let unset = [overlap.left, overlap.right, overlap.top, overlap.bottom].iter().all(|x| *x == -1);
        let overlap = match unset {
            true => overlap,
            false => Strut {
                left: overlap.left.max(0),
                right: overlap.right.max(0),
                top: overlap.top.max(0),
                bottom: overlap.bottom.max(0),
            },
        };
        let write = PropertyWrite::words(self.window, self.atoms._NET_WM_FRAME_OVERLAP, CARDINAL, strut_words(overlap));
        if self.apply(Change::Shared(write))? == Applied::Written {
            self.frame_overlap = overlap;
        }
        Ok(())
    }

    // Getters
    //----------------------------------------------------------------------------------------------

    pub fn mapping_state(&self) -> MappingState {
        self.mapping_state
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// First type in the window's preference list that the caller handles, `Unknown` otherwise
    pub fn window_type(&self, supported: WindowTypeMask) -> WindowType {
        self.types.iter().copied().find(|x| !x.mask().is_empty() && supported.contains(x.mask())).unwrap_or_default()
    }

    pub fn window_types(&self) -> &[WindowType] {
        &self.types
    }

    pub fn has_window_type(&self) -> bool {
        !self.types.is_empty()
    }

    /// Whether the window declared any type, the sign of a protocol aware client
    pub fn has_net_support(&self) -> bool {
        self.has_net_support
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn visible_name(&self) -> &str {
        &self.visible_name
    }

    pub fn icon_name(&self) -> &str {
        &self.icon_name
    }

    pub fn visible_icon_name(&self) -> &str {
        &self.visible_icon_name
    }

    /// Desktop of the window numbered from 1, `ON_ALL_DESKTOPS` or 0 when unknown
    pub fn desktop(&self, ignore_viewport: bool) -> i32 {
        if !ignore_viewport && self.viewport_policy.map_viewport() {
            return self.viewport_policy.window_desktop(self.window);
        }
        self.desktop
    }

    pub fn is_on_all_desktops(&self) -> bool {
        self.desktop == ON_ALL_DESKTOPS
    }

    pub fn strut(&self) -> Strut {
        self.strut
    }

    pub fn extended_strut(&self) -> ExtendedStrut {
        self.extended_strut
    }

    pub fn fullscreen_monitors(&self) -> FullscreenMonitors {
        self.fullscreen_monitors
    }

    pub fn icon_geometry(&self) -> Rect {
        self.icon_geometry
    }

    pub fn icons(&self) -> &[Icon] {
        &self.icons
    }

    /// Width and height of every icon in the order they are stored
    pub fn icon_sizes(&self) -> Vec<Size> {
        self.icons.iter().map(|x| x.size).collect()
    }

    /// Pick the icon to draw at the given size.
    ///
    /// The smallest icon at least as large as requested in both dimensions wins, an exact match
    /// being the best case. Otherwise, or when asked for -1 x -1, the largest icon is returned.
    pub fn icon(&self, width: i32, height: i32) -> Icon {
        let area = |x: &Icon| x.size.width as i64 * x.size.height as i64;
        let largest = match self.icons.iter().max_by_key(|x| area(*x)) {
            Some(icon) => icon,
            None => return Icon::default(),
        };
        if width == -1 && height == -1 {
            return largest.clone();
        }
        self.icons
            .iter()
            .filter(|x| x.size.width >= width && x.size.height >= height)
            .min_by_key(|x| area(*x))
            .unwrap_or(largest)
            .clone()
    }

    pub fn frame_extents(&self) -> Strut {
        self.frame_extents
    }

    pub fn frame_overlap(&self) -> Strut {
        self.frame_overlap
    }

    pub fn activities(&self) -> &str {
        &self.activities
    }

    pub fn is_blocking_compositing(&self) -> bool {
        self.blocking_compositing
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn handled_icons(&self) -> bool {
        self.handled_icons
    }

    pub fn user_time(&self) -> Timestamp {
        self.user_time
    }

    pub fn startup_id(&self) -> &str {
        &self.startup_id
    }

    pub fn opacity(&self) -> u32 {
        self.opacity
    }

    pub fn allowed_actions(&self) -> Actions {
        self.allowed_actions
    }

    pub fn transient_for(&self) -> Window {
        self.transient_for
    }

    pub fn group_leader(&self) -> Window {
        self.group_leader
    }

    pub fn window_class_name(&self) -> &str {
        &self.class_name
    }

    pub fn window_class_class(&self) -> &str {
        &self.class_class
    }

    pub fn window_role(&self) -> &str {
        &self.window_role
    }

    pub fn client_machine(&self) -> &str {
        &self.client_machine
    }

    /// Returns the `(frame, window)` rectangles in root coordinates.
    ///
    /// The window geometry is queried once and cached until a configure notification arrives;
    /// the frame adds the frame extents around it.
    pub fn kde_geometry(&mut self) -> NetwmResult<(Rect, Rect)> {
        let window = match self.geometry {
            Some(geometry) => geometry,
            None => {
                let size = self.transport().get_geometry(self.window)?;
                let origin = self.transport().translate_coordinates(self.window, self.root)?;
                match (size, origin) {
                    (Some(size), Some(origin)) => {
                        let geometry = Rect { pos: origin, size: size.size };
                        if !geometry.is_empty() {
                            self.geometry = Some(geometry);
                        }
                        geometry
                    },
                    _ => Rect::default(),
                }
            },
        };
        let ext = self.frame_extents;
        let frame = Rect::new(
            window.pos.x - ext.left,
            window.pos.y - ext.top,
            window.size.width + ext.left + ext.right,
            window.size.height + ext.top + ext.bottom,
        );
        Ok((frame, window))
    }

    // Events
    //----------------------------------------------------------------------------------------------

    /// Classify an event, accepting every window manager request as is
    pub fn event(&mut self, event: &NetEvent) -> NetwmResult<PropertySet> {
        self.event_with(event, &mut AcceptAll)
    }

    /// Classify an event into the properties it made stale.
    ///
    /// In the window manager role client requests for this window are offered to `policy` and
    /// accepted changes are written before returning. Pass the result to [`WinInfo::update`] to
    /// re-read the stale properties.
    pub fn event_with<P: WinPolicy + ?Sized>(&mut self, event: &NetEvent, policy: &mut P) -> NetwmResult<PropertySet> {
        match event {
            NetEvent::ClientMessage(message)
                if self.role() == Role::WindowManager && message.format == 32 && message.window == self.window =>
            {
                self.handle_request(message, policy)
            },
            NetEvent::PropertyNotify { window, atom } if *window == self.window => Ok(self.dirty_for(*atom)),
            NetEvent::ConfigureNotify { window, geometry } if *window == self.window => {
                trace!("event: window: {}, configure: {}", window, geometry);
                self.geometry = None;
                Ok(Properties::WM_GEOMETRY.into())
            },
            _ => Ok(PropertySet::default()),
        }
    }

    fn handle_request<P: WinPolicy + ?Sized>(&mut self, message: &ClientMessage, policy: &mut P) -> NetwmResult<PropertySet> {
        let a = self.atoms;
        let data = message.data;
        debug!("handle_request: window: {}, type: {}, data: {:?}", self.window, message.message_type, data);

        let dirty: PropertySet = match message.message_type {
            NONE => PropertySet::default(),
            x if x == a._NET_WM_STATE => {
                let mask = a.state_of(data[1]) | a.state_of(data[2]);
                let state = match data[0] {
                    STATE_ADD => mask,
                    STATE_TOGGLE => (self.state & mask) ^ mask,
                    _ => State::empty(),
                };
                if policy.change_state(state, mask) {
                    self.set_state(state, mask)?;
                }
                Properties::WM_STATE.into()
            },
            x if x == a._NET_WM_DESKTOP => {
                let desktop = match data[0] {
                    ON_ALL_DESKTOPS_WIRE => ON_ALL_DESKTOPS,
                    x => x.wrapping_add(1) as i32,
                };
                if policy.change_desktop(desktop) {
                    self.set_desktop(desktop, true)?;
                }
                Properties::WM_DESKTOP.into()
            },
            x if x == a._NET_WM_FULLSCREEN_MONITORS => {
                let topology = FullscreenMonitors {
                    top: data[0] as i32,
                    bottom: data[1] as i32,
                    left: data[2] as i32,
                    right: data[3] as i32,
                };
                if policy.change_fullscreen_monitors(topology) {
                    self.set_fullscreen_monitors(topology)?;
                }
                Properties2::FULLSCREEN_MONITORS.into()
            },
            _ => PropertySet::default(),
        };
        Ok(dirty)
    }

    fn dirty_for(&self, atom: Atom) -> PropertySet {
        let a = &self.atoms;
        let dirty: PropertySet = match atom {
            NONE => PropertySet::default(),
            x if x == a._NET_WM_NAME => Properties::WM_NAME.into(),
            x if x == a._NET_WM_VISIBLE_NAME => Properties::WM_VISIBLE_NAME.into(),
            x if x == a._NET_WM_ICON_NAME => Properties::WM_ICON_NAME.into(),
            x if x == a._NET_WM_VISIBLE_ICON_NAME => Properties::WM_VISIBLE_ICON_NAME.into(),
            x if x == a._NET_WM_DESKTOP => Properties::WM_DESKTOP.into(),
            x if x == a._NET_WM_WINDOW_TYPE => Properties::WM_WINDOW_TYPE.into(),
            x if x == a._NET_WM_STATE => Properties::WM_STATE.into(),
            x if x == a._NET_WM_STRUT => Properties::WM_STRUT.into(),
            x if x == a._NET_WM_STRUT_PARTIAL => Properties2::EXTENDED_STRUT.into(),
            x if x == a._NET_WM_FULLSCREEN_MONITORS => Properties2::FULLSCREEN_MONITORS.into(),
            x if x == a._NET_WM_ICON_GEOMETRY => Properties::WM_ICON_GEOMETRY.into(),
            x if x == a._NET_WM_ICON => Properties::WM_ICON.into(),
            x if x == a._NET_WM_PID => Properties::WM_PID.into(),
            x if x == a._NET_WM_HANDLED_ICONS => Properties::WM_HANDLED_ICONS.into(),
            x if x == a._NET_STARTUP_ID => Properties2::STARTUP_ID.into(),
            x if x == a._NET_WM_WINDOW_OPACITY => Properties2::OPACITY.into(),
            x if x == a._NET_WM_ALLOWED_ACTIONS => Properties2::ALLOWED_ACTIONS.into(),
            x if x == a.WM_STATE => Properties::XA_WM_STATE.into(),
            x if x == a._NET_FRAME_EXTENTS || x == a._KDE_NET_WM_FRAME_STRUT => Properties::WM_FRAME_EXTENTS.into(),
            x if x == a._NET_WM_FRAME_OVERLAP => Properties2::FRAME_OVERLAP.into(),
            x if x == a._NET_WM_USER_TIME => Properties2::USER_TIME.into(),
            WM_HINTS => Properties2::GROUP_LEADER.into(),
            WM_TRANSIENT_FOR => Properties2::TRANSIENT_FOR.into(),
            WM_CLASS => Properties2::WINDOW_CLASS.into(),
            WM_CLIENT_MACHINE => Properties2::CLIENT_MACHINE.into(),
            x if x == a.WM_WINDOW_ROLE => Properties2::WINDOW_ROLE.into(),
            x if x == a._KDE_NET_WM_ACTIVITIES => Properties2::ACTIVITIES.into(),
            x if x == a._KDE_NET_WM_BLOCK_COMPOSITING => Properties2::BLOCK_COMPOSITING.into(),
            x if x == a._KDE_NET_WM_SHADOW => Properties2::KDE_SHADOW.into(),
            _ => PropertySet::default(),
        };
        trace!("dirty_for: window: {}, atom: {}, dirty: {:?}", self.window, atom, dirty);
        dirty
    }

    // Refresh
    //----------------------------------------------------------------------------------------------

    /// Re-read the dirty properties this instance is interested in, in one round trip.
    /// The ICCCM mapping state is re-read whenever it is dirty.
    pub fn update(&mut self, dirty: PropertySet) -> NetwmResult<()> {
        let mut props = dirty.intersection(self.interest);
        if dirty.properties.contains(Properties::XA_WM_STATE) {
            props.properties |= Properties::XA_WM_STATE;
        }
        self.refresh(props)
    }

    /// Re-read the ICCCM mapping state
    pub fn update_mapping_state(&mut self) -> NetwmResult<()> {
        self.refresh(Properties::XA_WM_STATE.into())
    }

    fn refresh(&mut self, dirty: PropertySet) -> NetwmResult<()> {
        if dirty.is_empty() {
            return Ok(());
        }
        let (p, p2) = (dirty.properties, dirty.properties2);
        debug!("refresh: window: {}, dirty: {:?}", self.window, dirty);

        let a = self.atoms;
        let utf8 = a.UTF8_STRING;
        let reads: [(bool, Atom, Atom, u32); 29] = [
            (p.contains(Properties::XA_WM_STATE), a.WM_STATE, a.WM_STATE, 1),
            (p.contains(Properties::WM_STATE), a._NET_WM_STATE, ATOM, MAX_ATOM_LIST),
            (p.contains(Properties::WM_DESKTOP), a._NET_WM_DESKTOP, CARDINAL, 1),
            (p.contains(Properties::WM_NAME), a._NET_WM_NAME, utf8, MAX_PROP_SIZE),
            (p.contains(Properties::WM_VISIBLE_NAME), a._NET_WM_VISIBLE_NAME, utf8, MAX_PROP_SIZE),
            (p.contains(Properties::WM_ICON_NAME), a._NET_WM_ICON_NAME, utf8, MAX_PROP_SIZE),
            (p.contains(Properties::WM_VISIBLE_ICON_NAME), a._NET_WM_VISIBLE_ICON_NAME, utf8, MAX_PROP_SIZE),
            (p.contains(Properties::WM_WINDOW_TYPE), a._NET_WM_WINDOW_TYPE, ATOM, MAX_ATOM_LIST),
            (p.contains(Properties::WM_STRUT), a._NET_WM_STRUT, CARDINAL, 4),
            (p2.contains(Properties2::EXTENDED_STRUT), a._NET_WM_STRUT_PARTIAL, CARDINAL, 12),
            (p2.contains(Properties2::FULLSCREEN_MONITORS), a._NET_WM_FULLSCREEN_MONITORS, CARDINAL, 4),
            (p.contains(Properties::WM_ICON_GEOMETRY), a._NET_WM_ICON_GEOMETRY, CARDINAL, 4),
            (p.contains(Properties::WM_ICON), a._NET_WM_ICON, CARDINAL, u32::MAX),
            (p.contains(Properties::WM_FRAME_EXTENTS), a._NET_FRAME_EXTENTS, CARDINAL, 4),
            (p.contains(Properties::WM_FRAME_EXTENTS), a._KDE_NET_WM_FRAME_STRUT, CARDINAL, 4),
            (p2.contains(Properties2::FRAME_OVERLAP), a._NET_WM_FRAME_OVERLAP, CARDINAL, 4),
            (p2.contains(Properties2::ACTIVITIES), a._KDE_NET_WM_ACTIVITIES, STRING, MAX_PROP_SIZE),
            (p2.contains(Properties2::BLOCK_COMPOSITING), a._KDE_NET_WM_BLOCK_COMPOSITING, CARDINAL, 1),
            (p.contains(Properties::WM_PID), a._NET_WM_PID, CARDINAL, 1),
            (p.contains(Properties::WM_HANDLED_ICONS), a._NET_WM_HANDLED_ICONS, CARDINAL, 1),
            (p2.contains(Properties2::STARTUP_ID), a._NET_STARTUP_ID, utf8, MAX_PROP_SIZE),
            (p2.contains(Properties2::OPACITY), a._NET_WM_WINDOW_OPACITY, CARDINAL, 1),
            (p2.contains(Properties2::ALLOWED_ACTIONS), a._NET_WM_ALLOWED_ACTIONS, ATOM, MAX_ATOM_LIST),
            (p2.contains(Properties2::USER_TIME), a._NET_WM_USER_TIME, CARDINAL, 1),
            (p2.contains(Properties2::TRANSIENT_FOR), WM_TRANSIENT_FOR, WINDOW, 1),
            (p2.contains(Properties2::GROUP_LEADER), WM_HINTS, WM_HINTS, 9),
            (p2.contains(Properties2::WINDOW_CLASS), WM_CLASS, STRING, MAX_PROP_SIZE),
            (p2.contains(Properties2::WINDOW_ROLE), a.WM_WINDOW_ROLE, STRING, MAX_PROP_SIZE),
            (p2.contains(Properties2::CLIENT_MACHINE), WM_CLIENT_MACHINE, STRING, MAX_PROP_SIZE),
        ];
        let mut batch = PropertyBatch::new();
        for (_, atom, type_, length) in reads.iter().filter(|x| x.0) {
            batch.push(self.window, *atom, *type_, *length);
        }
        let mut replies = batch.fetch(self.transport())?;

        if p.contains(Properties::XA_WM_STATE) {
            match codec::value32(replies.take().as_ref(), a.WM_STATE) {
                Some(x) => {
                    self.mapping_state = MappingState::from(x);
                    self.mapping_state_dirty = false;
                },
                None => self.mapping_state = MappingState::Withdrawn,
            }
        }
        if p.contains(Properties::WM_STATE) {
            let list = codec::array32(replies.take().as_ref(), ATOM);
            self.state = list.iter().fold(State::empty(), |acc, x| acc | a.state_of(*x));
        }
        if p.contains(Properties::WM_DESKTOP) {
            self.desktop = match codec::value32(replies.take().as_ref(), CARDINAL) {
                Some(ON_ALL_DESKTOPS_WIRE) => ON_ALL_DESKTOPS,
                Some(x) => x.wrapping_add(1) as i32,
                None => 0,
            };
        }
        if p.contains(Properties::WM_NAME) {
            self.name = codec::string(replies.take().as_ref(), utf8);
        }
        if p.contains(Properties::WM_VISIBLE_NAME) {
            self.visible_name = codec::string(replies.take().as_ref(), utf8);
        }
        if p.contains(Properties::WM_ICON_NAME) {
            self.icon_name = codec::string(replies.take().as_ref(), utf8);
        }
        if p.contains(Properties::WM_VISIBLE_ICON_NAME) {
            self.visible_icon_name = codec::string(replies.take().as_ref(), utf8);
        }
        if p.contains(Properties::WM_WINDOW_TYPE) {
            let list = codec::array32(replies.take().as_ref(), ATOM);
            self.has_net_support = !list.is_empty();
            self.types = list.iter().map(|x| a.window_type_of(*x)).filter(|x| *x != WindowType::Unknown).collect();
            if self.has_net_support && self.types.is_empty() {
                self.types.push(WindowType::Unknown);
            }
        }
        if p.contains(Properties::WM_STRUT) {
            self.strut = match codec::array32(replies.take().as_ref(), CARDINAL).as_slice() {
                [left, right, top, bottom] => {
                    Strut { left: *left as i32, right: *right as i32, top: *top as i32, bottom: *bottom as i32 }
                },
                _ => Strut::default(),
            };
        }
        if p2.contains(Properties2::EXTENDED_STRUT) {
            let words = codec::array32(replies.take().as_ref(), CARDINAL);
            self.extended_strut = match words.len() {
                12 => {
                    let w: Vec<i32> = words.iter().map(|x| *x as i32).collect();
                    ExtendedStrut {
                        left_width: w[0],
                        right_width: w[1],
                        top_width: w[2],
                        bottom_width: w[3],
                        left_start: w[4],
                        left_end: w[5],
                        right_start: w[6],
                        right_end: w[7],
                        top_start: w[8],
                        top_end: w[9],
                        bottom_start: w[10],
                        bottom_end: w[11],
                    }
                },
                _ => ExtendedStrut::default(),
            };
        }
        if p2.contains(Properties2::FULLSCREEN_MONITORS) {
            self.fullscreen_monitors = match codec::array32(replies.take().as_ref(), CARDINAL).as_slice() {
                [top, bottom, left, right] => FullscreenMonitors {
                    top: *top as i32,
                    bottom: *bottom as i32,
                    left: *left as i32,
                    right: *right as i32,
                },
                _ => FullscreenMonitors::default(),
            };
        }
        if p.contains(Properties::WM_ICON_GEOMETRY) {
            self.icon_geometry = match codec::array32(replies.take().as_ref(), CARDINAL).as_slice() {
                [x, y, w, h] => Rect::new(*x as i32, *y as i32, *w as i32, *h as i32),
                _ => Rect::default(),
            };
        }
        if p.contains(Properties::WM_ICON) {
            self.icons = codec::icons(replies.take().as_ref());
        }
        if p.contains(Properties::WM_FRAME_EXTENTS) {
            // the KDE name is only a fallback for older window managers
            let standard = codec::array32(replies.take().as_ref(), CARDINAL);
            let kde = codec::array32(replies.take().as_ref(), CARDINAL);
            let words = if standard.is_empty() { kde } else { standard };
            self.frame_extents = strut_of(&words);
        }
        if p2.contains(Properties2::FRAME_OVERLAP) {
            self.frame_overlap = strut_of(&codec::array32(replies.take().as_ref(), CARDINAL));
        }
        if p2.contains(Properties2::ACTIVITIES) {
            self.activities = codec::string(replies.take().as_ref(), STRING);
        }
        if p2.contains(Properties2::BLOCK_COMPOSITING) {
            self.blocking_compositing = codec::value32(replies.take().as_ref(), CARDINAL).unwrap_or(0) != 0;
        }
        if p.contains(Properties::WM_PID) {
            self.pid = codec::value32(replies.take().as_ref(), CARDINAL).unwrap_or(0);
        }
        if p.contains(Properties::WM_HANDLED_ICONS) {
            self.handled_icons = codec::value32(replies.take().as_ref(), CARDINAL).unwrap_or(0) != 0;
        }
        if p2.contains(Properties2::STARTUP_ID) {
            self.startup_id = codec::string(replies.take().as_ref(), utf8);
        }
        if p2.contains(Properties2::OPACITY) {
            self.opacity = codec::value32(replies.take().as_ref(), CARDINAL).unwrap_or(u32::MAX);
        }
        if p2.contains(Properties2::ALLOWED_ACTIONS) {
            let list = codec::array32(replies.take().as_ref(), ATOM);
            self.allowed_actions = list.iter().fold(Actions::empty(), |acc, x| acc | a.action_of(*x));
        }
        if p2.contains(Properties2::USER_TIME) {
            self.user_time = codec::value32(replies.take().as_ref(), CARDINAL).unwrap_or(u32::MAX);
        }
        if p2.contains(Properties2::TRANSIENT_FOR) {
            self.transient_for = codec::value32(replies.take().as_ref(), WINDOW).unwrap_or(NONE);
        }
        if p2.contains(Properties2::GROUP_LEADER) {
            let hints = codec::array32(replies.take().as_ref(), WM_HINTS);
            self.group_leader = NONE;
            if hints.len() > WINDOW_GROUP_WORD && hints[0] & WINDOW_GROUP_HINT != 0 {
                self.group_leader = hints[WINDOW_GROUP_WORD];
            }
        }
        if p2.contains(Properties2::WINDOW_CLASS) {
            let list = codec::string_list(replies.take().as_ref(), STRING);
            (self.class_name, self.class_class) = match <[String; 2]>::try_from(list) {
                Ok([name, class]) => (name, class),
                Err(_) => (String::new(), String::new()),
            };
        }
        if p2.contains(Properties2::WINDOW_ROLE) {
            self.window_role = codec::string(replies.take().as_ref(), STRING);
        }
        if p2.contains(Properties2::CLIENT_MACHINE) {
            self.client_machine = codec::string(replies.take().as_ref(), STRING);
        }
        Ok(())
    }
}

fn strut_words(strut: Strut) -> Vec<u32> {
    [strut.left, strut.right, strut.top, strut.bottom].map(|x| x as u32).to_vec()
}

fn strut_of(words: &[u32]) -> Strut {
    match words {
        [left, right, top, bottom] => {
            Strut { left: *left as i32, right: *right as i32, top: *top as i32, bottom: *bottom as i32 }
        },
        _ => Strut::default(),
    }
}

fn rect_words(rect: Rect) -> Vec<u32> {
    [rect.pos.x, rect.pos.y, rect.size.width, rect.size.height].map(|x| x as u32).to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        mock::{MockTransport, ROOT},
        transport::netwm_sendevent_mask,
    };

    const WIN: Window = 0x400;

    fn connection() -> Arc<NetConnection<MockTransport>> {
        Arc::new(NetConnection::new(MockTransport::new()))
    }

    fn atoms(conn: &Arc<NetConnection<MockTransport>>) -> AtomCollection {
        *conn.atoms().unwrap()
    }

    fn map(conn: &Arc<NetConnection<MockTransport>>) {
        let a = atoms(conn);
        conn.transport().set_words(WIN, a.WM_STATE, a.WM_STATE, &[1, 0]);
    }

    fn client(conn: &Arc<NetConnection<MockTransport>>) -> WinInfo<MockTransport> {
        WinInfo::new(conn.clone(), WIN, ROOT, Role::Client, PropertySet::all()).unwrap()
    }

    fn manager(conn: &Arc<NetConnection<MockTransport>>) -> WinInfo<MockTransport> {
        WinInfo::new(conn.clone(), WIN, ROOT, Role::WindowManager, PropertySet::all()).unwrap()
    }

    /// Let the window manager side act on everything the client sent
    fn deliver(conn: &Arc<NetConnection<MockTransport>>, wm: &mut WinInfo<MockTransport>, client: &mut WinInfo<MockTransport>) {
        for sent in conn.transport().sent() {
            wm.event(&NetEvent::ClientMessage(sent.message)).unwrap();
        }
        conn.transport().clear_sent();
        let atom = atoms(conn)._NET_WM_STATE;
        let dirty = client.event(&NetEvent::PropertyNotify { window: WIN, atom }).unwrap();
        client.update(dirty).unwrap();
    }

    #[test]
    fn test_state_toggling() {
        let conn = connection();
        map(&conn);
        let mut wm = manager(&conn);
        let mut client = client(&conn);
        let before = client.state();

        client.set_state(State::STICKY, State::STICKY).unwrap();
        let sent = conn.transport().sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].destination, ROOT);
        assert_eq!(sent[0].mask, u32::from(netwm_sendevent_mask()));
        assert_eq!(sent[0].message.window, WIN);
        assert_eq!(sent[0].message.data[..3], [1, atoms(&conn)._NET_WM_STATE_STICKY, 0]);
        assert_eq!(client.state(), before);
        deliver(&conn, &mut wm, &mut client);
        assert_eq!(client.state(), State::STICKY);

        client.set_state(State::empty(), State::STICKY).unwrap();
        assert_eq!(conn.transport().sent().len(), 1);
        assert_eq!(conn.transport().sent()[0].message.data[0], 0);
        deliver(&conn, &mut wm, &mut client);
        assert_eq!(client.state(), before);

        // nothing changes, nothing is sent
        client.set_state(State::empty(), State::STICKY).unwrap();
        assert!(conn.transport().sent().is_empty());
    }

    #[test]
    fn test_maximize_travels_in_one_message() {
        let conn = connection();
        map(&conn);
        let mut client = client(&conn);
        let a = atoms(&conn);

        client.set_state(State::MAX, State::MAX).unwrap();
        let sent = conn.transport().sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].message.data[..3], [1, a._NET_WM_STATE_MAXIMIZED_HORZ, a._NET_WM_STATE_MAXIMIZED_VERT]);

        conn.transport().clear_sent();
        client.set_state(State::MAX_VERT | State::SHADED, State::MAX | State::SHADED).unwrap();
        let data: Vec<[u32; 5]> = conn.transport().sent().iter().map(|x| x.message.data).collect();
        assert_eq!(data, vec![[1, a._NET_WM_STATE_MAXIMIZED_VERT, 0, 0, 0], [1, a._NET_WM_STATE_SHADED, 0, 0, 0]]);
    }

    #[test]
    fn test_unmapped_client_writes_state() {
        let conn = connection();
        let mut client = client(&conn);
        assert_eq!(client.mapping_state(), MappingState::Withdrawn);
        client.set_state(State::SKIP_TASKBAR | State::KEEP_ABOVE, State::all()).unwrap();
        assert!(conn.transport().sent().is_empty());

        let a = atoms(&conn);
        assert_eq!(
            conn.transport().words(WIN, a._NET_WM_STATE),
            Some(vec![a._NET_WM_STATE_SKIP_TASKBAR, a._NET_WM_STATE_ABOVE, a._NET_WM_STATE_STAYS_ON_TOP])
        );
        assert_eq!(client.state(), State::SKIP_TASKBAR | State::KEEP_ABOVE);
    }

    #[test]
    fn test_state_is_read_even_without_interest() {
        let conn = connection();
        map(&conn);
        let a = atoms(&conn);
        conn.transport().set_words(WIN, a._NET_WM_STATE, ATOM, &[a._NET_WM_STATE_STICKY]);
        let mut client = WinInfo::new(conn.clone(), WIN, ROOT, Role::Client, PropertySet::default()).unwrap();
        client.set_state(State::STICKY, State::STICKY).unwrap();
        assert!(conn.transport().sent().is_empty());
    }

    #[test]
    fn test_window_manager_state_requests() {
        struct Refuse;
        impl WinPolicy for Refuse {
            fn change_state(&mut self, _state: State, _mask: State) -> bool {
                false
            }
        }

        let conn = connection();
        let a = atoms(&conn);
        let mut wm = manager(&conn);
        wm.set_state(State::SHADED, State::SHADED).unwrap();

        let toggle = ClientMessage::new(WIN, a._NET_WM_STATE, [STATE_TOGGLE, a._NET_WM_STATE_SHADED, a._NET_WM_STATE_HIDDEN, 0, 0]);
        let dirty = wm.event(&NetEvent::ClientMessage(toggle)).unwrap();
        assert_eq!(dirty, Properties::WM_STATE.into());
        assert_eq!(wm.state(), State::HIDDEN);

        let remove = ClientMessage::new(WIN, a._NET_WM_STATE, [STATE_REMOVE, a._NET_WM_STATE_HIDDEN, 0, 0, 0]);
        wm.event_with(&NetEvent::ClientMessage(remove), &mut Refuse).unwrap();
        assert_eq!(wm.state(), State::HIDDEN);

        // messages about other windows are left alone
        let other = ClientMessage::new(WIN + 1, a._NET_WM_STATE, [STATE_REMOVE, a._NET_WM_STATE_HIDDEN, 0, 0, 0]);
        assert!(wm.event(&NetEvent::ClientMessage(other)).unwrap().is_empty());
        assert_eq!(wm.state(), State::HIDDEN);
    }

    #[test]
    fn test_window_type_priority() {
        let conn = connection();
        let a = atoms(&conn);
        let list = [a._NET_WM_WINDOW_TYPE_DROPDOWN_MENU, a._NET_WM_WINDOW_TYPE_NORMAL];
        conn.transport().set_words(WIN, a._NET_WM_WINDOW_TYPE, ATOM, &list);
        let client = client(&conn);
        assert_eq!(client.window_types(), &[WindowType::DropdownMenu, WindowType::Normal]);
        assert_eq!(client.window_type(WindowTypeMask::NORMAL), WindowType::Normal);
        assert_eq!(client.window_type(WindowTypeMask::all()), WindowType::DropdownMenu);
        assert_eq!(client.window_type(WindowTypeMask::DOCK), WindowType::Unknown);
        assert!(client.has_net_support());
    }

    #[test]
    fn test_unknown_window_type() {
        let conn = connection();
        let a = atoms(&conn);
        conn.transport().set_words(WIN, a._NET_WM_WINDOW_TYPE, ATOM, &[a.UTF8_STRING]);
        let client = client(&conn);
        assert_eq!(client.window_types(), &[WindowType::Unknown]);
        assert_eq!(client.window_type(WindowTypeMask::all()), WindowType::Unknown);
    }

    #[test]
    fn test_set_window_type_fallbacks() {
        let conn = connection();
        let a = atoms(&conn);
        let mut client = client(&conn);
        client.set_window_type(WindowType::Splash).unwrap();
        assert_eq!(
            conn.transport().words(WIN, a._NET_WM_WINDOW_TYPE),
            Some(vec![a._NET_WM_WINDOW_TYPE_SPLASH, a._NET_WM_WINDOW_TYPE_DOCK])
        );
        client.set_window_type(WindowType::Dialog).unwrap();
        assert_eq!(conn.transport().words(WIN, a._NET_WM_WINDOW_TYPE), Some(vec![a._NET_WM_WINDOW_TYPE_DIALOG]));
        assert_eq!(client.window_type(WindowTypeMask::all()), WindowType::Dialog);

        // window types belong to the client
        let mut wm = manager(&conn);
        let writes = conn.transport().writes();
        wm.set_window_type(WindowType::Dock).unwrap();
        assert_eq!(conn.transport().writes(), writes);
    }

    #[test]
    fn test_icon_selection() {
        let conn = connection();
        let mut client = client(&conn);
        assert_eq!(client.icon(16, 16), Icon::default());
        for size in [16, 32, 48] {
            client.set_icon(Icon::new(size, size, vec![size as u32; (size * size) as usize]), false).unwrap();
        }
        assert_eq!(client.icon(-1, -1).size, Size::new(48, 48));
        assert_eq!(client.icon(20, 20).size, Size::new(32, 32));
        assert_eq!(client.icon(32, 32).size, Size::new(32, 32));
        assert_eq!(client.icon(64, 64).size, Size::new(48, 48));
        assert_eq!(client.icon_sizes().len(), 3);

        // what was written reads back the same
        let atom = atoms(&conn)._NET_WM_ICON;
        let dirty = client.event(&NetEvent::PropertyNotify { window: WIN, atom }).unwrap();
        client.update(dirty).unwrap();
        assert_eq!(client.icon_sizes(), vec![Size::new(16, 16), Size::new(32, 32), Size::new(48, 48)]);

        client.set_icon(Icon::new(1, 1, vec![7]), true).unwrap();
        assert_eq!(client.icons().len(), 1);
    }

    #[test]
    fn test_malformed_format_resets_field() {
        let conn = connection();
        let a = atoms(&conn);
        conn.transport().set_words(WIN, a._NET_WM_STRUT, CARDINAL, &[1, 2, 3, 4]);
        conn.transport().set_words(WIN, a._NET_WM_PID, CARDINAL, &[42]);
        let mut client = client(&conn);
        assert_eq!(client.strut(), Strut { left: 1, right: 2, top: 3, bottom: 4 });
        assert_eq!(client.pid(), 42);

        conn.transport().set_raw(WIN, a._NET_WM_STRUT, CARDINAL, 8, vec![1, 2, 3, 4]);
        conn.transport().set_raw(WIN, a._NET_WM_PID, CARDINAL, 16, vec![42, 0]);
        client.update(PropertySet::from(Properties::WM_STRUT | Properties::WM_PID)).unwrap();
        assert_eq!(client.strut(), Strut::default());
        assert_eq!(client.pid(), 0);
    }

    #[test]
    fn test_desktop_needs_managed_window() {
        let conn = connection();
        let a = atoms(&conn);
        let mut client = client(&conn);
        let err = client.set_desktop(2, true).unwrap_err();
        assert_eq!(err.netwm(), Some(&NetwmError::WindowNotManaged(WIN)));

        // once mapped, the client asks the window manager
        map(&conn);
        client.update(Properties::XA_WM_STATE.into()).unwrap();
        client.set_desktop(ON_ALL_DESKTOPS, true).unwrap();
        client.set_desktop(0, true).unwrap();
        let sent = conn.transport().sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].message.message_type, a._NET_WM_DESKTOP);
        assert_eq!(sent[0].message.data[0], 0xFFFF_FFFF);

        let mut wm = manager(&conn);
        wm.event(&NetEvent::ClientMessage(sent[0].message)).unwrap();
        assert!(wm.is_on_all_desktops());
        let dirty = client.event(&NetEvent::PropertyNotify { window: WIN, atom: a._NET_WM_DESKTOP }).unwrap();
        client.update(dirty).unwrap();
        assert_eq!(client.desktop(true), ON_ALL_DESKTOPS);

        // a managed client can't remove it
        client.clear_desktop().unwrap();
        assert!(conn.transport().words(WIN, a._NET_WM_DESKTOP).is_some());
        wm.clear_desktop().unwrap();
        assert!(conn.transport().words(WIN, a._NET_WM_DESKTOP).is_none());
        assert_eq!(wm.desktop(true), 0);
    }

    #[test]
    fn test_window_manager_writes_desktop_zero_based() {
        let conn = connection();
        let mut wm = manager(&conn);
        wm.set_desktop(3, true).unwrap();
        assert_eq!(conn.transport().words(WIN, atoms(&conn)._NET_WM_DESKTOP), Some(vec![2]));
        assert_eq!(wm.desktop(true), 3);
    }

    #[test]
    fn test_kde_geometry_is_cached() {
        let conn = connection();
        conn.transport().set_geometry(WIN, Rect::new(0, 0, 200, 100), Point::new(50, 60));
        let mut wm = manager(&conn);
        wm.set_frame_extents(Strut { left: 2, right: 3, top: 20, bottom: 4 }).unwrap();

        let (frame, window) = wm.kde_geometry().unwrap();
        assert_eq!(window, Rect::new(50, 60, 200, 100));
        assert_eq!(frame, Rect::new(48, 40, 205, 124));
        wm.kde_geometry().unwrap();
        assert_eq!(conn.transport().geometry_queries(), 1);

        let configure = NetEvent::ConfigureNotify { window: WIN, geometry: Rect::new(0, 0, 300, 100) };
        assert_eq!(wm.event(&configure).unwrap(), Properties::WM_GEOMETRY.into());
        conn.transport().set_geometry(WIN, Rect::new(0, 0, 300, 100), Point::new(50, 60));
        let (_, window) = wm.kde_geometry().unwrap();
        assert_eq!(window.size.width, 300);
        assert_eq!(conn.transport().geometry_queries(), 2);
    }

    #[test]
    fn test_frame_extents_fallback() {
        let conn = connection();
        let a = atoms(&conn);
        conn.transport().set_words(WIN, a._KDE_NET_WM_FRAME_STRUT, CARDINAL, &[1, 1, 22, 1]);
        let mut client = client(&conn);
        assert_eq!(client.frame_extents(), Strut { left: 1, right: 1, top: 22, bottom: 1 });

        // frame extents belong to the window manager
        client.set_frame_extents(Strut::default()).unwrap();
        assert_eq!(client.frame_extents().top, 22);
    }

    #[test]
    fn test_frame_overlap_clamps() {
        let conn = connection();
        let mut client = client(&conn);
        client.set_frame_overlap(Strut { left: -5, right: 3, top: -1, bottom: 0 }).unwrap();
        assert_eq!(client.frame_overlap(), Strut { left: 0, right: 3, top: 0, bottom: 0 });
        let unset = Strut { left: -1, right: -1, top: -1, bottom: -1 };
        client.set_frame_overlap(unset).unwrap();
        assert_eq!(client.frame_overlap(), unset);
    }

    #[test]
    fn test_icccm_properties() {
        let conn = connection();
        let a = atoms(&conn);
        let t = conn.transport();
        t.set_words(WIN, WM_HINTS, WM_HINTS, &[WINDOW_GROUP_HINT, 0, 0, 0, 0, 0, 0, 0, 0x777]);
        t.set_words(WIN, WM_TRANSIENT_FOR, WINDOW, &[0x555]);
        t.set_text(WIN, WM_CLASS, STRING, "xterm\0XTerm\0");
        t.set_text(WIN, a.WM_WINDOW_ROLE, STRING, "main");
        t.set_text(WIN, WM_CLIENT_MACHINE, STRING, "host");
        let client = client(&conn);
        assert_eq!(client.group_leader(), 0x777);
        assert_eq!(client.transient_for(), 0x555);
        assert_eq!(client.window_class_name(), "xterm");
        assert_eq!(client.window_class_class(), "XTerm");
        assert_eq!(client.window_role(), "main");
        assert_eq!(client.client_machine(), "host");
    }

    #[test]
    fn test_group_leader_resets() {
        let conn = connection();
        let t = conn.transport();
        let leader = [WINDOW_GROUP_HINT, 0, 0, 0, 0, 0, 0, 0, 0x777];
        t.set_words(WIN, WM_HINTS, WM_HINTS, &leader);
        let mut client = client(&conn);
        assert_eq!(client.group_leader(), 0x777);

        // flag cleared
        t.set_words(WIN, WM_HINTS, WM_HINTS, &[0; 9]);
        client.update(Properties2::GROUP_LEADER.into()).unwrap();
        assert_eq!(client.group_leader(), NONE);

        // too short to carry the group
        t.set_words(WIN, WM_HINTS, WM_HINTS, &leader);
        client.update(Properties2::GROUP_LEADER.into()).unwrap();
        assert_eq!(client.group_leader(), 0x777);
        t.set_words(WIN, WM_HINTS, WM_HINTS, &leader[..8]);
        client.update(Properties2::GROUP_LEADER.into()).unwrap();
        assert_eq!(client.group_leader(), NONE);

        // property removed
        t.set_words(WIN, WM_HINTS, WM_HINTS, &leader);
        client.update(Properties2::GROUP_LEADER.into()).unwrap();
        assert_eq!(client.group_leader(), 0x777);
        t.delete_property(WIN, WM_HINTS).unwrap();
        client.update(Properties2::GROUP_LEADER.into()).unwrap();
        assert_eq!(client.group_leader(), NONE);
    }

    #[test]
    fn test_group_leader_accepts_longer_hints() {
        let conn = connection();
        conn.transport().set_words(WIN, WM_HINTS, WM_HINTS, &[WINDOW_GROUP_HINT, 0, 0, 0, 0, 0, 0, 0, 0x777, 0]);
        let client = client(&conn);
        assert_eq!(client.group_leader(), 0x777);
    }

    #[test]
    fn test_class_needs_two_strings() {
        let conn = connection();
        conn.transport().set_text(WIN, WM_CLASS, STRING, "xterm\0");
        let client = client(&conn);
        assert_eq!(client.window_class_name(), "");
        assert_eq!(client.window_class_class(), "");
    }

    #[test]
    fn test_defaults() {
        let conn = connection();
        let client = client(&conn);
        assert_eq!(client.opacity(), u32::MAX);
        assert_eq!(client.user_time(), u32::MAX);
        assert_eq!(client.desktop(true), 0);
        assert!(!client.fullscreen_monitors().is_set());
        assert!(!client.has_window_type());
    }

    #[test]
    fn test_names_and_deletion() {
        let conn = connection();
        let a = atoms(&conn);
        let mut client = client(&conn);
        client.set_name("editor").unwrap();
        assert_eq!(conn.transport().text(WIN, a._NET_WM_NAME).unwrap(), "editor");
        client.set_name("").unwrap();
        assert!(conn.transport().property(WIN, a._NET_WM_NAME).is_none());

        client.set_visible_name("editor <2>").unwrap();
        assert_eq!(client.visible_name(), "");

        let mut wm = manager(&conn);
        wm.set_visible_name("editor <2>").unwrap();
        let dirty = client.event(&NetEvent::PropertyNotify { window: WIN, atom: a._NET_WM_VISIBLE_NAME }).unwrap();
        client.update(dirty).unwrap();
        assert_eq!(client.visible_name(), "editor <2>");
    }

    #[test]
    fn test_fullscreen_monitors_negotiated() {
        let conn = connection();
        let mut client = client(&conn);
        let topology = FullscreenMonitors { top: 0, bottom: 1, left: 0, right: 1 };
        client.set_fullscreen_monitors(topology).unwrap();
        let sent = conn.transport().sent();
        assert_eq!(sent[0].message.data, [0, 1, 0, 1, 1]);
        assert!(!client.fullscreen_monitors().is_set());

        let mut wm = manager(&conn);
        let dirty = wm.event(&NetEvent::ClientMessage(sent[0].message)).unwrap();
        assert_eq!(dirty, Properties2::FULLSCREEN_MONITORS.into());
        assert_eq!(wm.fullscreen_monitors(), topology);
    }

    #[test]
    fn test_allowed_actions_round_trip() {
        let conn = connection();
        let mut wm = manager(&conn);
        wm.set_allowed_actions(Actions::MOVE | Actions::CLOSE).unwrap();
        let client = client(&conn);
        assert_eq!(client.allowed_actions(), Actions::MOVE | Actions::CLOSE);
    }
}
