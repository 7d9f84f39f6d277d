//! `RootInfo` carries the root window half of the protocol: desktops, the client lists, the
//! active window and what the window manager supports.
//!
//! [Root Window Properties](https://specifications.freedesktop.org/wm-spec/latest/ar01s03.html)
//!
//! A window manager builds it with [`RootInfo::window_manager`] and becomes the source of truth,
//! every setter writes the root window properties directly. Anybody else builds it with
//! [`RootInfo::client`]; setters then turn into requests to the window manager and the local
//! copy only changes once the window manager has answered and [`RootInfo::update`] re-read it.
use std::sync::Arc;

use tracing::{debug, trace};

use crate::{
    atoms::*,
    codec::{self, PropertyBatch, PropertyWrite, MAX_PROP_SIZE},
    connection::NetConnection,
    model::*,
    policy::{AcceptAll, NoViewport, RootPolicy, ViewportPolicy},
    role::{applier, Applied, Change, ChangeApplier, Request},
    slots::SlotVec,
    transport::{ClientMessage, NetEvent, Transport},
    NetwmResult,
};

/// Windows that appeared in or vanished from the client list during the last refresh
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientListDiff {
    pub added: Vec<Window>,
    pub removed: Vec<Window>,
}

impl ClientListDiff {
    /// Merge two lists, both sorted
    fn between(old: &[Window], new: &[Window]) -> Self {
        let mut diff = ClientListDiff::default();
        let (mut o, mut n) = (0, 0);
        while o < old.len() || n < new.len() {
            if o == old.len() {
                diff.added.push(new[n]);
                n += 1;
            } else if n == new.len() || old[o] < new[n] {
                diff.removed.push(old[o]);
                o += 1;
            } else if new[n] < old[o] {
                diff.added.push(new[n]);
                n += 1;
            } else {
                o += 1;
                n += 1;
            }
        }
        diff
    }
}

/// RootInfo is the root window protocol state of one screen
pub struct RootInfo<T: Transport> {
    conn: Arc<NetConnection<T>>,
    atoms: AtomCollection,
    applier: Box<dyn ChangeApplier>,
    viewport_policy: Box<dyn ViewportPolicy>,

    screen: usize,
    root: Window,
    root_size: Size,
    support_window: Window,
    wm_name: String,

    // what the window manager supports and which properties this instance keeps current
    supported: Capabilities,
    interest: PropertySet,

    number_of_desktops: i32,
    current_desktop: i32,
    active: Window,
    clients: Vec<Window>,
    stacking: Vec<Window>,
    virtual_roots: Vec<Window>,
    geometry: Size,
    viewport: SlotVec<Point>,
    workarea: SlotVec<Rect>,
    desktop_names: SlotVec<Option<String>>,
    layout: DesktopLayout,
    showing_desktop: bool,
    client_diff: ClientListDiff,
}

impl<T: Transport> RootInfo<T> {
    fn with_role(conn: Arc<NetConnection<T>>, role: Role, screen: Option<usize>) -> NetwmResult<Self> {
        let atoms = *conn.atoms()?;
        let (screen, info) = conn.screen(screen)?;
        debug!("new: role: {}, screen: {}, root: {}", role, screen, info.root);
        Ok(Self {
            conn,
            atoms,
            applier: applier(role),
            viewport_policy: Box::new(NoViewport),
            screen,
            root: info.root,
            root_size: info.size,
            support_window: NONE,
            wm_name: String::new(),
            supported: Capabilities::default(),
            interest: PropertySet::default(),
            number_of_desktops: 0,
            current_desktop: 0,
            active: NONE,
            clients: vec![],
            stacking: vec![],
            virtual_roots: vec![],
            geometry: info.size,
            viewport: SlotVec::new(),
            workarea: SlotVec::new(),
            desktop_names: SlotVec::new(),
            layout: DesktopLayout::default(),
            showing_desktop: false,
            client_diff: ClientListDiff::default(),
        })
    }

    /// Window manager side of the protocol.
    ///
    /// ### Arguments
    /// * `support_window` - child window published through `_NET_SUPPORTING_WM_CHECK`
    /// * `wm_name` - name written to the support window
    /// * `supported` - capabilities to advertise, `SUPPORTED` and `SUPPORTING_WM_CHECK` are always added
    /// * `activate` - publish `_NET_SUPPORTED` and read the initial state right away
    pub fn window_manager(
        conn: Arc<NetConnection<T>>, support_window: Window, wm_name: &str, supported: Capabilities,
        screen: Option<usize>, activate: bool,
    ) -> NetwmResult<Self> {
        let mut info = Self::with_role(conn, Role::WindowManager, screen)?;
        info.support_window = support_window;
        info.wm_name = wm_name.to_string();
        info.supported = supported;
        info.supported.properties |= Properties::SUPPORTED | Properties::SUPPORTING_WM_CHECK;

        // the only root properties written by others
        info.interest = PropertySet::new(
            Properties::DESKTOP_NAMES | Properties::WM_PING,
            Properties2::TAKE_ACTIVITY | Properties2::DESKTOP_LAYOUT,
        );
        if activate {
            info.activate()?;
        }
        Ok(info)
    }

    /// Client side of the protocol, keeping the properties in `interest` current
    pub fn client(
        conn: Arc<NetConnection<T>>, interest: PropertySet, screen: Option<usize>, activate: bool,
    ) -> NetwmResult<Self> {
        let mut info = Self::with_role(conn, Role::Client, screen)?;
        info.interest = interest;
        if activate {
            info.activate()?;
        }
        Ok(info)
    }

    /// Route desktop requests through a viewport emulating collaborator
    pub fn with_viewport_policy(mut self, policy: impl ViewportPolicy + 'static) -> Self {
        self.viewport_policy = Box::new(policy);
        self
    }

    /// Publish the supported list when managing, then read every interesting property
    pub fn activate(&mut self) -> NetwmResult<()> {
        if self.role() == Role::WindowManager {
            self.set_supported()?;
        }
        self.update(PropertySet::all())
    }

    fn transport(&self) -> &T {
        self.conn.transport()
    }

    fn apply(&self, change: Change) -> NetwmResult<Applied> {
        self.applier.apply(self.conn.transport(), change)
    }

    fn root_request(&self, window: Window, message_type: Atom, data: [u32; 5]) -> Request {
        Request::to_root(self.root, window, message_type, data)
    }

    pub fn role(&self) -> Role {
        self.applier.role()
    }

    pub fn connection(&self) -> &Arc<NetConnection<T>> {
        &self.conn
    }

    pub fn atoms(&self) -> &AtomCollection {
        &self.atoms
    }

    // Capabilities
    //----------------------------------------------------------------------------------------------

    /// Write `_NET_SUPPORTED`, and the supporting window check with its name, on behalf of the
    /// window manager
    pub fn set_supported(&mut self) -> NetwmResult<()> {
        let list = self.supported.to_atoms(&self.atoms);
        debug!("set_supported: atoms: {}", list.len());
        let writes = [
            PropertyWrite::words(self.root, self.atoms._NET_SUPPORTED, ATOM, list),
            PropertyWrite::words(self.root, self.atoms._NET_SUPPORTING_WM_CHECK, WINDOW, vec![self.support_window]),
            PropertyWrite::words(
                self.support_window,
                self.atoms._NET_SUPPORTING_WM_CHECK,
                WINDOW,
                vec![self.support_window],
            ),
            PropertyWrite::bytes(
                self.support_window,
                self.atoms._NET_WM_NAME,
                self.atoms.UTF8_STRING,
                self.wm_name.as_bytes().to_vec(),
            ),
        ];
        for write in writes {
            if self.apply(Change::Owned(Role::WindowManager, write))? == Applied::Ignored {
                break;
            }
        }
        Ok(())
    }

    /// Toggle one advertised capability and republish the list
    pub fn set_supported_feature(&mut self, feature: impl Into<Feature>, on: bool) -> NetwmResult<()> {
        if self.role() != Role::WindowManager {
            return Ok(());
        }
        self.supported.set(feature, on);
        self.set_supported()
    }

    /// Whether the window manager supports the feature
    pub fn supported(&self, feature: impl Into<Feature>) -> bool {
        self.supported.supports(feature)
    }

    /// Capabilities advertised by the window manager
    pub fn supported_properties(&self) -> &Capabilities {
        &self.supported
    }

    /// Properties this instance keeps current
    pub fn passed_properties(&self) -> PropertySet {
        self.interest
    }

    /// Record the capability `atom` stands for
    pub fn update_supported_properties(&mut self, atom: Atom) {
        self.supported.add_atom(&self.atoms, atom);
    }

    // Setters
    //----------------------------------------------------------------------------------------------

    pub fn set_client_list(&mut self, windows: &[Window]) -> NetwmResult<()> {
        let write = PropertyWrite::words(self.root, self.atoms._NET_CLIENT_LIST, WINDOW, windows.to_vec());
        if self.apply(Change::Owned(Role::WindowManager, write))? == Applied::Written {
            self.clients = windows.to_vec();
        }
        Ok(())
    }

    pub fn set_client_list_stacking(&mut self, windows: &[Window]) -> NetwmResult<()> {
        let write = PropertyWrite::words(self.root, self.atoms._NET_CLIENT_LIST_STACKING, WINDOW, windows.to_vec());
        if self.apply(Change::Owned(Role::WindowManager, write))? == Applied::Written {
            self.stacking = windows.to_vec();
        }
        Ok(())
    }

    pub fn set_virtual_roots(&mut self, windows: &[Window]) -> NetwmResult<()> {
        let write = PropertyWrite::words(self.root, self.atoms._NET_VIRTUAL_ROOTS, WINDOW, windows.to_vec());
        if self.apply(Change::Owned(Role::WindowManager, write))? == Applied::Written {
            self.virtual_roots = windows.to_vec();
        }
        Ok(())
    }

    pub fn set_number_of_desktops(&mut self, count: i32) -> NetwmResult<()> {
        debug!("set_number_of_desktops: count: {}, role: {}", count, self.role());
        if count < 1 {
            return Ok(());
        }
        let atom = self.atoms._NET_NUMBER_OF_DESKTOPS;
        let change = Change::Negotiated(
            PropertyWrite::words(self.root, atom, CARDINAL, vec![count as u32]),
            self.root_request(self.root, atom, [count as u32, 0, 0, 0, 0]),
        );
        if self.apply(change)? == Applied::Written {
            self.number_of_desktops = count;
        }
        Ok(())
    }

    /// Switch desktops; desktops are numbered from 1
    ///
    /// ### Arguments
    /// * `desktop` - desktop to switch to
    /// * `ignore_viewport` - use the desktop property even when desktops are emulated by a viewport
    pub fn set_current_desktop(&mut self, desktop: i32, ignore_viewport: bool) -> NetwmResult<()> {
        debug!("set_current_desktop: desktop: {}, role: {}", desktop, self.role());
        if desktop < 1 {
            return Ok(());
        }
        if self.role() == Role::Client && !ignore_viewport && self.viewport_policy.map_viewport() {
            self.viewport_policy.set_current_desktop(desktop);
            return Ok(());
        }
        let atom = self.atoms._NET_CURRENT_DESKTOP;
        let wire = (desktop - 1) as u32;
        let change = Change::Negotiated(
            PropertyWrite::words(self.root, atom, CARDINAL, vec![wire]),
            self.root_request(self.root, atom, [wire, 0, 0, 0, 0]),
        );
        if self.apply(change)? == Applied::Written {
            self.current_desktop = desktop;
        }
        Ok(())
    }

    /// Name a desktop, growing the name list when the desktop does not exist yet
    pub fn set_desktop_name(&mut self, desktop: i32, name: &str) -> NetwmResult<()> {
        debug!("set_desktop_name: desktop: {}, name: {}", desktop, name);
        if desktop < 1 {
            return Ok(());
        }
        let mut names = self.desktop_names.clone();
        names.set((desktop - 1) as usize, Some(name.to_string()));
        names.ensure((self.number_of_desktops.max(1) - 1) as usize);

        let list: Vec<Option<String>> = names.iter().cloned().collect();
        let write = PropertyWrite::bytes(
            self.root,
            self.atoms._NET_DESKTOP_NAMES,
            self.atoms.UTF8_STRING,
            codec::string_list_bytes(&list),
        );
        if self.apply(Change::Shared(write))? == Applied::Written {
            self.desktop_names = names;
        }
        Ok(())
    }

    pub fn set_desktop_geometry(&mut self, size: Size) -> NetwmResult<()> {
        let atom = self.atoms._NET_DESKTOP_GEOMETRY;
        let (width, height) = (size.width as u32, size.height as u32);
        let change = Change::Negotiated(
            PropertyWrite::words(self.root, atom, CARDINAL, vec![width, height]),
            self.root_request(self.root, atom, [width, height, 0, 0, 0]),
        );
        if self.apply(change)? == Applied::Written {
            self.geometry = size;
        }
        Ok(())
    }

    /// Set the viewport of a desktop; a client can only move the viewport of the current desktop
    pub fn set_desktop_viewport(&mut self, desktop: i32, viewport: Point) -> NetwmResult<()> {
        if desktop < 1 {
            return Ok(());
        }
        let mut viewports = self.viewport.clone();
        viewports.set((desktop - 1) as usize, viewport);
        let count = self.number_of_desktops.max(desktop) as usize;
        viewports.ensure(count - 1);
        let words = viewports.iter().take(count).flat_map(|p| [p.x as u32, p.y as u32]).collect();

        let atom = self.atoms._NET_DESKTOP_VIEWPORT;
        let change = Change::Negotiated(
            PropertyWrite::words(self.root, atom, CARDINAL, words),
            self.root_request(self.root, atom, [viewport.x as u32, viewport.y as u32, 0, 0, 0]),
        );
        if self.apply(change)? == Applied::Written {
            self.viewport = viewports;
        }
        Ok(())
    }

    /// Publish the work area of a desktop, for every desktop at once
    pub fn set_work_area(&mut self, desktop: i32, area: Rect) -> NetwmResult<()> {
        if desktop < 1 {
            return Ok(());
        }
        let mut areas = self.workarea.clone();
        areas.set((desktop - 1) as usize, area);
        let count = self.number_of_desktops.max(0) as usize;
        if count > 0 {
            areas.ensure(count - 1);
        }
        let words = areas
            .iter()
            .take(count)
            .flat_map(|r| [r.pos.x as u32, r.pos.y as u32, r.size.width as u32, r.size.height as u32])
            .collect();

        let write = PropertyWrite::words(self.root, self.atoms._NET_WORKAREA, CARDINAL, words);
        if self.apply(Change::Owned(Role::WindowManager, write))? == Applied::Written {
            self.workarea = areas;
        }
        Ok(())
    }

    /// Activate `window`; a client says who asks and which window it considers active now
    pub fn set_active_window(
        &mut self, window: Window, source: RequestSource, timestamp: Timestamp, active_window: Window,
    ) -> NetwmResult<()> {
        debug!("set_active_window: window: {}, source: {:?}, role: {}", window, source, self.role());
        let atom = self.atoms._NET_ACTIVE_WINDOW;
        let change = Change::Negotiated(
            PropertyWrite::words(self.root, atom, WINDOW, vec![window]),
            self.root_request(window, atom, [source.into(), timestamp, active_window, 0, 0]),
        );
        if self.apply(change)? == Applied::Written {
            self.active = window;
        }
        Ok(())
    }

    pub fn set_showing_desktop(&mut self, showing: bool) -> NetwmResult<()> {
        let atom = self.atoms._NET_SHOWING_DESKTOP;
        let change = Change::Negotiated(
            PropertyWrite::words(self.root, atom, CARDINAL, vec![showing as u32]),
            self.root_request(self.root, atom, [showing as u32, 0, 0, 0, 0]),
        );
        if self.apply(change)? == Applied::Written {
            self.showing_desktop = showing;
        }
        Ok(())
    }

    /// Publish the desktop grid; pagers and window managers may both do this
    pub fn set_desktop_layout(
        &mut self, orientation: Orientation, columns: i32, rows: i32, corner: DesktopLayoutCorner,
    ) -> NetwmResult<()> {
        let words = vec![orientation.into(), columns as u32, rows as u32, corner.into()];
        let write = PropertyWrite::words(self.root, self.atoms._NET_DESKTOP_LAYOUT, CARDINAL, words);
        if self.apply(Change::Shared(write))? == Applied::Written {
            self.layout = DesktopLayout { orientation, columns, rows, corner };
        }
        Ok(())
    }

    // Requests to the window manager, valid from any role
    //----------------------------------------------------------------------------------------------

    fn send(&self, request: Request) -> NetwmResult<()> {
        request.send(self.transport())?;
        self.transport().flush()
    }

    pub fn close_window_request(&self, window: Window) -> NetwmResult<()> {
        debug!("close_window_request: window: {}", window);
        self.send(self.root_request(window, self.atoms._NET_CLOSE_WINDOW, [0; 5]))
    }

    pub fn move_resize_request(&self, window: Window, x_root: i32, y_root: i32, direction: Direction) -> NetwmResult<()> {
        debug!("move_resize_request: window: {}, x: {}, y: {}, direction: {:?}", window, x_root, y_root, direction);
        let data = [x_root as u32, y_root as u32, direction.into(), 0, 0];
        self.send(self.root_request(window, self.atoms._NET_WM_MOVERESIZE, data))
    }

    pub fn move_resize_window_request(
        &self, window: Window, flags: u32, x: i32, y: i32, width: i32, height: i32,
    ) -> NetwmResult<()> {
        debug!("move_resize_window_request: window: {}, flags: {:#x}", window, flags);
        let data = [flags, x as u32, y as u32, width as u32, height as u32];
        self.send(self.root_request(window, self.atoms._NET_MOVERESIZE_WINDOW, data))
    }

    pub fn restack_request(
        &self, window: Window, source: RequestSource, above: Window, detail: u32, timestamp: Timestamp,
    ) -> NetwmResult<()> {
        debug!("restack_request: window: {}, above: {}, detail: {}", window, above, detail);
        let data = [source.into(), above, detail, timestamp, 0];
        self.send(self.root_request(window, self.atoms._NET_RESTACK_WINDOW, data))
    }

    /// Ask a client whether it is still responding, window manager only
    pub fn send_ping(&self, window: Window, timestamp: Timestamp) -> NetwmResult<()> {
        if self.role() != Role::WindowManager {
            return Ok(());
        }
        let data = [self.atoms._NET_WM_PING, timestamp, window, 0, 0];
        self.send(Request::to_window(window, self.atoms.WM_PROTOCOLS, data))
    }

    /// Hand activity to a client, window manager only
    pub fn take_activity(&self, window: Window, timestamp: Timestamp, flags: u32) -> NetwmResult<()> {
        if self.role() != Role::WindowManager {
            return Ok(());
        }
        let data = [self.atoms._NET_WM_TAKE_ACTIVITY, timestamp, window, flags, 0];
        self.send(Request::to_window(window, self.atoms.WM_PROTOCOLS, data))
    }

    // Getters
    //----------------------------------------------------------------------------------------------

    pub fn screen_number(&self) -> usize {
        self.screen
    }

    pub fn root_window(&self) -> Window {
        self.root
    }

    pub fn support_window(&self) -> Window {
        self.support_window
    }

    pub fn wm_name(&self) -> &str {
        &self.wm_name
    }

    pub fn client_list(&self) -> &[Window] {
        &self.clients
    }

    pub fn client_list_stacking(&self) -> &[Window] {
        &self.stacking
    }

    /// Client list changes seen by the last refresh, client role only
    pub fn client_list_diff(&self) -> &ClientListDiff {
        &self.client_diff
    }

    pub fn virtual_roots(&self) -> &[Window] {
        &self.virtual_roots
    }

    /// Size of the desktop, the root window size until the window manager says otherwise
    pub fn desktop_geometry(&self) -> Size {
        match self.geometry.width > 0 && self.geometry.height > 0 {
            true => self.geometry,
            false => self.root_size,
        }
    }

    pub fn desktop_viewport(&self, desktop: i32) -> Point {
        if desktop < 1 {
            return Point::default();
        }
        self.viewport.get((desktop - 1) as usize).copied().unwrap_or_default()
    }

    pub fn work_area(&self, desktop: i32) -> Rect {
        if desktop < 1 {
            return Rect::default();
        }
        self.workarea.get((desktop - 1) as usize).copied().unwrap_or_default()
    }

    /// Name of a desktop, desktops are numbered from 1
    pub fn desktop_name(&self, desktop: i32) -> Option<&str> {
        if desktop < 1 {
            return None;
        }
        self.desktop_names.get((desktop - 1) as usize)?.as_deref()
    }

    pub fn desktop_layout(&self) -> DesktopLayout {
        self.layout
    }

    pub fn number_of_desktops(&self, ignore_viewport: bool) -> i32 {
        if !ignore_viewport && self.viewport_policy.map_viewport() {
            return self.viewport_policy.number_of_desktops();
        }
        self.number_of_desktops.max(1)
    }

    pub fn current_desktop(&self, ignore_viewport: bool) -> i32 {
        if !ignore_viewport && self.viewport_policy.map_viewport() {
            return self.viewport_policy.current_desktop();
        }
        self.current_desktop.max(1)
    }

    pub fn active_window(&self) -> Window {
        self.active
    }

    pub fn showing_desktop(&self) -> bool {
        self.showing_desktop
    }

    // Events
    //----------------------------------------------------------------------------------------------

    /// Classify an event, accepting every window manager request as is
    pub fn event(&mut self, event: &NetEvent) -> NetwmResult<PropertySet> {
        self.event_with(event, &mut AcceptAll)
    }

    /// Classify an event into the properties it made stale.
    ///
    /// In the window manager role client requests are offered to `policy` and accepted changes
    /// are written before returning. Property notifications only mark fields dirty, pass the
    /// result (possibly merged with others) to [`RootInfo::update`] to re-read them.
    pub fn event_with<P: RootPolicy + ?Sized>(&mut self, event: &NetEvent, policy: &mut P) -> NetwmResult<PropertySet> {
        match event {
            NetEvent::ClientMessage(message) if self.role() == Role::WindowManager && message.format == 32 => {
                self.handle_request(message, policy)
            },
            NetEvent::PropertyNotify { window, atom } if *window == self.root => Ok(self.dirty_for(*atom)),
            _ => Ok(PropertySet::default()),
        }
    }

    fn dirty_for(&self, atom: Atom) -> PropertySet {
        let a = &self.atoms;
        let dirty: PropertySet = match atom {
            NONE => PropertySet::default(),
            x if x == a._NET_CLIENT_LIST => Properties::CLIENT_LIST.into(),
            x if x == a._NET_CLIENT_LIST_STACKING => Properties::CLIENT_LIST_STACKING.into(),
            x if x == a._NET_DESKTOP_NAMES => Properties::DESKTOP_NAMES.into(),
            x if x == a._NET_WORKAREA => Properties::WORK_AREA.into(),
            x if x == a._NET_NUMBER_OF_DESKTOPS => Properties::NUMBER_OF_DESKTOPS.into(),
            x if x == a._NET_DESKTOP_GEOMETRY => Properties::DESKTOP_GEOMETRY.into(),
            x if x == a._NET_DESKTOP_VIEWPORT => Properties::DESKTOP_VIEWPORT.into(),
            x if x == a._NET_CURRENT_DESKTOP => Properties::CURRENT_DESKTOP.into(),
            x if x == a._NET_ACTIVE_WINDOW => Properties::ACTIVE_WINDOW.into(),
            x if x == a._NET_SHOWING_DESKTOP => Properties2::SHOWING_DESKTOP.into(),
            x if x == a._NET_SUPPORTED => Properties::SUPPORTED.into(),
            x if x == a._NET_SUPPORTING_WM_CHECK => Properties::SUPPORTING_WM_CHECK.into(),
            x if x == a._NET_VIRTUAL_ROOTS => Properties::VIRTUAL_ROOTS.into(),
            x if x == a._NET_DESKTOP_LAYOUT => Properties2::DESKTOP_LAYOUT.into(),
            _ => PropertySet::default(),
        };
        trace!("dirty_for: atom: {}, dirty: {:?}", atom, dirty);
        dirty
    }

    fn handle_request<P: RootPolicy + ?Sized>(
        &mut self, message: &ClientMessage, policy: &mut P,
    ) -> NetwmResult<PropertySet> {
        let a = self.atoms;
        let data = message.data;
        let window = message.window;
        debug!("handle_request: window: {}, type: {}, data: {:?}", window, message.message_type, data);

        // Source and timestamp are only trusted when the source is one we know
        let source = RequestSource::try_from(data[0]).ok();

        let dirty: PropertySet = match message.message_type {
            NONE => PropertySet::default(),
            x if x == a._NET_NUMBER_OF_DESKTOPS => {
                if policy.change_number_of_desktops(data[0] as i32) {
                    self.set_number_of_desktops(data[0] as i32)?;
                }
                Properties::NUMBER_OF_DESKTOPS.into()
            },
            x if x == a._NET_DESKTOP_GEOMETRY => {
                let size = Size::new(data[0] as i32, data[1] as i32);
                if policy.change_desktop_geometry(size) {
                    self.set_desktop_geometry(size)?;
                }
                Properties::DESKTOP_GEOMETRY.into()
            },
            x if x == a._NET_DESKTOP_VIEWPORT => {
                let point = Point::new(data[0] as i32, data[1] as i32);
                let desktop = self.current_desktop(true);
                if policy.change_desktop_viewport(desktop, point) {
                    self.set_desktop_viewport(desktop, point)?;
                }
                Properties::DESKTOP_VIEWPORT.into()
            },
            x if x == a._NET_CURRENT_DESKTOP => {
                let desktop = data[0].wrapping_add(1) as i32;
                if policy.change_current_desktop(desktop) {
                    self.set_current_desktop(desktop, true)?;
                }
                Properties::CURRENT_DESKTOP.into()
            },
            x if x == a._NET_ACTIVE_WINDOW => {
                let (source, timestamp, active) = match source {
                    Some(source) => (source, data[1], data[2]),
                    None => (RequestSource::Unknown, x11rb::CURRENT_TIME, NONE),
                };
                if policy.change_active_window(window, source, timestamp, active) {
                    self.set_active_window(window, source, timestamp, active)?;
                }
                Properties::ACTIVE_WINDOW.into()
            },
            x if x == a._NET_WM_MOVERESIZE => {
                match Direction::try_from(data[2]) {
                    Ok(direction) => policy.move_resize(window, data[0] as i32, data[1] as i32, direction),
                    Err(err) => debug!("handle_request: {}", err),
                }
                PropertySet::default()
            },
            x if x == a._NET_MOVERESIZE_WINDOW => {
                let [flags, x, y, width, height] = data;
                policy.move_resize_window(window, flags, x as i32, y as i32, width as i32, height as i32);
                PropertySet::default()
            },
            x if x == a._NET_CLOSE_WINDOW => {
                policy.close_window(window);
                PropertySet::default()
            },
            x if x == a._NET_RESTACK_WINDOW => {
                let (source, timestamp) = match source {
                    Some(source) => (source, data[3]),
                    None => (RequestSource::Unknown, x11rb::CURRENT_TIME),
                };
                policy.restack_window(window, source, data[1], data[2], timestamp);
                PropertySet::default()
            },
            x if x == a.WM_PROTOCOLS && data[0] == a._NET_WM_PING && a._NET_WM_PING != NONE => {
                policy.got_ping(data[2], data[1]);
                Properties::WM_PING.into()
            },
            x if x == a.WM_PROTOCOLS && data[0] == a._NET_WM_TAKE_ACTIVITY && a._NET_WM_TAKE_ACTIVITY != NONE => {
                policy.got_take_activity(data[2], data[1], data[3]);
                Properties2::TAKE_ACTIVITY.into()
            },
            x if x == a._NET_SHOWING_DESKTOP => {
                let showing = data[0] != 0;
                if policy.change_showing_desktop(showing) {
                    self.set_showing_desktop(showing)?;
                }
                Properties2::SHOWING_DESKTOP.into()
            },
            _ => PropertySet::default(),
        };
        Ok(dirty)
    }

    // Refresh
    //----------------------------------------------------------------------------------------------

    /// Re-read every dirty property this instance is interested in, in one round trip
    pub fn update(&mut self, dirty: PropertySet) -> NetwmResult<()> {
        let dirty = dirty.intersection(self.interest);
        if dirty.is_empty() {
            return Ok(());
        }
        let (p, p2) = (dirty.properties, dirty.properties2);
        debug!("update: dirty: {:?}", dirty);

        let a = self.atoms;
        let root = self.root;
        let mut batch = PropertyBatch::new();
        let reads: [(bool, Atom, Atom, u32); 14] = [
            (p.contains(Properties::SUPPORTED), a._NET_SUPPORTED, ATOM, MAX_PROP_SIZE),
            (p.contains(Properties::CLIENT_LIST), a._NET_CLIENT_LIST, WINDOW, MAX_PROP_SIZE),
            (p.contains(Properties::CLIENT_LIST_STACKING), a._NET_CLIENT_LIST_STACKING, WINDOW, MAX_PROP_SIZE),
            (p.contains(Properties::NUMBER_OF_DESKTOPS), a._NET_NUMBER_OF_DESKTOPS, CARDINAL, 1),
            (p.contains(Properties::DESKTOP_GEOMETRY), a._NET_DESKTOP_GEOMETRY, CARDINAL, 2),
            (p.contains(Properties::DESKTOP_VIEWPORT), a._NET_DESKTOP_VIEWPORT, CARDINAL, MAX_PROP_SIZE),
            (p.contains(Properties::CURRENT_DESKTOP), a._NET_CURRENT_DESKTOP, CARDINAL, 1),
            (p.contains(Properties::DESKTOP_NAMES), a._NET_DESKTOP_NAMES, a.UTF8_STRING, MAX_PROP_SIZE),
            (p.contains(Properties::ACTIVE_WINDOW), a._NET_ACTIVE_WINDOW, WINDOW, 1),
            (p.contains(Properties::WORK_AREA), a._NET_WORKAREA, CARDINAL, MAX_PROP_SIZE),
            (p.contains(Properties::SUPPORTING_WM_CHECK), a._NET_SUPPORTING_WM_CHECK, WINDOW, 1),
            (p.contains(Properties::VIRTUAL_ROOTS), a._NET_VIRTUAL_ROOTS, WINDOW, MAX_PROP_SIZE),
            (p2.contains(Properties2::DESKTOP_LAYOUT), a._NET_DESKTOP_LAYOUT, CARDINAL, 4),
            (p2.contains(Properties2::SHOWING_DESKTOP), a._NET_SHOWING_DESKTOP, CARDINAL, 1),
        ];
        for (_, atom, type_, length) in reads.iter().filter(|x| x.0) {
            batch.push(root, *atom, *type_, *length);
        }
        let mut replies = batch.fetch(self.transport())?;

        if p.contains(Properties::SUPPORTED) {
            let list = codec::array32(replies.take().as_ref(), ATOM);
            self.supported = Capabilities::from_atoms(&a, &list);
        }
        if p.contains(Properties::CLIENT_LIST) {
            let clients = codec::array32(replies.take().as_ref(), WINDOW);
            if self.role() == Role::Client {
                let (mut old, mut new) = (self.clients.clone(), clients.clone());
                old.sort_unstable();
                new.sort_unstable();
                self.client_diff = ClientListDiff::between(&old, &new);
            }
            self.clients = clients;
        }
        if p.contains(Properties::CLIENT_LIST_STACKING) {
            self.stacking = codec::array32(replies.take().as_ref(), WINDOW);
        }
        if p.contains(Properties::NUMBER_OF_DESKTOPS) {
            self.number_of_desktops = codec::value32(replies.take().as_ref(), CARDINAL).unwrap_or(0) as i32;
        }
        if p.contains(Properties::DESKTOP_GEOMETRY) {
            self.geometry = match codec::array32(replies.take().as_ref(), CARDINAL).as_slice() {
                [w, h] => Size::new(*w as i32, *h as i32),
                _ => self.root_size,
            };
        }
        if p.contains(Properties::DESKTOP_VIEWPORT) {
            let words = codec::array32(replies.take().as_ref(), CARDINAL);
            let mut viewport = SlotVec::new();
            for (i, pair) in words.chunks_exact(2).enumerate() {
                viewport.set(i, Point::new(pair[0] as i32, pair[1] as i32));
            }
            if words.len() % 2 != 0 {
                debug!("update: desktop viewport array has an odd length");
            }
            self.viewport = viewport;
        }
        if p.contains(Properties::CURRENT_DESKTOP) {
            self.current_desktop = match codec::value32(replies.take().as_ref(), CARDINAL) {
                Some(x) => x.wrapping_add(1) as i32,
                None => 0,
            };
        }
        if p.contains(Properties::DESKTOP_NAMES) {
            let names = codec::string_list(replies.take().as_ref(), a.UTF8_STRING);
            self.desktop_names = names.into_iter().map(|x| (!x.is_empty()).then_some(x)).collect();
        }
        if p.contains(Properties::ACTIVE_WINDOW) {
            self.active = codec::value32(replies.take().as_ref(), WINDOW).unwrap_or(NONE);
        }
        if p.contains(Properties::WORK_AREA) {
            let words = codec::array32(replies.take().as_ref(), CARDINAL);
            self.workarea.clear();
            if self.number_of_desktops > 0 && words.len() == self.number_of_desktops as usize * 4 {
                for (i, r) in words.chunks_exact(4).enumerate() {
                    self.workarea.set(i, Rect::new(r[0] as i32, r[1] as i32, r[2] as i32, r[3] as i32));
                }
            }
        }
        let mut wm_name_batch = None;
        if p.contains(Properties::SUPPORTING_WM_CHECK) {
            self.support_window = codec::value32(replies.take().as_ref(), WINDOW).unwrap_or(NONE);
            self.wm_name.clear();
            if self.support_window != NONE {
                let mut batch = PropertyBatch::new();
                batch.push(self.support_window, a._NET_WM_NAME, a.UTF8_STRING, MAX_PROP_SIZE);
                wm_name_batch = Some(batch);
            }
        }
        if p.contains(Properties::VIRTUAL_ROOTS) {
            self.virtual_roots = codec::array32(replies.take().as_ref(), WINDOW);
        }
        if p2.contains(Properties2::DESKTOP_LAYOUT) {
            let words = codec::array32(replies.take().as_ref(), CARDINAL);
            self.layout = decode_layout(&words);
        }
        if p2.contains(Properties2::SHOWING_DESKTOP) {
            self.showing_desktop = codec::value32(replies.take().as_ref(), CARDINAL).unwrap_or(0) != 0;
        }

        // The window manager name lives on the support window, read it once that is known
        if let Some(batch) = wm_name_batch {
            let mut replies = batch.fetch(self.transport())?;
            self.wm_name = codec::string(replies.take().as_ref(), a.UTF8_STRING);
        }
        Ok(())
    }
}

/// Decode `_NET_DESKTOP_LAYOUT`, out of range fields keep their defaults
fn decode_layout(words: &[u32]) -> DesktopLayout {
    let mut layout = DesktopLayout::default();
    if words.len() >= 4 {
        layout.corner = match words[3] {
            0 => DesktopLayoutCorner::TopLeft,
            1 => DesktopLayoutCorner::TopRight,
            2 => DesktopLayoutCorner::BottomLeft,
            3 => DesktopLayoutCorner::BottomRight,
            _ => layout.corner,
        };
    }
    if words.len() >= 3 {
        layout.orientation = match words[0] {
            0 => Orientation::Horizontal,
            1 => Orientation::Vertical,
            _ => layout.orientation,
        };
        layout.columns = words[1] as i32;
        layout.rows = words[2] as i32;
    }
    layout
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::{
        mock::{MockTransport, ROOT},
        transport::netwm_sendevent_mask,
    };

    const SUPPORT: Window = 0x50;

    fn connection() -> Arc<NetConnection<MockTransport>> {
        Arc::new(NetConnection::new(MockTransport::new()))
    }

    fn wm(conn: &Arc<NetConnection<MockTransport>>, supported: Capabilities) -> RootInfo<MockTransport> {
        RootInfo::window_manager(conn.clone(), SUPPORT, "TestWM", supported, None, true).unwrap()
    }

    fn client(conn: &Arc<NetConnection<MockTransport>>) -> RootInfo<MockTransport> {
        RootInfo::client(conn.clone(), PropertySet::all(), None, true).unwrap()
    }

    fn notify(info: &RootInfo<MockTransport>, atom: Atom) -> NetEvent {
        NetEvent::PropertyNotify { window: info.root_window(), atom }
    }

    #[test]
    fn test_supported_round_trip() {
        let conn = connection();
        let caps = Capabilities {
            properties: Properties::CLIENT_LIST
                | Properties::NUMBER_OF_DESKTOPS
                | Properties::CURRENT_DESKTOP
                | Properties::WM_WINDOW_TYPE
                | Properties::WM_STATE
                | Properties::WM_FRAME_EXTENTS,
            properties2: Properties2::ALLOWED_ACTIONS | Properties2::SHOWING_DESKTOP | Properties2::OPACITY,
            window_types: WindowTypeMask::NORMAL | WindowTypeMask::DOCK | WindowTypeMask::TOP_MENU,
            states: State::STICKY | State::MAX | State::KEEP_ABOVE,
            actions: Actions::MOVE | Actions::CLOSE,
        };
        let manager = wm(&conn, caps);
        let client = client(&conn);
        assert_eq!(client.supported_properties(), manager.supported_properties());
        assert!(client.supported(Properties::SUPPORTING_WM_CHECK));
        assert!(client.supported(WindowType::TopMenu));
        assert!(!client.supported(WindowType::Dialog));
        assert_eq!(client.support_window(), SUPPORT);
        assert_eq!(client.wm_name(), "TestWM");
        assert_eq!(conn.transport().words(SUPPORT, client.atoms()._NET_SUPPORTING_WM_CHECK), Some(vec![SUPPORT]));
    }

    #[test]
    fn test_set_supported_feature() {
        let conn = connection();
        let mut manager = wm(&conn, Capabilities::window_manager_defaults());
        manager.set_supported_feature(Properties2::SHOWING_DESKTOP, true).unwrap();
        let mut client = client(&conn);
        assert!(client.supported(Properties2::SHOWING_DESKTOP));

        // clients cannot change what the window manager supports
        client.set_supported_feature(Properties::CLIENT_LIST, true).unwrap();
        assert!(!client.supported(Properties::CLIENT_LIST));
    }

    #[test]
    fn test_number_of_desktops_roles() {
        let conn = connection();
        let mut manager = wm(&conn, Capabilities::window_manager_defaults());
        manager.set_number_of_desktops(4).unwrap();
        assert_eq!(manager.number_of_desktops(false), 4);

        let mut client = client(&conn);
        assert_eq!(client.number_of_desktops(false), 4);
        client.set_number_of_desktops(6).unwrap();
        assert_eq!(client.number_of_desktops(false), 4);

        let sent = conn.transport().sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].destination, ROOT);
        assert_eq!(sent[0].mask, u32::from(netwm_sendevent_mask()));
        assert_eq!(sent[0].message.message_type, client.atoms()._NET_NUMBER_OF_DESKTOPS);
        assert_eq!(sent[0].message.data, [6, 0, 0, 0, 0]);

        // the window manager applies the request, the client catches up on notification
        let dirty = manager.event(&NetEvent::ClientMessage(sent[0].message)).unwrap();
        assert_eq!(dirty, Properties::NUMBER_OF_DESKTOPS.into());
        assert_eq!(manager.number_of_desktops(false), 6);

        let atom = client.atoms()._NET_NUMBER_OF_DESKTOPS;
        let dirty = client.event(&notify(&client, atom)).unwrap();
        assert_eq!(client.number_of_desktops(false), 4);
        client.update(dirty).unwrap();
        assert_eq!(client.number_of_desktops(false), 6);
    }

    #[test]
    fn test_invalid_desktops_are_ignored() {
        let conn = connection();
        let mut manager = wm(&conn, Capabilities::window_manager_defaults());
        let writes = conn.transport().writes();
        manager.set_number_of_desktops(0).unwrap();
        manager.set_current_desktop(0, true).unwrap();
        manager.set_current_desktop(-3, true).unwrap();
        manager.set_desktop_name(0, "zero").unwrap();
        manager.set_work_area(-1, Rect::new(0, 0, 1, 1)).unwrap();
        assert_eq!(conn.transport().writes(), writes);
        assert_eq!(manager.current_desktop(true), 1);
        assert_eq!(manager.desktop_name(0), None);
    }

    #[test]
    fn test_current_desktop_wire_is_zero_based() {
        let conn = connection();
        let mut manager = wm(&conn, Capabilities::window_manager_defaults());
        manager.set_number_of_desktops(3).unwrap();
        manager.set_current_desktop(3, true).unwrap();
        let atom = manager.atoms()._NET_CURRENT_DESKTOP;
        assert_eq!(conn.transport().words(ROOT, atom), Some(vec![2]));

        let mut client = client(&conn);
        assert_eq!(client.current_desktop(true), 3);
        client.set_current_desktop(1, false).unwrap();
        assert_eq!(conn.transport().sent()[0].message.data[0], 0);
    }

    #[derive(Default)]
    struct Scroller {
        moved_to: Mutex<Vec<i32>>,
    }

    impl ViewportPolicy for Arc<Scroller> {
        fn map_viewport(&self) -> bool {
            true
        }

        fn number_of_desktops(&self) -> i32 {
            9
        }

        fn set_current_desktop(&self, desktop: i32) {
            self.moved_to.lock().unwrap().push(desktop);
        }
    }

    #[test]
    fn test_viewport_mapping_redirects_client() {
        let conn = connection();
        let scroller = Arc::new(Scroller::default());
        let mut client = client(&conn).with_viewport_policy(scroller.clone());
        client.set_current_desktop(5, false).unwrap();
        assert_eq!(*scroller.moved_to.lock().unwrap(), vec![5]);
        assert!(conn.transport().sent().is_empty());
        assert_eq!(client.number_of_desktops(false), 9);
        assert_eq!(client.number_of_desktops(true), 1);

        client.set_current_desktop(5, true).unwrap();
        assert_eq!(conn.transport().sent().len(), 1);
    }

    #[test]
    fn test_desktop_name_grows_storage() {
        let conn = connection();
        let mut manager = wm(&conn, Capabilities::window_manager_defaults());
        manager.set_number_of_desktops(2).unwrap();
        manager.set_desktop_name(1, "Main").unwrap();
        manager.set_desktop_name(3, "Work").unwrap();
        assert_eq!(manager.desktop_name(3), Some("Work"));
        assert_eq!(manager.desktop_name(2), None);
        assert_eq!(manager.desktop_name(0), None);

        let atom = manager.atoms()._NET_DESKTOP_NAMES;
        assert_eq!(conn.transport().text(ROOT, atom).unwrap(), "Main\0\0Work\0");

        let client = client(&conn);
        assert_eq!(client.desktop_name(1), Some("Main"));
        assert_eq!(client.desktop_name(3), Some("Work"));
    }

    #[test]
    fn test_client_may_name_desktops() {
        let conn = connection();
        wm(&conn, Capabilities::window_manager_defaults());
        let mut client = client(&conn);
        assert_eq!(client.number_of_desktops(true), 1);
        client.set_desktop_name(2, "Mail").unwrap();
        assert_eq!(client.desktop_name(2), Some("Mail"));
        assert!(conn.transport().sent().is_empty());
    }

    #[test]
    fn test_work_area_and_viewport() {
        let conn = connection();
        let mut manager = wm(&conn, Capabilities::window_manager_defaults());
        manager.set_number_of_desktops(2).unwrap();
        manager.set_work_area(2, Rect::new(0, 30, 1920, 1050)).unwrap();
        manager.set_desktop_viewport(2, Point::new(1920, 0)).unwrap();
        assert_eq!(
            conn.transport().words(ROOT, manager.atoms()._NET_WORKAREA),
            Some(vec![0, 0, 0, 0, 0, 30, 1920, 1050])
        );

        let mut client = client(&conn);
        assert_eq!(client.work_area(2), Rect::new(0, 30, 1920, 1050));
        assert_eq!(client.desktop_viewport(2), Point::new(1920, 0));
        assert_eq!(client.desktop_viewport(7), Point::default());

        // work areas that don't match the desktop count are dropped
        conn.transport().set_words(ROOT, client.atoms()._NET_WORKAREA, CARDINAL, &[1, 2, 3, 4]);
        client.update(Properties::WORK_AREA.into()).unwrap();
        assert_eq!(client.work_area(1), Rect::default());

        // work areas are written by the window manager only
        client.set_work_area(1, Rect::new(1, 1, 1, 1)).unwrap();
        assert_eq!(client.work_area(1), Rect::default());
    }

    #[test]
    fn test_desktop_geometry_falls_back_to_root() {
        let conn = connection();
        let mut client = client(&conn);
        assert_eq!(client.desktop_geometry(), Size::new(1920, 1080));

        let atom = client.atoms()._NET_DESKTOP_GEOMETRY;
        conn.transport().set_words(ROOT, atom, CARDINAL, &[3840, 1080]);
        client.update(Properties::DESKTOP_GEOMETRY.into()).unwrap();
        assert_eq!(client.desktop_geometry(), Size::new(3840, 1080));

        conn.transport().set_words(ROOT, atom, CARDINAL, &[3840]);
        client.update(Properties::DESKTOP_GEOMETRY.into()).unwrap();
        assert_eq!(client.desktop_geometry(), Size::new(1920, 1080));
    }

    #[test]
    fn test_malformed_reply_resets_field() {
        let conn = connection();
        let mut manager = wm(&conn, Capabilities::window_manager_defaults());
        manager.set_number_of_desktops(5).unwrap();
        manager.set_client_list(&[10, 11]).unwrap();
        let mut client = client(&conn);
        assert_eq!(client.number_of_desktops(true), 5);
        assert_eq!(client.client_list(), &[10, 11]);

        let a = *client.atoms();
        conn.transport().set_raw(ROOT, a._NET_NUMBER_OF_DESKTOPS, CARDINAL, 16, vec![7, 0]);
        conn.transport().set_raw(ROOT, a._NET_CLIENT_LIST, WINDOW, 32, vec![1, 2, 3, 4, 5]);
        client.update(PropertySet::from(Properties::NUMBER_OF_DESKTOPS | Properties::CLIENT_LIST)).unwrap();
        assert_eq!(client.number_of_desktops(true), 1);
        assert!(client.client_list().is_empty());
    }

    #[test]
    fn test_client_list_diff() {
        let conn = connection();
        let mut manager = wm(&conn, Capabilities::window_manager_defaults());
        manager.set_client_list(&[30, 10, 20]).unwrap();
        let mut client = client(&conn);
        assert_eq!(client.client_list(), &[30, 10, 20]);
        assert_eq!(client.client_list_diff().added, vec![10, 20, 30]);

        manager.set_client_list(&[40, 10, 30]).unwrap();
        let atom = client.atoms()._NET_CLIENT_LIST;
        let dirty = client.event(&notify(&client, atom)).unwrap();
        client.update(dirty).unwrap();
        assert_eq!(client.client_list_diff(), &ClientListDiff { added: vec![40], removed: vec![20] });
    }

    #[test]
    fn test_window_manager_only_lists() {
        let conn = connection();
        wm(&conn, Capabilities::window_manager_defaults());
        let mut client = client(&conn);
        let writes = conn.transport().writes();
        client.set_client_list(&[1]).unwrap();
        client.set_client_list_stacking(&[1]).unwrap();
        client.set_virtual_roots(&[1]).unwrap();
        assert_eq!(conn.transport().writes(), writes);
        assert!(conn.transport().sent().is_empty());
        assert!(client.client_list().is_empty());
    }

    #[test]
    fn test_property_notify_only_marks_dirty() {
        let conn = connection();
        let mut client = client(&conn);
        let a = *client.atoms();
        conn.transport().set_words(ROOT, a._NET_ACTIVE_WINDOW, WINDOW, &[77]);

        let mut dirty = client.event(&notify(&client, a._NET_ACTIVE_WINDOW)).unwrap();
        dirty |= client.event(&notify(&client, a._NET_DESKTOP_LAYOUT)).unwrap();
        dirty |= client.event(&NetEvent::PropertyNotify { window: 999, atom: a._NET_CLIENT_LIST }).unwrap();
        assert_eq!(dirty, PropertySet::new(Properties::ACTIVE_WINDOW, Properties2::DESKTOP_LAYOUT));
        assert_eq!(client.active_window(), NONE);

        let batches = conn.transport().property_batches();
        client.update(dirty).unwrap();
        assert_eq!(conn.transport().property_batches(), batches + 1);
        assert_eq!(client.active_window(), 77);
    }

    #[test]
    fn test_client_messages_are_ignored_by_clients() {
        let conn = connection();
        let mut client = client(&conn);
        let msg = ClientMessage::new(ROOT, client.atoms()._NET_NUMBER_OF_DESKTOPS, [3, 0, 0, 0, 0]);
        assert!(client.event(&NetEvent::ClientMessage(msg)).unwrap().is_empty());
        assert_eq!(client.number_of_desktops(true), 1);
    }

    #[derive(Default)]
    struct Recorder {
        refuse: bool,
        closed: Vec<Window>,
        pings: Vec<(Window, Timestamp)>,
        activations: Vec<(Window, RequestSource, Timestamp, Window)>,
        restacks: Vec<(Window, RequestSource, Window, u32, Timestamp)>,
        moves: Vec<(Window, Direction)>,
    }

    impl RootPolicy for Recorder {
        fn change_number_of_desktops(&mut self, _count: i32) -> bool {
            !self.refuse
        }

        fn change_active_window(
            &mut self, window: Window, source: RequestSource, timestamp: Timestamp, active: Window,
        ) -> bool {
            self.activations.push((window, source, timestamp, active));
            !self.refuse
        }

        fn close_window(&mut self, window: Window) {
            self.closed.push(window);
        }

        fn move_resize(&mut self, window: Window, _x: i32, _y: i32, direction: Direction) {
            self.moves.push((window, direction));
        }

        fn restack_window(
            &mut self, window: Window, source: RequestSource, above: Window, detail: u32, timestamp: Timestamp,
        ) {
            self.restacks.push((window, source, above, detail, timestamp));
        }

        fn got_ping(&mut self, window: Window, timestamp: Timestamp) {
            self.pings.push((window, timestamp));
        }
    }

    #[test]
    fn test_window_manager_requests() {
        let conn = connection();
        let mut manager = wm(&conn, Capabilities::window_manager_defaults());
        let mut client = client(&conn);
        client.set_active_window(0x99, RequestSource::Tool, 1234, 0x98).unwrap();
        client.close_window_request(0x97).unwrap();
        client.move_resize_request(0x96, 10, 20, Direction::BottomRight).unwrap();
        client.restack_request(0x95, RequestSource::Application, 0x94, 0, 55).unwrap();

        let mut policy = Recorder::default();
        for sent in conn.transport().sent() {
            manager.event_with(&NetEvent::ClientMessage(sent.message), &mut policy).unwrap();
        }
        assert_eq!(policy.activations, vec![(0x99, RequestSource::Tool, 1234, 0x98)]);
        assert_eq!(manager.active_window(), 0x99);
        assert_eq!(policy.closed, vec![0x97]);
        assert_eq!(policy.moves, vec![(0x96, Direction::BottomRight)]);
        assert_eq!(policy.restacks, vec![(0x95, RequestSource::Application, 0x94, 0, 55)]);
    }

    #[test]
    fn test_active_window_unknown_source() {
        let conn = connection();
        let mut manager = wm(&conn, Capabilities::window_manager_defaults());
        let msg = ClientMessage::new(0x42, manager.atoms()._NET_ACTIVE_WINDOW, [7, 1234, 0x41, 0, 0]);
        let mut policy = Recorder::default();
        manager.event_with(&NetEvent::ClientMessage(msg), &mut policy).unwrap();
        assert_eq!(policy.activations, vec![(0x42, RequestSource::Unknown, x11rb::CURRENT_TIME, NONE)]);
    }

    #[test]
    fn test_refused_request_is_not_applied() {
        let conn = connection();
        let mut manager = wm(&conn, Capabilities::window_manager_defaults());
        manager.set_number_of_desktops(2).unwrap();
        let msg = ClientMessage::new(ROOT, manager.atoms()._NET_NUMBER_OF_DESKTOPS, [8, 0, 0, 0, 0]);
        let mut policy = Recorder { refuse: true, ..Default::default() };
        let dirty = manager.event_with(&NetEvent::ClientMessage(msg), &mut policy).unwrap();
        assert_eq!(dirty, Properties::NUMBER_OF_DESKTOPS.into());
        assert_eq!(manager.number_of_desktops(true), 2);
    }

    #[test]
    fn test_ping_round_trip() {
        let conn = connection();
        let mut manager = wm(&conn, Capabilities::window_manager_defaults());
        manager.send_ping(0x77, 500).unwrap();
        let sent = conn.transport().sent();
        assert_eq!(sent[0].destination, 0x77);
        assert_eq!(sent[0].mask, 0);
        assert_eq!(sent[0].message.message_type, manager.atoms().WM_PROTOCOLS);

        // the client bounces the message back to the root window
        let mut policy = Recorder::default();
        let dirty = manager.event_with(&NetEvent::ClientMessage(sent[0].message), &mut policy).unwrap();
        assert_eq!(dirty, Properties::WM_PING.into());
        assert_eq!(policy.pings, vec![(0x77, 500)]);

        let client = client(&conn);
        conn.transport().clear_sent();
        client.send_ping(0x77, 501).unwrap();
        client.take_activity(0x77, 501, 0).unwrap();
        assert!(conn.transport().sent().is_empty());
    }

    #[test]
    fn test_showing_desktop_and_layout() {
        let conn = connection();
        let mut manager = wm(&conn, Capabilities::window_manager_defaults());
        manager.set_showing_desktop(true).unwrap();
        let mut client = client(&conn);
        assert!(client.showing_desktop());

        client.set_desktop_layout(Orientation::Vertical, 2, 3, DesktopLayoutCorner::BottomRight).unwrap();
        let atom = manager.atoms()._NET_DESKTOP_LAYOUT;
        let dirty = manager.event(&notify(&manager, atom)).unwrap();
        manager.update(dirty).unwrap();
        assert_eq!(
            manager.desktop_layout(),
            DesktopLayout {
                orientation: Orientation::Vertical,
                columns: 2,
                rows: 3,
                corner: DesktopLayoutCorner::BottomRight
            }
        );
    }

    #[test]
    fn test_decode_layout_ranges() {
        assert_eq!(decode_layout(&[0, 4]), DesktopLayout::default());
        let layout = decode_layout(&[5, 4, 2, 9]);
        assert_eq!(layout.orientation, Orientation::Horizontal);
        assert_eq!(layout.corner, DesktopLayoutCorner::TopLeft);
        assert_eq!((layout.columns, layout.rows), (4, 2));
    }
}
