use std::{convert, fmt, ops};

use bitflags::bitflags;

use crate::NetwmError;

pub use x11rb::protocol::xproto::{Atom, Timestamp, Window};

/// The "none" atom/window/timestamp value
pub const NONE: u32 = 0;

/// Desktop number meaning "visible on every desktop"
pub const ON_ALL_DESKTOPS: i32 = -1;

/// Wire encoding of [`ON_ALL_DESKTOPS`]
pub(crate) const ON_ALL_DESKTOPS_WIRE: u32 = 0xFFFF_FFFF;

/// Role selects which side of the protocol an instance speaks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Reads state and asks the window manager for changes with client messages
    Client,
    /// Owns the protocol state and writes properties directly
    WindowManager,
}

// Implement format! support
impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", format!("{:?}", self).to_lowercase())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    pub pos: Point,
    pub size: Size,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { pos: Point::new(x, y), size: Size::new(width, height) }
    }

    pub fn is_empty(&self) -> bool {
        self.size.width <= 0 || self.size.height <= 0
    }
}

// Implement format! support
impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}x{}+{}+{}", self.size.width, self.size.height, self.pos.x, self.pos.y)
    }
}

/// Reserved margins along the four screen edges, also used for frame extents
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Strut {
    pub left: i32,
    pub right: i32,
    pub top: i32,
    pub bottom: i32,
}

/// Reserved margins with the start/end range each margin covers along its edge
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ExtendedStrut {
    pub left_width: i32,
    pub left_start: i32,
    pub left_end: i32,
    pub right_width: i32,
    pub right_start: i32,
    pub right_end: i32,
    pub top_width: i32,
    pub top_start: i32,
    pub top_end: i32,
    pub bottom_width: i32,
    pub bottom_start: i32,
    pub bottom_end: i32,
}

/// Xinerama monitor indices spanned by a fullscreen window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FullscreenMonitors {
    pub top: i32,
    pub bottom: i32,
    pub left: i32,
    pub right: i32,
}

impl FullscreenMonitors {
    /// Topology has been provided when top is not the unset marker
    pub fn is_set(&self) -> bool {
        self.top != -1
    }
}

impl Default for FullscreenMonitors {
    fn default() -> Self {
        Self { top: -1, bottom: 0, left: 0, right: 0 }
    }
}

/// Icon pixels are ARGB, premultiplied, one u32 per pixel in row major order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Icon {
    pub size: Size,
    pub data: Vec<u32>,
}

impl Icon {
    pub fn new(width: i32, height: i32, data: Vec<u32>) -> Self {
        Self { size: Size::new(width, height), data }
    }

    pub fn is_empty(&self) -> bool {
        self.size.width <= 0 || self.size.height <= 0 || self.data.is_empty()
    }
}

/// MappingState is the ICCCM `WM_STATE` of a window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MappingState {
    #[default]
    Withdrawn,
    Visible,
    Iconic,
}

impl From<u32> for MappingState {
    fn from(val: u32) -> Self {
        match val {
            1 => MappingState::Visible,
            3 => MappingState::Iconic,
            _ => MappingState::Withdrawn,
        }
    }
}

// Implement format! support
impl fmt::Display for MappingState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", format!("{:?}", self).to_lowercase())
    }
}

/// WindowType is the functional type a window declares through `_NET_WM_WINDOW_TYPE`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum WindowType {
    #[default]
    Unknown,
    Normal,
    Desktop,
    Dock,
    Toolbar,
    Menu,
    Dialog,
    Override,
    TopMenu,
    Utility,
    Splash,
    DropdownMenu,
    PopupMenu,
    Tooltip,
    Notification,
    ComboBox,
    DNDIcon,
}

impl WindowType {
    /// Every real type, in the order used for advertising support
    pub const ALL: [WindowType; 16] = [
        WindowType::Normal,
        WindowType::Desktop,
        WindowType::Dock,
        WindowType::Toolbar,
        WindowType::Menu,
        WindowType::Dialog,
        WindowType::Utility,
        WindowType::Splash,
        WindowType::DropdownMenu,
        WindowType::PopupMenu,
        WindowType::Tooltip,
        WindowType::Notification,
        WindowType::ComboBox,
        WindowType::DNDIcon,
        WindowType::Override,
        WindowType::TopMenu,
    ];

    /// Capability bit of the type, empty for `Unknown`
    pub fn mask(self) -> WindowTypeMask {
        match self {
            WindowType::Unknown => WindowTypeMask::empty(),
            WindowType::Normal => WindowTypeMask::NORMAL,
            WindowType::Desktop => WindowTypeMask::DESKTOP,
            WindowType::Dock => WindowTypeMask::DOCK,
            WindowType::Toolbar => WindowTypeMask::TOOLBAR,
            WindowType::Menu => WindowTypeMask::MENU,
            WindowType::Dialog => WindowTypeMask::DIALOG,
            WindowType::Override => WindowTypeMask::OVERRIDE,
            WindowType::TopMenu => WindowTypeMask::TOP_MENU,
            WindowType::Utility => WindowTypeMask::UTILITY,
            WindowType::Splash => WindowTypeMask::SPLASH,
            WindowType::DropdownMenu => WindowTypeMask::DROPDOWN_MENU,
            WindowType::PopupMenu => WindowTypeMask::POPUP_MENU,
            WindowType::Tooltip => WindowTypeMask::TOOLTIP,
            WindowType::Notification => WindowTypeMask::NOTIFICATION,
            WindowType::ComboBox => WindowTypeMask::COMBO_BOX,
            WindowType::DNDIcon => WindowTypeMask::DND_ICON,
        }
    }
}

// Implement format! support
impl fmt::Display for WindowType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", format!("{:?}", self).to_lowercase())
    }
}

// Convert from &str to WindowType
impl convert::TryFrom<&str> for WindowType {
    type Error = NetwmError;

    fn try_from(val: &str) -> Result<Self, Self::Error> {
        let lower = val.to_lowercase();
        WindowType::ALL
            .iter()
            .copied()
            .find(|x| x.to_string() == lower)
            .ok_or_else(|| NetwmError::InvalidWinType(val.to_string()))
    }
}

/// Orientation of the desktop grid in `_NET_DESKTOP_LAYOUT`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Orientation {
    #[default]
    Horizontal,
    Vertical,
}

impl From<Orientation> for u32 {
    fn from(val: Orientation) -> Self {
        match val {
            Orientation::Horizontal => 0,
            Orientation::Vertical => 1,
        }
    }
}

/// Corner holding the first desktop in `_NET_DESKTOP_LAYOUT`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DesktopLayoutCorner {
    #[default]
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl From<DesktopLayoutCorner> for u32 {
    fn from(val: DesktopLayoutCorner) -> Self {
        match val {
            DesktopLayoutCorner::TopLeft => 0,
            DesktopLayoutCorner::TopRight => 1,
            DesktopLayoutCorner::BottomLeft => 2,
            DesktopLayoutCorner::BottomRight => 3,
        }
    }
}

/// Layout of desktops in a grid as published by the pager
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DesktopLayout {
    pub orientation: Orientation,
    pub columns: i32,
    pub rows: i32,
    pub corner: DesktopLayoutCorner,
}

impl Default for DesktopLayout {
    fn default() -> Self {
        Self { orientation: Orientation::Horizontal, columns: 0, rows: 1, corner: DesktopLayoutCorner::TopLeft }
    }
}

/// Who issued a request: an application, a pager/taskbar tool or an old client that didn't say
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RequestSource {
    #[default]
    Unknown,
    Application,
    Tool,
}

impl From<RequestSource> for u32 {
    fn from(val: RequestSource) -> Self {
        match val {
            RequestSource::Unknown => 0,
            RequestSource::Application => 1,
            RequestSource::Tool => 2,
        }
    }
}

impl convert::TryFrom<u32> for RequestSource {
    type Error = u32;

    fn try_from(val: u32) -> Result<Self, Self::Error> {
        match val {
            0 => Ok(RequestSource::Unknown),
            1 => Ok(RequestSource::Application),
            2 => Ok(RequestSource::Tool),
            _ => Err(val),
        }
    }
}

/// Direction of an interactive `_NET_WM_MOVERESIZE`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    TopLeft,
    Top,
    TopRight,
    Right,
    BottomRight,
    Bottom,
    BottomLeft,
    Left,
    Move,
    KeyboardSize,
    KeyboardMove,
    Cancel,
}

impl From<Direction> for u32 {
    fn from(val: Direction) -> Self {
        match val {
            Direction::TopLeft => 0,
            Direction::Top => 1,
            Direction::TopRight => 2,
            Direction::Right => 3,
            Direction::BottomRight => 4,
            Direction::Bottom => 5,
            Direction::BottomLeft => 6,
            Direction::Left => 7,
            Direction::Move => 8,
            Direction::KeyboardSize => 9,
            Direction::KeyboardMove => 10,
            Direction::Cancel => 11,
        }
    }
}

impl convert::TryFrom<u32> for Direction {
    type Error = NetwmError;

    fn try_from(val: u32) -> Result<Self, Self::Error> {
        Ok(match val {
            0 => Direction::TopLeft,
            1 => Direction::Top,
            2 => Direction::TopRight,
            3 => Direction::Right,
            4 => Direction::BottomRight,
            5 => Direction::Bottom,
            6 => Direction::BottomLeft,
            7 => Direction::Left,
            8 => Direction::Move,
            9 => Direction::KeyboardSize,
            10 => Direction::KeyboardMove,
            11 => Direction::Cancel,
            _ => return Err(NetwmError::InvalidDirection(val)),
        })
    }
}

bitflags! {
    /// First word of protocol capabilities, also used as a dirty mask
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct Properties: u32 {
        const SUPPORTED              = 1 << 0;
        const CLIENT_LIST            = 1 << 1;
        const CLIENT_LIST_STACKING   = 1 << 2;
        const NUMBER_OF_DESKTOPS     = 1 << 3;
        const DESKTOP_GEOMETRY       = 1 << 4;
        const DESKTOP_VIEWPORT       = 1 << 5;
        const CURRENT_DESKTOP        = 1 << 6;
        const DESKTOP_NAMES          = 1 << 7;
        const ACTIVE_WINDOW          = 1 << 8;
        const WORK_AREA              = 1 << 9;
        const SUPPORTING_WM_CHECK    = 1 << 10;
        const VIRTUAL_ROOTS          = 1 << 11;
        const CLOSE_WINDOW           = 1 << 13;
        const WM_MOVE_RESIZE         = 1 << 14;
        const WM_NAME                = 1 << 15;
        const WM_VISIBLE_NAME        = 1 << 16;
        const WM_DESKTOP             = 1 << 17;
        const WM_WINDOW_TYPE         = 1 << 18;
        const WM_STATE               = 1 << 19;
        const WM_STRUT               = 1 << 20;
        const WM_ICON_GEOMETRY       = 1 << 21;
        const WM_ICON                = 1 << 22;
        const WM_PID                 = 1 << 23;
        const WM_HANDLED_ICONS       = 1 << 24;
        const WM_PING                = 1 << 25;
        const XA_WM_STATE            = 1 << 27;
        const WM_FRAME_EXTENTS       = 1 << 28;
        const WM_ICON_NAME           = 1 << 29;
        const WM_VISIBLE_ICON_NAME   = 1 << 30;
        const WM_GEOMETRY            = 1 << 31;
    }
}

bitflags! {
    /// Second word of protocol capabilities, also used as a dirty mask
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct Properties2: u32 {
        const USER_TIME            = 1 << 0;
        const STARTUP_ID           = 1 << 1;
        const TRANSIENT_FOR        = 1 << 2;
        const GROUP_LEADER         = 1 << 3;
        const ALLOWED_ACTIONS      = 1 << 4;
        const RESTACK_WINDOW       = 1 << 5;
        const MOVE_RESIZE_WINDOW   = 1 << 6;
        const EXTENDED_STRUT       = 1 << 7;
        const TAKE_ACTIVITY        = 1 << 8;
        const KDE_TEMPORARY_RULES  = 1 << 9;
        const WINDOW_CLASS         = 1 << 10;
        const WINDOW_ROLE          = 1 << 11;
        const CLIENT_MACHINE       = 1 << 12;
        const SHOWING_DESKTOP      = 1 << 13;
        const OPACITY              = 1 << 14;
        const DESKTOP_LAYOUT       = 1 << 15;
        const FULL_PLACEMENT       = 1 << 16;
        const FULLSCREEN_MONITORS  = 1 << 17;
        const FRAME_OVERLAP        = 1 << 18;
        const ACTIVITIES           = 1 << 19;
        const BLOCK_COMPOSITING    = 1 << 20;
        const KDE_SHADOW           = 1 << 21;
    }
}

bitflags! {
    /// One bit per window type, used to filter `WinInfo::window_type`
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct WindowTypeMask: u32 {
        const NORMAL         = 1 << 0;
        const DESKTOP        = 1 << 1;
        const DOCK           = 1 << 2;
        const TOOLBAR        = 1 << 3;
        const MENU           = 1 << 4;
        const DIALOG         = 1 << 5;
        const OVERRIDE       = 1 << 6;
        const TOP_MENU       = 1 << 7;
        const UTILITY        = 1 << 8;
        const SPLASH         = 1 << 9;
        const DROPDOWN_MENU  = 1 << 10;
        const POPUP_MENU     = 1 << 11;
        const TOOLTIP        = 1 << 12;
        const NOTIFICATION   = 1 << 13;
        const COMBO_BOX      = 1 << 14;
        const DND_ICON       = 1 << 15;
    }
}

bitflags! {
    /// Window state flags carried by `_NET_WM_STATE`
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct State: u32 {
        const MODAL              = 1 << 0;
        const STICKY             = 1 << 1;
        const MAX_VERT           = 1 << 2;
        const MAX_HORIZ          = 1 << 3;
        const MAX                = Self::MAX_VERT.bits() | Self::MAX_HORIZ.bits();
        const SHADED             = 1 << 4;
        const SKIP_TASKBAR       = 1 << 5;
        const KEEP_ABOVE         = 1 << 6;
        const STAYS_ON_TOP       = Self::KEEP_ABOVE.bits();
        const SKIP_PAGER         = 1 << 7;
        const HIDDEN             = 1 << 8;
        const FULL_SCREEN        = 1 << 9;
        const KEEP_BELOW         = 1 << 10;
        const DEMANDS_ATTENTION  = 1 << 11;
    }
}

// Convert from a single state name such as `sticky` or `above`
impl convert::TryFrom<&str> for State {
    type Error = NetwmError;

    fn try_from(val: &str) -> Result<Self, Self::Error> {
        match val.to_lowercase().as_ref() {
            "modal" => Ok(State::MODAL),
            "sticky" => Ok(State::STICKY),
            "max" | "maximized" => Ok(State::MAX),
            "max-vert" | "maximized-vert" => Ok(State::MAX_VERT),
            "max-horiz" | "maximized-horiz" => Ok(State::MAX_HORIZ),
            "shaded" => Ok(State::SHADED),
            "skip-taskbar" => Ok(State::SKIP_TASKBAR),
            "skip-pager" => Ok(State::SKIP_PAGER),
            "above" | "keep-above" | "stays-on-top" => Ok(State::KEEP_ABOVE),
            "below" | "keep-below" => Ok(State::KEEP_BELOW),
            "hidden" => Ok(State::HIDDEN),
            "fullscreen" => Ok(State::FULL_SCREEN),
            "demands-attention" => Ok(State::DEMANDS_ATTENTION),
            _ => Err(NetwmError::InvalidWinState(val.to_string())),
        }
    }
}

bitflags! {
    /// Operations the window manager allows on a window, `_NET_WM_ALLOWED_ACTIONS`
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct Actions: u32 {
        const MOVE            = 1 << 0;
        const RESIZE          = 1 << 1;
        const MINIMIZE        = 1 << 2;
        const SHADE           = 1 << 3;
        const STICK           = 1 << 4;
        const MAX_VERT        = 1 << 5;
        const MAX_HORIZ       = 1 << 6;
        const FULL_SCREEN     = 1 << 7;
        const CHANGE_DESKTOP  = 1 << 8;
        const CLOSE           = 1 << 9;
    }
}

/// PropertySet pairs the two protocol words; it serves as interest set and dirty mask
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PropertySet {
    pub properties: Properties,
    pub properties2: Properties2,
}

impl PropertySet {
    pub fn new(properties: Properties, properties2: Properties2) -> Self {
        Self { properties, properties2 }
    }

    pub fn all() -> Self {
        Self { properties: Properties::all(), properties2: Properties2::all() }
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty() && self.properties2.is_empty()
    }

    pub fn intersection(self, other: PropertySet) -> Self {
        Self {
            properties: self.properties & other.properties,
            properties2: self.properties2 & other.properties2,
        }
    }
}

impl From<Properties> for PropertySet {
    fn from(val: Properties) -> Self {
        Self::new(val, Properties2::empty())
    }
}

impl From<Properties2> for PropertySet {
    fn from(val: Properties2) -> Self {
        Self::new(Properties::empty(), val)
    }
}

impl ops::BitOr for PropertySet {
    type Output = PropertySet;

    fn bitor(self, rhs: PropertySet) -> PropertySet {
        Self {
            properties: self.properties | rhs.properties,
            properties2: self.properties2 | rhs.properties2,
        }
    }
}

impl ops::BitOrAssign for PropertySet {
    fn bitor_assign(&mut self, rhs: PropertySet) {
        *self = *self | rhs;
    }
}

/// Capabilities is the full five word capability bitmap advertised through `_NET_SUPPORTED`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Capabilities {
    pub properties: Properties,
    pub properties2: Properties2,
    pub window_types: WindowTypeMask,
    pub states: State,
    pub actions: Actions,
}

impl Capabilities {
    /// Capabilities a window manager advertises when it does not say otherwise
    pub fn window_manager_defaults() -> Self {
        Self {
            properties: Properties::SUPPORTED | Properties::SUPPORTING_WM_CHECK,
            window_types: WindowTypeMask::NORMAL
                | WindowTypeMask::DESKTOP
                | WindowTypeMask::DOCK
                | WindowTypeMask::TOOLBAR
                | WindowTypeMask::MENU
                | WindowTypeMask::DIALOG,
            states: State::MODAL
                | State::STICKY
                | State::MAX
                | State::SHADED
                | State::SKIP_TASKBAR
                | State::KEEP_ABOVE,
            ..Default::default()
        }
    }

    /// The two property words of the bitmap
    pub fn property_set(&self) -> PropertySet {
        PropertySet::new(self.properties, self.properties2)
    }

    pub fn supports(&self, feature: impl Into<Feature>) -> bool {
        match feature.into() {
            Feature::Property(x) => self.properties.contains(x),
            Feature::Property2(x) => self.properties2.contains(x),
            Feature::WindowType(x) => self.window_types.contains(x),
            Feature::State(x) => self.states.contains(x),
            Feature::Action(x) => self.actions.contains(x),
        }
    }

    pub(crate) fn set(&mut self, feature: impl Into<Feature>, on: bool) {
        match feature.into() {
            Feature::Property(x) => self.properties.set(x, on),
            Feature::Property2(x) => self.properties2.set(x, on),
            Feature::WindowType(x) => self.window_types.set(x, on),
            Feature::State(x) => self.states.set(x, on),
            Feature::Action(x) => self.actions.set(x, on),
        }
    }
}

/// Feature names a single bit in any of the capability words
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    Property(Properties),
    Property2(Properties2),
    WindowType(WindowTypeMask),
    State(State),
    Action(Actions),
}

impl From<Properties> for Feature {
    fn from(val: Properties) -> Self {
        Feature::Property(val)
    }
}

impl From<Properties2> for Feature {
    fn from(val: Properties2) -> Self {
        Feature::Property2(val)
    }
}

impl From<WindowTypeMask> for Feature {
    fn from(val: WindowTypeMask) -> Self {
        Feature::WindowType(val)
    }
}

impl From<WindowType> for Feature {
    fn from(val: WindowType) -> Self {
        Feature::WindowType(val.mask())
    }
}

impl From<State> for Feature {
    fn from(val: State) -> Self {
        Feature::State(val)
    }
}

impl From<Actions> for Feature {
    fn from(val: Actions) -> Self {
        Feature::Action(val)
    }
}
