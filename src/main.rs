//! `netwm` drives the [Extended Window Manager Hints (EWMH) specification](https://specifications.freedesktop.org/wm-spec/latest/)
//! from the client side using `libnetwm`. It reads the desktop state an EWMH compatible window
//! manager publishes and asks the window manager for changes the same way a pager or taskbar
//! would, which makes it handy both from scripts and for debugging window managers.
//!
//! ## Command line examples
//!
//! ### Switch desktops
//! Switch to the second desktop.
//! ```bash
//! netwm desktop switch 2
//! ```
//!
//! ### Toggle a window state
//! Make the active window stay above all others, running the command again reverts it.
//! ```bash
//! netwm window state toggle above
//! ```
//!
//! ### Watch protocol traffic
//! Print root window changes as they happen, with protocol debug logging.
//! ```bash
//! netwm -vv watch
//! ```
use std::{process::ExitCode, sync::Arc};

use clap::{crate_description, crate_version, value_parser, Arg, ArgAction, ArgMatches, Command};
use libnetwm::prelude::*;
use tracing::{debug, Level};
use tracing_subscriber::EnvFilter;

type Conn = Arc<NetConnection<X11Transport>>;

// Timestamp meaning "now" in requests
const CURRENT_TIME: Timestamp = 0;

fn cli() -> Command {
    let window = Arg::new("window")
        .short('w')
        .long("window")
        .value_name("ID")
        .value_parser(parse_window)
        .help("Window to use, decimal or 0x prefixed hex, defaults to the active window");

    Command::new("netwm")
        .about(crate_description!())
        .subcommand_required(true)
        .arg_required_else_help(true)
        .version(crate_version!())
        .arg(Arg::new("display").long("display").value_name("DISPLAY").global(true).help("X display to connect to"))
        .arg(
            Arg::new("screen")
                .long("screen")
                .value_name("NUM")
                .value_parser(value_parser!(usize))
                .global(true)
                .help("Screen number, defaults to the display's default screen"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .action(ArgAction::Count)
                .global(true)
                .help("Log more, repeat for info, debug and trace"),
        )
        .subcommand(Command::new("info").visible_alias("i").about("Show the window manager and desktop state"))
        .subcommand(
            Command::new("desktop")
                .visible_alias("d")
                .about("Manage desktops (also known as workspaces)")
                .subcommand_required(true)
                .arg_required_else_help(true)
                .subcommand(Command::new("list").visible_alias("l").about("List all desktops"))
                .subcommand(
                    Command::new("switch")
                        .visible_alias("s")
                        .about("Switch to a desktop")
                        .arg(Arg::new("DESKTOP").required(true).value_parser(value_parser!(i32)).help("Desktop from 1")),
                )
                .subcommand(
                    Command::new("count")
                        .visible_alias("c")
                        .about("Show or change the number of desktops")
                        .arg(Arg::new("COUNT").value_parser(value_parser!(i32))),
                )
                .subcommand(
                    Command::new("name")
                        .visible_alias("n")
                        .about("Show or change the name of a desktop")
                        .arg(Arg::new("DESKTOP").required(true).value_parser(value_parser!(i32)).help("Desktop from 1"))
                        .arg(Arg::new("NAME")),
                ),
        )
        .subcommand(
            Command::new("window")
                .visible_alias("w")
                .about("Control individual windows")
                .subcommand_required(true)
                .arg_required_else_help(true)
                .subcommand(Command::new("list").visible_alias("l").about("List out all managed windows"))
                .subcommand(Command::new("info").visible_alias("i").about("Show everything known about a window").arg(window.clone()))
                .subcommand(
                    Command::new("state")
                        .visible_alias("s")
                        .about("Add, remove or toggle a window state")
                        .arg(window.clone())
                        .arg(Arg::new("ACTION").required(true).value_parser(["add", "remove", "toggle"]))
                        .arg(
                            Arg::new("STATE")
                                .required(true)
                                .value_parser(|x: &str| State::try_from(x).map_err(|e| e.to_string()))
                                .help("e.g. sticky, above, below, shaded, fullscreen, max, skip-taskbar"),
                        ),
                )
                .subcommand(
                    Command::new("desktop")
                        .visible_alias("d")
                        .about("Move a window to a desktop")
                        .arg(window.clone())
                        .arg(Arg::new("DESKTOP").required(true).value_parser(parse_desktop).help("Desktop from 1 or 'all'")),
                )
                .subcommand(Command::new("close").visible_alias("c").about("Close a window").arg(window.clone()))
                .subcommand(Command::new("activate").visible_alias("a").about("Activate a window").arg(window)),
        )
        .subcommand(Command::new("watch").about("Print root window changes as they happen"))
}

fn parse_window(val: &str) -> Result<Window, String> {
    let parsed = match val.strip_prefix("0x") {
        Some(hex) => Window::from_str_radix(hex, 16),
        None => val.parse::<Window>(),
    };
    parsed.map_err(|e| format!("invalid window id {}: {}", val, e))
}

fn parse_desktop(val: &str) -> Result<i32, String> {
    match val {
        "all" => Ok(ON_ALL_DESKTOPS),
        _ => val.parse::<i32>().map_err(|e| e.to_string()),
    }
}

fn init_logging(verbose: u8) {
    if let Ok(env_filter) = EnvFilter::try_from_default_env() {
        tracing_subscriber::fmt().with_env_filter(env_filter).with_writer(std::io::stderr).init();
        return;
    }
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt().with_max_level(level).with_writer(std::io::stderr).init();
}

fn main() -> ExitCode {
    let matches = cli().get_matches();
    init_logging(matches.get_count("verbose"));
    match run(&matches) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("netwm: {}", err);
            ExitCode::FAILURE
        },
    }
}

fn run(matches: &ArgMatches) -> NetwmResult<()> {
    let display = matches.get_one::<String>("display").map(|x| x.as_str());
    let screen = matches.get_one::<usize>("screen").copied();
    let conn: Conn = Arc::new(NetConnection::new(X11Transport::connect(display)?));
    let mut root = RootInfo::client(conn.clone(), PropertySet::all(), screen, true)?;

    match matches.subcommand() {
        Some(("info", _)) => info(&root),
        Some(("desktop", sub)) => match sub.subcommand() {
            Some(("list", _)) => desktop_list(&root),
            Some(("switch", args)) => root.set_current_desktop(desktop_arg(args), false),
            Some(("count", args)) => match args.get_one::<i32>("COUNT") {
                Some(count) => root.set_number_of_desktops(*count),
                None => {
                    println!("{}", root.number_of_desktops(false));
                    Ok(())
                },
            },
            Some(("name", args)) => match args.get_one::<String>("NAME") {
                Some(name) => root.set_desktop_name(desktop_arg(args), name),
                None => {
                    println!("{}", root.desktop_name(desktop_arg(args)).unwrap_or_default());
                    Ok(())
                },
            },
            _ => unreachable!(),
        },
        Some(("window", sub)) => window(&conn, &mut root, sub),
        Some(("watch", _)) => watch(&conn, &mut root),
        _ => unreachable!(),
    }
}

fn desktop_arg(args: &ArgMatches) -> i32 {
    args.get_one::<i32>("DESKTOP").copied().unwrap_or_default()
}

fn info(root: &RootInfo<X11Transport>) -> NetwmResult<()> {
    let current = root.current_desktop(false);
    let area = root.work_area(current);
    let layout = root.desktop_layout();
    println!("X11 Information");
    println!("-----------------------------------------------------------------------");
    println!("Window Manager:    {}", root.wm_name());
    println!("Support Window:    {}", root.support_window());
    println!("Root Window:       {}", root.root_window());
    println!("Screen:            {}", root.screen_number());
    println!("Desktop Size:      {}x{}", root.desktop_geometry().width, root.desktop_geometry().height);
    println!("Work area:         {}", area);
    println!("Desktops:          {}", root.number_of_desktops(false));
    println!("Current Desktop:   {}", current);
    println!("Layout:            {:?} {}x{} {:?}", layout.orientation, layout.columns, layout.rows, layout.corner);
    println!("Showing Desktop:   {}", root.showing_desktop());
    println!("Active Window:     {}", root.active_window());
    println!("Managed Windows:   {}", root.client_list().len());
    println!("Supported:         {:?}", root.supported_properties().property_set());
    Ok(())
}

fn desktop_list(root: &RootInfo<X11Transport>) -> NetwmResult<()> {
    let current = root.current_desktop(false);
    for desktop in 1..=root.number_of_desktops(false) {
        let marker = if desktop == current { '*' } else { ' ' };
        println!("{} {:>2} {}", marker, desktop, root.desktop_name(desktop).unwrap_or_default());
    }
    Ok(())
}

fn target_window(root: &RootInfo<X11Transport>, args: &ArgMatches) -> Window {
    args.get_one::<Window>("window").copied().unwrap_or_else(|| root.active_window())
}

fn window(conn: &Conn, root: &mut RootInfo<X11Transport>, sub: &ArgMatches) -> NetwmResult<()> {
    let interest = PropertySet::all();
    match sub.subcommand() {
        Some(("list", _)) => {
            println!("{:<10} {:<3} {:<7} {:<13} {:<20} {}", "ID", "DSK", "PID", "TYPE", "CLASS", "NAME");
            for win in root.client_list() {
                let info = WinInfo::new(conn.clone(), *win, root.root_window(), Role::Client, interest)?;
                let desktop = match info.desktop(true) {
                    ON_ALL_DESKTOPS => "*".to_string(),
                    x => x.to_string(),
                };
                println!(
                    "{:<10} {:<3} {:<7} {:<13} {:<20} {}",
                    format!("{:#x}", win),
                    desktop,
                    info.pid(),
                    info.window_type(WindowTypeMask::all()).to_string(),
                    info.window_class_class(),
                    info.name()
                );
            }
            Ok(())
        },
        Some(("info", args)) => {
            let mut info = WinInfo::new(conn.clone(), target_window(root, args), root.root_window(), Role::Client, interest)?;
            window_info(&mut info)
        },
        Some(("state", args)) => {
            let mut info = WinInfo::new(conn.clone(), target_window(root, args), root.root_window(), Role::Client, interest)?;
            let state = args.get_one::<State>("STATE").copied().unwrap_or_default();
            let wanted = match args.get_one::<String>("ACTION").map(|x| x.as_str()) {
                Some("add") => state,
                Some("toggle") if !info.state().contains(state) => state,
                _ => State::empty(),
            };
            debug!("window state: window: {}, state: {:?}, wanted: {:?}", info.window(), state, wanted);
            info.set_state(wanted, state)
        },
        Some(("desktop", args)) => {
            let mut info = WinInfo::new(conn.clone(), target_window(root, args), root.root_window(), Role::Client, interest)?;
            info.set_desktop(desktop_arg(args), false)
        },
        Some(("close", args)) => root.close_window_request(target_window(root, args)),
        Some(("activate", args)) => {
            let (target, active) = (target_window(root, args), root.active_window());
            root.set_active_window(target, RequestSource::Tool, CURRENT_TIME, active)
        },
        _ => unreachable!(),
    }
}

fn window_info(info: &mut WinInfo<X11Transport>) -> NetwmResult<()> {
    let (frame, geometry) = info.kde_geometry()?;
    let ext = info.frame_extents();
    println!("Window:            {:#x}", info.window());
    println!("Name:              {}", info.name());
    println!("Visible Name:      {}", info.visible_name());
    println!("Icon Name:         {}", info.icon_name());
    println!("Class:             {} ({})", info.window_class_class(), info.window_class_name());
    println!("Role:              {}", info.window_role());
    println!("Machine:           {}", info.client_machine());
    println!("PID:               {}", info.pid());
    println!("Mapping State:     {}", info.mapping_state());
    println!("Desktop:           {}", info.desktop(false));
    println!("Types:             {:?}", info.window_types());
    println!("State:             {:?}", info.state());
    println!("Allowed Actions:   {:?}", info.allowed_actions());
    println!("Geometry:          {}", geometry);
    println!("Frame:             {}", frame);
    println!("Frame Extents:     {},{},{},{}", ext.left, ext.right, ext.top, ext.bottom);
    println!("Strut:             {:?}", info.strut());
    println!("Icons:             {:?}", info.icon_sizes());
    println!("Opacity:           {:#010x}", info.opacity());
    println!("Transient For:     {:#x}", info.transient_for());
    println!("Group Leader:      {:#x}", info.group_leader());
    println!("User Time:         {}", info.user_time());
    println!("Startup ID:        {}", info.startup_id());
    Ok(())
}

fn watch(conn: &Conn, root: &mut RootInfo<X11Transport>) -> NetwmResult<()> {
    let transport = conn.transport();
    transport.select_events(root.root_window())?;
    println!("watching root window {:#x}, interrupt to stop", root.root_window());
    loop {
        let event = transport.next_event()?;
        let dirty = root.event(&event)?;
        if dirty.is_empty() {
            continue;
        }
        root.update(dirty)?;

        if dirty.properties.contains(Properties::CURRENT_DESKTOP) {
            println!("current desktop: {}", root.current_desktop(false));
        }
        if dirty.properties.contains(Properties::NUMBER_OF_DESKTOPS) {
            println!("desktops: {}", root.number_of_desktops(false));
        }
        if dirty.properties.contains(Properties::DESKTOP_NAMES) {
            let names: Vec<&str> =
                (1..=root.number_of_desktops(false)).map(|x| root.desktop_name(x).unwrap_or_default()).collect();
            println!("desktop names: {:?}", names);
        }
        if dirty.properties.contains(Properties::ACTIVE_WINDOW) {
            println!("active window: {:#x}", root.active_window());
        }
        if dirty.properties.contains(Properties::CLIENT_LIST) {
            let diff = root.client_list_diff();
            for win in &diff.added {
                println!("window added: {:#x}", win);
            }
            for win in &diff.removed {
                println!("window removed: {:#x}", win);
            }
        }
        if dirty.properties2.contains(Properties2::SHOWING_DESKTOP) {
            println!("showing desktop: {}", root.showing_desktop());
        }
        if dirty.properties.contains(Properties::SUPPORTING_WM_CHECK) {
            println!("window manager: {}", root.wm_name());
        }
    }
}
