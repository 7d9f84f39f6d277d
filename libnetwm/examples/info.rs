use std::sync::Arc;

use libnetwm::prelude::*;

fn main() -> NetwmResult<()> {
    let conn = Arc::new(NetConnection::new(X11Transport::connect(None)?));
    let root = RootInfo::client(conn.clone(), PropertySet::all(), None, true)?;
    let desktops = root.number_of_desktops(true);
    let area = root.work_area(root.current_desktop(true));
    println!("X11 Information");
    println!("-----------------------------------------------------------------------");
    println!("Window Manager:    {}", root.wm_name());
    println!("Root Window:       {}", root.root_window());
    println!("Work area:         {}x{}", area.size.width, area.size.height);
    println!("Desktop Size:      {}x{}", root.desktop_geometry().width, root.desktop_geometry().height);
    println!("Desktops:          {}", desktops);
    for desktop in 1..=desktops {
        println!("  {:>2} {}", desktop, root.desktop_name(desktop).unwrap_or(""));
    }
    println!();
    println!("Active Window");
    println!("{:-<120}", "");

    println!("{:<8} {:<3} {:<6} {:<20} {:<11} {:<7} {:<18} {:<18} {}", "ID", "DSK", "PID", "GEOMETRY", "BORDERS", "TYPE", "STATE", "CLASS", "NAME");

    let win = root.active_window();
    if win == NONE {
        return Ok(());
    }
    let mut info = WinInfo::new(conn, win, root.root_window(), Role::Client, PropertySet::all())?;
    let (_, geometry) = info.kde_geometry()?;
    let ext = info.frame_extents();
    println!("{:<8} {:<3} {:<6} {:<20} {:<11} {:<7} {:<18} {:<18} {}",
        format!("{:0>8}", win), format!("{:>2}", info.desktop(true)), info.pid(),
        geometry.to_string(),
        format!("{},{},{},{}", ext.left, ext.right, ext.top, ext.bottom),
        info.window_type(WindowTypeMask::all()).to_string(), format!("{:?}", info.state()),
        info.window_class_class(), info.name());
    Ok(())
}
