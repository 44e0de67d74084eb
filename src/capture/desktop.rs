use std::env;
use std::process::Command;

/// Window classes of desktop/shell surfaces on every platform we know of.
pub const BUILTIN_SHELL_CLASSES: &[&str] = &[
    "shell_traywnd",
    "progman",
    "workerw",
    "gnome-shell",
    "plasmashell",
    "xfce4-panel",
    "xfdesktop",
    "nautilus-desktop",
    "desktop_window",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayServer {
    Wayland,
    X11,
    Unknown,
}

impl std::fmt::Display for DisplayServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DisplayServer::Wayland => write!(f, "Wayland"),
            DisplayServer::X11 => write!(f, "X11"),
            DisplayServer::Unknown => write!(f, "Unknown"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DesktopEnvironment {
    Gnome,
    Kde,
    Hyprland,
    Sway,
    Cinnamon,
    Xfce,
    Mate,
    Other(Option<String>),
}

impl std::fmt::Display for DesktopEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DesktopEnvironment::Gnome => write!(f, "GNOME"),
            DesktopEnvironment::Kde => write!(f, "KDE Plasma"),
            DesktopEnvironment::Hyprland => write!(f, "Hyprland"),
            DesktopEnvironment::Sway => write!(f, "Sway"),
            DesktopEnvironment::Cinnamon => write!(f, "Cinnamon"),
            DesktopEnvironment::Xfce => write!(f, "XFCE"),
            DesktopEnvironment::Mate => write!(f, "MATE"),
            DesktopEnvironment::Other(Some(name)) => write!(f, "{}", name),
            DesktopEnvironment::Other(None) => write!(f, "Unknown"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DesktopSession {
    pub display_server: DisplayServer,
    pub desktop_environment: DesktopEnvironment,
}

impl DesktopSession {
    pub fn detect() -> Self {
        let display_server = detect_display_server();
        let desktop_environment = detect_desktop_environment(&display_server);

        Self {
            display_server,
            desktop_environment,
        }
    }

    pub fn is_wayland(&self) -> bool {
        self.display_server == DisplayServer::Wayland
    }

    /// Shell surfaces specific to this desktop, on top of the built-in list.
    pub fn shell_window_classes(&self) -> &'static [&'static str] {
        match self.desktop_environment {
            DesktopEnvironment::Gnome => &["gnome-shell", "gjs", "org.gnome.shell.extensions"],
            DesktopEnvironment::Kde => &["plasmashell", "krunner", "latte-dock"],
            DesktopEnvironment::Hyprland => &["waybar", "hyprpaper"],
            DesktopEnvironment::Sway => &["waybar", "swaybg", "swaybar"],
            DesktopEnvironment::Cinnamon => &["cinnamon", "nemo-desktop"],
            DesktopEnvironment::Xfce => &["xfce4-panel", "xfdesktop"],
            DesktopEnvironment::Mate => &["mate-panel", "caja"],
            DesktopEnvironment::Other(_) => &[],
        }
    }

    /// Built-in list, this desktop's shells and any configured extras.
    pub fn filtered_classes(&self, extra: &[String]) -> Vec<String> {
        let mut classes: Vec<String> = BUILTIN_SHELL_CLASSES
            .iter()
            .chain(self.shell_window_classes())
            .map(|c| c.to_string())
            .chain(extra.iter().map(|c| c.to_lowercase()))
            .collect();
        classes.sort();
        classes.dedup();
        classes
    }
}

impl std::fmt::Display for DesktopSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} on {}", self.desktop_environment, self.display_server)
    }
}

fn detect_display_server() -> DisplayServer {
    if let Ok(session_type) = env::var("XDG_SESSION_TYPE") {
        match session_type.to_lowercase().as_str() {
            "wayland" => return DisplayServer::Wayland,
            "x11" => return DisplayServer::X11,
            _ => {}
        }
    }

    if env::var("WAYLAND_DISPLAY").is_ok() {
        return DisplayServer::Wayland;
    }

    if env::var("DISPLAY").is_ok() {
        return DisplayServer::X11;
    }

    DisplayServer::Unknown
}

fn detect_desktop_environment(display_server: &DisplayServer) -> DesktopEnvironment {
    if env::var("HYPRLAND_INSTANCE_SIGNATURE").is_ok() {
        return DesktopEnvironment::Hyprland;
    }

    if env::var("SWAYSOCK").is_ok() {
        return DesktopEnvironment::Sway;
    }

    if let Ok(current_desktop) = env::var("XDG_CURRENT_DESKTOP") {
        if let Some(de) = parse_current_desktop(&current_desktop) {
            return de;
        }
    }

    if let Ok(desktop_session) = env::var("DESKTOP_SESSION") {
        let session_lower = desktop_session.to_lowercase();

        if session_lower.contains("gnome") {
            return DesktopEnvironment::Gnome;
        } else if session_lower.contains("plasma") || session_lower.contains("kde") {
            return DesktopEnvironment::Kde;
        } else if session_lower.contains("cinnamon") {
            return DesktopEnvironment::Cinnamon;
        } else if session_lower.contains("xfce") {
            return DesktopEnvironment::Xfce;
        } else if session_lower.contains("mate") {
            return DesktopEnvironment::Mate;
        }
    }

    if env::var("KDE_FULL_SESSION").is_ok() {
        return DesktopEnvironment::Kde;
    }

    if env::var("GNOME_DESKTOP_SESSION_ID").is_ok() {
        return DesktopEnvironment::Gnome;
    }

    if *display_server == DisplayServer::Wayland && is_hyprland_running() {
        return DesktopEnvironment::Hyprland;
    }

    DesktopEnvironment::Other(None)
}

/// Map an `XDG_CURRENT_DESKTOP` value (colon separated) to a desktop.
fn parse_current_desktop(current_desktop: &str) -> Option<DesktopEnvironment> {
    let desktop_lower = current_desktop.to_lowercase();

    for component in desktop_lower.split(':') {
        let de = match component.trim() {
            "gnome" | "unity" | "ubuntu" | "pop" => DesktopEnvironment::Gnome,
            "kde" | "plasma" | "kde-plasma" => DesktopEnvironment::Kde,
            "hyprland" => DesktopEnvironment::Hyprland,
            "sway" => DesktopEnvironment::Sway,
            "cinnamon" | "x-cinnamon" => DesktopEnvironment::Cinnamon,
            "xfce" | "xfce4" => DesktopEnvironment::Xfce,
            "mate" => DesktopEnvironment::Mate,
            _ => continue,
        };
        return Some(de);
    }

    (!current_desktop.is_empty())
        .then(|| DesktopEnvironment::Other(Some(current_desktop.to_string())))
}

fn is_hyprland_running() -> bool {
    Command::new("hyprctl")
        .arg("version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_current_desktop() {
        assert_eq!(
            parse_current_desktop("ubuntu:GNOME"),
            Some(DesktopEnvironment::Gnome)
        );
        assert_eq!(parse_current_desktop("KDE"), Some(DesktopEnvironment::Kde));
        assert_eq!(
            parse_current_desktop("Budgie"),
            Some(DesktopEnvironment::Other(Some("Budgie".to_string())))
        );
        assert_eq!(parse_current_desktop(""), None);
    }

    #[test]
    fn test_filtered_classes_merge_and_dedup() {
        let session = DesktopSession {
            display_server: DisplayServer::X11,
            desktop_environment: DesktopEnvironment::Xfce,
        };
        let classes = session.filtered_classes(&["Conky".to_string()]);

        assert!(classes.contains(&"progman".to_string()));
        assert!(classes.contains(&"conky".to_string()));
        assert_eq!(classes.iter().filter(|c| *c == "xfdesktop").count(), 1);
    }

    #[test]
    fn test_session_display() {
        let session = DesktopSession {
            display_server: DisplayServer::Wayland,
            desktop_environment: DesktopEnvironment::Gnome,
        };
        assert_eq!(session.to_string(), "GNOME on Wayland");
        assert!(session.is_wayland());
    }
}
