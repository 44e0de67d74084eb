//! Window-pick protocol
//!
//! One click resolves to the root window under the pointer, unless that
//! window is a shell surface or one of ours.

use log::{debug, info};

use super::{OverlayInput, Resolution};
use crate::capture::{Point, WindowHandle, WindowLocator};

/// Guards against runaway parent chains.
const MAX_ANCESTRY_DEPTH: usize = 64;

/// Decides which root windows may not be captured.
#[derive(Debug, Clone)]
pub struct WindowFilter {
    shell_classes: Vec<String>,
    app_name: String,
}

impl WindowFilter {
    pub fn new<I, S>(app_name: impl Into<String>, shell_classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            shell_classes: shell_classes
                .into_iter()
                .map(|c| c.as_ref().to_lowercase())
                .collect(),
            app_name: app_name.into(),
        }
    }

    pub fn rejects(&self, class_name: &str, title: &str) -> bool {
        let class_name = class_name.to_lowercase();
        self.shell_classes.iter().any(|c| *c == class_name)
            || (!self.app_name.is_empty() && title.contains(&self.app_name))
    }
}

/// Walk up from a child control to its top-level window.
pub fn root_ancestor(locator: &dyn WindowLocator, handle: WindowHandle) -> WindowHandle {
    let mut current = handle;
    for _ in 0..MAX_ANCESTRY_DEPTH {
        match locator.parent(current) {
            Some(parent) if parent != current => current = parent,
            _ => break,
        }
    }
    current
}

/// Resolve a desktop-global click point to a capturable root window.
pub fn resolve_click(
    locator: &dyn WindowLocator,
    filter: &WindowFilter,
    point: Point,
) -> Resolution<WindowHandle> {
    let Some(hit) = locator.window_at(point) else {
        debug!("No window at ({}, {})", point.x, point.y);
        return Resolution::Cancelled;
    };

    let root = root_ancestor(locator, hit);
    let class_name = locator.class_name(root);
    let title = locator.title(root);

    if filter.rejects(&class_name, &title) {
        info!(
            "Ignoring window {} (class '{}', title '{}')",
            root, class_name, title
        );
        return Resolution::Cancelled;
    }

    debug!("Picked window {} '{}'", root, title);
    Resolution::Resolved(root)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PickState {
    Idle,
    Resolved(WindowHandle),
    Cancelled,
}

impl PickState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PickState::Idle)
    }

    pub fn advance(
        self,
        input: OverlayInput,
        origin: Point,
        locator: &dyn WindowLocator,
        filter: &WindowFilter,
    ) -> PickState {
        match (self, input) {
            (PickState::Idle, OverlayInput::Cancel) => PickState::Cancelled,
            (PickState::Idle, OverlayInput::PrimaryDown(p)) => {
                match resolve_click(locator, filter, p.offset(origin)) {
                    Resolution::Resolved(handle) => PickState::Resolved(handle),
                    Resolution::Cancelled => PickState::Cancelled,
                }
            }
            (state, _) => state,
        }
    }

    pub fn resolution(&self) -> Resolution<WindowHandle> {
        match self {
            PickState::Resolved(handle) => Resolution::Resolved(*handle),
            _ => Resolution::Cancelled,
        }
    }
}
