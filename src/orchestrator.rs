//! Capture orchestration
//!
//! hide panel → resolve rectangle → grab → name → save PNG → enqueue → show
//! panel. The panel comes back on every path through `PanelGuard`.

use log::{error, info};
use std::rc::Rc;
use std::time::Duration;

use crate::app::{AppConfig, AssemblyConfig, CaptureMode, Session, Severity, StatusMessage};
use crate::capture::{
    CaptureBackend, CaptureRequest, CapturedImage, FrameGrabber, GeometryProvider, Rect,
    WindowLocator,
};
use crate::document::{AssemblerError, DocumentAssembler, SavedShot};
use crate::naming;
use crate::overlay::{OverlayController, OverlayHost, Resolution, WindowFilter};

/// Asks the operator what to call a shot. `None` means cancelled.
pub trait NamePrompt {
    fn request_name(&self, shot: &CapturedImage) -> Option<String>;
}

/// The interactive control surface that must stay out of the frame.
pub trait PanelVisibility {
    /// Hide and wait until the window system has processed it.
    fn hide(&self);
    fn show(&self);
}

/// Keeps the panel hidden for as long as it lives.
pub struct PanelGuard {
    panel: Rc<dyn PanelVisibility>,
}

impl PanelGuard {
    pub fn hide(panel: Rc<dyn PanelVisibility>, settle: Duration) -> Self {
        panel.hide();
        if !settle.is_zero() {
            std::thread::sleep(settle);
        }
        Self { panel }
    }
}

impl Drop for PanelGuard {
    fn drop(&mut self) {
        self.panel.show();
    }
}

/// Platform collaborators the orchestrator drives.
pub struct Platform {
    pub geometry: Rc<dyn GeometryProvider>,
    pub backend: Rc<dyn CaptureBackend>,
    pub locator: Rc<dyn WindowLocator>,
    pub overlay_host: Rc<dyn OverlayHost>,
    pub prompt: Rc<dyn NamePrompt>,
    pub panel: Rc<dyn PanelVisibility>,
}

pub struct CaptureOrchestrator {
    geometry: Rc<dyn GeometryProvider>,
    grabber: FrameGrabber,
    overlay: OverlayController,
    prompt: Rc<dyn NamePrompt>,
    panel: Rc<dyn PanelVisibility>,
    settle_delay: Duration,
    assembly: AssemblyConfig,
    session: Session,
    assembler: DocumentAssembler,
    /// Closed assemblers still finishing their final save
    retired: Vec<DocumentAssembler>,
    accepted: u64,
}

impl CaptureOrchestrator {
    /// Start the session's document worker and queue its initialisation.
    pub fn new(
        platform: Platform,
        filter: WindowFilter,
        config: &AppConfig,
        session: Session,
    ) -> Result<Self, AssemblerError> {
        let assembler = DocumentAssembler::start(&session, &config.assembly)?;
        assembler.init();
        info!("Project '{}' at {:?}", session.project_name, session.project_dir);

        Ok(Self {
            geometry: platform.geometry,
            grabber: FrameGrabber::new(platform.backend),
            overlay: OverlayController::new(
                platform.overlay_host,
                platform.locator,
                filter,
                config.capture.min_region_size,
            ),
            prompt: platform.prompt,
            panel: platform.panel,
            settle_delay: config.capture.settle_delay(),
            assembly: config.assembly.clone(),
            session,
            assembler,
            retired: Vec::new(),
            accepted: 0,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn shots_taken(&self) -> u64 {
        self.accepted
    }

    /// Run one capture end to end. Never fails; every outcome is a status.
    pub fn capture(&mut self, mode: CaptureMode) -> StatusMessage {
        info!("Starting {} capture", mode);
        let status = {
            let _hidden = PanelGuard::hide(self.panel.clone(), self.settle_delay);
            self.run_capture(mode)
        };

        match status.severity {
            Severity::Error => error!("{} capture: {}", mode, status),
            _ => info!("{} capture: {}", mode, status),
        }
        status
    }

    fn run_capture(&mut self, mode: CaptureMode) -> StatusMessage {
        let Some(request) = self.resolve(mode) else {
            return StatusMessage::info(mode.cancelled_message());
        };

        match self.grabber.grab(&request) {
            Ok(captured) => self.name_and_store(captured),
            Err(e) => StatusMessage::error(format!("Capture failed: {}", e)),
        }
    }

    /// `None` for a cancelled gesture or a degenerate rectangle.
    fn resolve(&self, mode: CaptureMode) -> Option<CaptureRequest> {
        let rect = match mode {
            CaptureMode::Monitor => self.geometry.work_area_under_cursor(),
            CaptureMode::Window => {
                match self.overlay.pick_window(self.overlay_bounds()) {
                    Resolution::Resolved(handle) => self.geometry.window_bounds(handle).at_least(1),
                    Resolution::Cancelled => return None,
                }
            }
            CaptureMode::Region => {
                match self.overlay.select_region(self.overlay_bounds()) {
                    Resolution::Resolved(rect) => rect,
                    Resolution::Cancelled => return None,
                }
            }
        };
        CaptureRequest::new(rect, mode)
    }

    /// The monitor under the pointer, or the whole desktop if that is unknown.
    fn overlay_bounds(&self) -> Rect {
        let monitor = self.geometry.monitor_under_cursor();
        if monitor.is_degenerate() {
            self.geometry.virtual_desktop_bounds()
        } else {
            monitor
        }
    }

    fn name_and_store(&mut self, captured: CapturedImage) -> StatusMessage {
        let Some(name) = self.prompt.request_name(&captured) else {
            return StatusMessage::info("Save cancelled.");
        };

        let stored = match naming::save_shot(&self.session.project_dir, &name, &captured.image) {
            Ok(stored) => stored,
            Err(e) => return StatusMessage::error(format!("Capture failed: {}", e)),
        };

        self.accepted += 1;
        self.assembler.append(SavedShot {
            path: stored.path.clone(),
            caption: format!("{} ({})", stored.stem, captured.mode),
            sequence: self.accepted,
        });
        self.assembler.save();

        StatusMessage::success(format!("Saved: {}", stored.file_name()))
    }

    /// Queue a save of both artifacts.
    pub fn save_now(&self) -> StatusMessage {
        self.assembler.save();
        StatusMessage::success("Saving slide deck and document.")
    }

    /// Close the current project's worker and start a fresh one for `session`.
    pub fn switch_project(&mut self, session: Session) -> Result<StatusMessage, AssemblerError> {
        let next = DocumentAssembler::start(&session, &self.assembly)?;
        next.init();

        let (finished, running): (Vec<_>, Vec<_>) = std::mem::take(&mut self.retired)
            .into_iter()
            .partition(DocumentAssembler::is_finished);
        for old in finished {
            old.shutdown();
        }
        self.retired = running;

        let previous = std::mem::replace(&mut self.assembler, next);
        previous.close();
        self.retired.push(previous);

        info!(
            "Switched from '{}' to '{}'",
            self.session.project_name, session.project_name
        );
        self.session = session;
        self.accepted = 0;
        Ok(StatusMessage::success("Project changed."))
    }

    /// Close every worker and wait for their final saves.
    pub fn shutdown(self) {
        let Self {
            assembler, retired, ..
        } = self;
        for old in retired {
            old.shutdown();
        }
        assembler.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::frame::tests::FakeBackend;
    use crate::capture::{Point, Rect, WindowHandle};
    use crate::overlay::tests::ScriptedHost;
    use crate::overlay::{window_pick, OverlayInput};
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;
    use std::io::Read;
    use std::path::Path;
    use std::time::Instant;
    use tempfile::TempDir;

    struct FakeGeometry {
        desktop: Rect,
        monitor: Rect,
        work_area: Rect,
        frames: Vec<(WindowHandle, Rect)>,
    }

    impl GeometryProvider for FakeGeometry {
        fn virtual_desktop_bounds(&self) -> Rect {
            self.desktop
        }
        fn monitor_under_cursor(&self) -> Rect {
            self.monitor
        }
        fn work_area_under_cursor(&self) -> Rect {
            self.work_area
        }
        fn extended_frame_bounds(&self, handle: WindowHandle) -> Option<Rect> {
            self.frames.iter().find(|(h, _)| *h == handle).map(|(_, r)| *r)
        }
        fn raw_window_bounds(&self, _: WindowHandle) -> Rect {
            Rect::default()
        }
    }

    #[derive(Default)]
    struct CountingPanel {
        hides: Cell<u32>,
        shows: Cell<u32>,
        visible: Cell<bool>,
    }

    impl PanelVisibility for CountingPanel {
        fn hide(&self) {
            self.hides.set(self.hides.get() + 1);
            self.visible.set(false);
        }
        fn show(&self) {
            self.shows.set(self.shows.get() + 1);
            self.visible.set(true);
        }
    }

    struct ScriptedPrompt {
        answers: RefCell<VecDeque<Option<String>>>,
        panel: Rc<CountingPanel>,
        /// Panel visibility each time the prompt was shown
        seen_panel: RefCell<Vec<bool>>,
        sizes: RefCell<Vec<(u32, u32)>>,
    }

    impl NamePrompt for ScriptedPrompt {
        fn request_name(&self, shot: &CapturedImage) -> Option<String> {
            self.seen_panel.borrow_mut().push(self.panel.visible.get());
            self.sizes.borrow_mut().push((shot.width(), shot.height()));
            self.answers.borrow_mut().pop_front().flatten()
        }
    }

    struct Rig {
        dir: TempDir,
        host: Rc<ScriptedHost>,
        panel: Rc<CountingPanel>,
        prompt: Rc<ScriptedPrompt>,
        orchestrator: CaptureOrchestrator,
    }

    fn rig(overlay: Vec<Vec<OverlayInput>>, answers: Vec<Option<&str>>) -> Rig {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::create(dir.path(), "Demo", None).unwrap();

        let panel = Rc::new(CountingPanel::default());
        let prompt = Rc::new(ScriptedPrompt {
            answers: RefCell::new(answers.into_iter().map(|a| a.map(String::from)).collect()),
            panel: panel.clone(),
            seen_panel: RefCell::default(),
            sizes: RefCell::default(),
        });
        let host = Rc::new(ScriptedHost::with_scripts(overlay));
        let platform = Platform {
            geometry: Rc::new(FakeGeometry {
                // A second, uncaptured monitor sits left of the pointer's.
                desktop: Rect::new(-1000, 0, 2000, 800),
                monitor: Rect::new(0, 0, 1000, 800),
                work_area: Rect::new(0, 0, 1000, 760),
                frames: vec![(WindowHandle(2), Rect::new(100, 100, 800, 600))],
            }),
            backend: Rc::new(FakeBackend {
                monitors: vec![(Rect::new(0, 0, 1000, 800), [10, 20, 30])],
            }),
            locator: Rc::new(window_pick::tests::desktop_tree()),
            overlay_host: host.clone(),
            prompt: prompt.clone(),
            panel: panel.clone(),
        };

        let mut config = AppConfig::default();
        config.capture.settle_delay_ms = 0;
        config.assembly.poll_interval_ms = 20;

        let orchestrator =
            CaptureOrchestrator::new(platform, window_pick::tests::filter(), &config, session)
                .unwrap();
        Rig {
            dir,
            host,
            panel,
            prompt,
            orchestrator,
        }
    }

    fn pngs(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|n| n.ends_with(".png"))
            .collect();
        names.sort();
        names
    }

    fn document_xml(path: &Path) -> String {
        let mut archive = zip::ZipArchive::new(std::fs::File::open(path).unwrap()).unwrap();
        let mut xml = String::new();
        archive
            .by_name("word/document.xml")
            .unwrap()
            .read_to_string(&mut xml)
            .unwrap();
        xml
    }

    #[test]
    fn test_monitor_capture_end_to_end() {
        let mut rig = rig(vec![], vec![Some("login screen")]);
        let status = rig.orchestrator.capture(CaptureMode::Monitor);

        assert_eq!(status, StatusMessage::success("Saved: login screen.png"));
        assert_eq!(*rig.prompt.sizes.borrow(), vec![(1000, 760)]);
        assert_eq!(*rig.prompt.seen_panel.borrow(), vec![false]);
        assert_eq!((rig.panel.hides.get(), rig.panel.shows.get()), (1, 1));
        assert!(rig.panel.visible.get());

        let session = rig.orchestrator.session().clone();
        rig.orchestrator.shutdown();
        assert_eq!(pngs(&session.project_dir), vec!["login screen.png"]);
        assert!(document_xml(&session.document_path).contains("login screen (monitor)"));
    }

    #[test]
    fn test_window_capture_uses_frame_bounds() {
        let overlay = vec![vec![OverlayInput::PrimaryDown(Point::new(200, 200))]];
        let mut rig = rig(overlay, vec![Some("")]);
        let status = rig.orchestrator.capture(CaptureMode::Window);

        assert_eq!(status.severity, Severity::Success);
        assert!(status.text.starts_with("Saved: screenshot_"));
        assert_eq!(*rig.prompt.sizes.borrow(), vec![(800, 600)]);
        rig.orchestrator.shutdown();
    }

    #[test]
    fn test_window_pick_on_own_window_is_cancelled() {
        let overlay = vec![vec![OverlayInput::PrimaryDown(Point::new(1300, 300))]];
        let mut rig = rig(overlay, vec![Some("never")]);
        let status = rig.orchestrator.capture(CaptureMode::Window);

        assert_eq!(status, StatusMessage::info("Window capture cancelled."));
        assert!(rig.prompt.sizes.borrow().is_empty());
        assert_eq!(rig.panel.shows.get(), 1);
        rig.orchestrator.shutdown();
    }

    #[test]
    fn test_region_cancel_and_tiny_drag() {
        let overlay = vec![
            vec![OverlayInput::PrimaryDown(Point::new(5, 5)), OverlayInput::Cancel],
            vec![
                OverlayInput::PrimaryDown(Point::new(10, 10)),
                OverlayInput::PrimaryUp(Point::new(14, 14)),
            ],
        ];
        let mut rig = rig(overlay, vec![]);

        for _ in 0..2 {
            let status = rig.orchestrator.capture(CaptureMode::Region);
            assert_eq!(status, StatusMessage::info("Selection cancelled."));
        }
        assert_eq!((rig.panel.hides.get(), rig.panel.shows.get()), (2, 2));
        assert_eq!(rig.orchestrator.shots_taken(), 0);

        let project = rig.orchestrator.session().project_dir.clone();
        rig.orchestrator.shutdown();
        assert!(pngs(&project).is_empty());
    }

    #[test]
    fn test_region_capture_and_naming_cancel() {
        let overlay = vec![vec![
            OverlayInput::PrimaryDown(Point::new(10, 10)),
            OverlayInput::PointerMoved(Point::new(20, 30)),
            OverlayInput::PrimaryUp(Point::new(30, 50)),
        ]];
        let mut rig = rig(overlay, vec![None]);
        let status = rig.orchestrator.capture(CaptureMode::Region);

        assert_eq!(status, StatusMessage::info("Save cancelled."));
        assert_eq!(*rig.prompt.sizes.borrow(), vec![(20, 40)]);
        assert!(rig.panel.visible.get());
        rig.orchestrator.shutdown();
    }

    #[test]
    fn test_overlay_opens_on_monitor_under_pointer() {
        let overlay = vec![vec![
            OverlayInput::PrimaryDown(Point::new(10, 10)),
            OverlayInput::PrimaryUp(Point::new(110, 60)),
        ]];
        let mut rig = rig(overlay, vec![Some("corner")]);
        let status = rig.orchestrator.capture(CaptureMode::Region);

        assert_eq!(status, StatusMessage::success("Saved: corner.png"));
        assert_eq!(*rig.host.opened.borrow(), vec![Rect::new(0, 0, 1000, 800)]);
        assert_eq!(*rig.prompt.sizes.borrow(), vec![(100, 50)]);
        rig.orchestrator.shutdown();
    }

    #[test]
    fn test_off_screen_capture_reports_error() {
        let mut rig = rig(vec![], vec![Some("x")]);
        rig.orchestrator.geometry = Rc::new(FakeGeometry {
            desktop: Rect::new(0, 0, 1000, 800),
            monitor: Rect::new(0, 0, 1000, 800),
            work_area: Rect::new(5000, 5000, 100, 100),
            frames: vec![],
        });

        let status = rig.orchestrator.capture(CaptureMode::Monitor);
        assert_eq!(status.severity, Severity::Error);
        assert!(status.text.starts_with("Capture failed:"));
        assert!(rig.panel.visible.get());
        rig.orchestrator.shutdown();
    }

    #[test]
    fn test_switch_project_routes_shots_to_new_session() {
        let mut rig = rig(vec![], vec![Some("before"), Some("after")]);
        rig.orchestrator.capture(CaptureMode::Monitor);
        let first = rig.orchestrator.session().clone();

        let second = Session::create(rig.dir.path(), "Second Project", None).unwrap();
        let status = rig.orchestrator.switch_project(second.clone()).unwrap();
        assert_eq!(status, StatusMessage::success("Project changed."));
        assert_eq!(rig.orchestrator.shots_taken(), 0);

        rig.orchestrator.capture(CaptureMode::Monitor);
        rig.orchestrator.shutdown();

        let first_xml = document_xml(&first.document_path);
        let second_xml = document_xml(&second.document_path);
        assert!(first_xml.contains("before (monitor)") && !first_xml.contains("after"));
        assert!(second_xml.contains("after (monitor)"));
        assert_eq!(pngs(&second.project_dir), vec!["after.png"]);
    }

    #[test]
    fn test_finished_workers_are_released_on_switch() {
        let mut rig = rig(vec![], vec![]);
        let second = Session::create(rig.dir.path(), "Second", None).unwrap();
        rig.orchestrator.switch_project(second).unwrap();
        assert_eq!(rig.orchestrator.retired.len(), 1);

        let deadline = Instant::now() + Duration::from_secs(10);
        while !rig.orchestrator.retired[0].is_finished() {
            assert!(Instant::now() < deadline, "old worker never exited");
            std::thread::sleep(Duration::from_millis(10));
        }

        let third = Session::create(rig.dir.path(), "Third", None).unwrap();
        rig.orchestrator.switch_project(third).unwrap();
        assert_eq!(rig.orchestrator.retired.len(), 1);
        assert!(rig.orchestrator.session().project_dir.ends_with("Third"));
        rig.orchestrator.shutdown();
    }
}
