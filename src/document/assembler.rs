//! Document assembler worker
//!
//! Callers only enqueue; a dedicated thread pulls commands one at a time and
//! applies them to both artifacts. Every command yields one outcome per
//! artifact, so a failing deck never takes the document down with it, or the
//! other way around.

use chrono::Local;
use log::{debug, error, info, warn};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use super::ooxml::{check_output_path, EmbeddedImage};
use super::{ArtifactError, PaginatedDocument, SlideDeck};
use crate::app::{AssemblyConfig, Session};

/// A named PNG on disk, ready to be appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedShot {
    pub path: PathBuf,
    pub caption: String,
    /// 1-based position among the session's accepted shots
    pub sequence: u64,
}

#[derive(Debug, Clone)]
pub enum AssemblyCommand {
    Init,
    AppendShot(SavedShot),
    Save,
    Close,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Init,
    Append(u64),
    Save,
    Close,
}

impl AssemblyCommand {
    pub fn kind(&self) -> CommandKind {
        match self {
            AssemblyCommand::Init => CommandKind::Init,
            AssemblyCommand::AppendShot(shot) => CommandKind::Append(shot.sequence),
            AssemblyCommand::Save => CommandKind::Save,
            AssemblyCommand::Close => CommandKind::Close,
        }
    }
}

/// What one command did to one artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactOutcome {
    Ok,
    /// The artifact is not live (never initialised, or its init failed)
    Skipped,
    Failed(String),
}

impl ArtifactOutcome {
    fn from_result(result: Result<(), ArtifactError>) -> Self {
        match result {
            Ok(()) => ArtifactOutcome::Ok,
            Err(e) => ArtifactOutcome::Failed(e.to_string()),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, ArtifactOutcome::Ok)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandReport {
    pub command: CommandKind,
    pub deck: ArtifactOutcome,
    pub document: ArtifactOutcome,
}

#[derive(Debug, thiserror::Error)]
pub enum AssemblerError {
    #[error("Failed to start document worker: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Worker-private. Each artifact is `None` until it initialises.
struct DocumentState {
    session: Session,
    config: AssemblyConfig,
    deck: Option<SlideDeck>,
    document: Option<PaginatedDocument>,
}

impl DocumentState {
    fn new(session: Session, config: AssemblyConfig) -> Self {
        Self {
            session,
            config,
            deck: None,
            document: None,
        }
    }

    fn apply(&mut self, command: &AssemblyCommand) -> CommandReport {
        let (deck, document) = match command {
            AssemblyCommand::Init => self.init(),
            AssemblyCommand::AppendShot(shot) => self.append(shot),
            AssemblyCommand::Save | AssemblyCommand::Close => self.persist(),
        };
        CommandReport {
            command: command.kind(),
            deck,
            document,
        }
    }

    fn init(&mut self) -> (ArtifactOutcome, ArtifactOutcome) {
        let created = Local::now().naive_local();
        let title = self.session.project_name.as_str();

        let deck = check_output_path(&self.session.deck_path).map(|()| {
            match &self.session.template_path {
                Some(template) => SlideDeck::from_template(template, title, created, &self.config)
                    .unwrap_or_else(|e| {
                        warn!("{}; starting from a blank deck", e);
                        SlideDeck::blank(title, created, &self.config)
                    }),
                None => SlideDeck::blank(title, created, &self.config),
            }
        });
        let document = check_output_path(&self.session.document_path)
            .map(|()| PaginatedDocument::new(title, created, &self.config));

        let deck_outcome = match deck {
            Ok(deck) => {
                self.deck = Some(deck);
                ArtifactOutcome::Ok
            }
            Err(e) => {
                error!("Slide deck unavailable for this session: {}", e);
                self.deck = None;
                ArtifactOutcome::Failed(e.to_string())
            }
        };
        let document_outcome = match document {
            Ok(document) => {
                self.document = Some(document);
                ArtifactOutcome::Ok
            }
            Err(e) => {
                error!("Document unavailable for this session: {}", e);
                self.document = None;
                ArtifactOutcome::Failed(e.to_string())
            }
        };
        (deck_outcome, document_outcome)
    }

    fn append(&mut self, shot: &SavedShot) -> (ArtifactOutcome, ArtifactOutcome) {
        if self.deck.is_none() && self.document.is_none() {
            return (ArtifactOutcome::Skipped, ArtifactOutcome::Skipped);
        }

        let image = match EmbeddedImage::load(&shot.path) {
            Ok(image) => image,
            Err(e) => {
                warn!("Skipping shot #{}: {}", shot.sequence, e);
                let failed = |live: bool| {
                    if live {
                        ArtifactOutcome::Failed(e.to_string())
                    } else {
                        ArtifactOutcome::Skipped
                    }
                };
                return (failed(self.deck.is_some()), failed(self.document.is_some()));
            }
        };

        let deck = match self.deck.as_mut() {
            Some(deck) => ArtifactOutcome::from_result(deck.append(&image, &shot.caption)),
            None => ArtifactOutcome::Skipped,
        };
        let document = match self.document.as_mut() {
            Some(document) => ArtifactOutcome::from_result(document.append(&image, &shot.caption)),
            None => ArtifactOutcome::Skipped,
        };

        for (name, outcome) in [("deck", &deck), ("document", &document)] {
            if let ArtifactOutcome::Failed(reason) = outcome {
                warn!("Shot #{} not added to {}: {}", shot.sequence, name, reason);
            }
        }
        (deck, document)
    }

    fn persist(&self) -> (ArtifactOutcome, ArtifactOutcome) {
        let deck = match &self.deck {
            Some(deck) => ArtifactOutcome::from_result(deck.write_to(&self.session.deck_path)),
            None => ArtifactOutcome::Skipped,
        };
        let document = match &self.document {
            Some(document) => {
                ArtifactOutcome::from_result(document.write_to(&self.session.document_path))
            }
            None => ArtifactOutcome::Skipped,
        };

        for (path, outcome) in [
            (&self.session.deck_path, &deck),
            (&self.session.document_path, &document),
        ] {
            match outcome {
                ArtifactOutcome::Failed(reason) => error!("Failed to save {:?}: {}", path, reason),
                ArtifactOutcome::Ok => debug!("Saved {:?}", path),
                ArtifactOutcome::Skipped => {}
            }
        }
        (deck, document)
    }
}

/// Handle to one session's worker. Submissions never block and never fail.
pub struct DocumentAssembler {
    sender: Sender<AssemblyCommand>,
    accepting: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl DocumentAssembler {
    pub fn start(session: &Session, config: &AssemblyConfig) -> Result<Self, AssemblerError> {
        Self::spawn(session, config, None)
    }

    /// Like `start`, additionally sending one report per applied command.
    pub fn with_reports(
        session: &Session,
        config: &AssemblyConfig,
        reports: Sender<CommandReport>,
    ) -> Result<Self, AssemblerError> {
        Self::spawn(session, config, Some(reports))
    }

    fn spawn(
        session: &Session,
        config: &AssemblyConfig,
        reports: Option<Sender<CommandReport>>,
    ) -> Result<Self, AssemblerError> {
        let (sender, receiver) = mpsc::channel();
        let accepting = Arc::new(AtomicBool::new(true));

        let state = DocumentState::new(session.clone(), config.clone());
        let poll = config.poll_interval().max(Duration::from_millis(10));
        let worker = std::thread::Builder::new()
            .name("document-assembler".to_string())
            .spawn({
                let accepting = accepting.clone();
                move || run(state, receiver, accepting, reports, poll)
            })?;

        Ok(Self {
            sender,
            accepting,
            worker: Some(worker),
        })
    }

    pub fn is_accepting(&self) -> bool {
        self.accepting.load(Ordering::Acquire)
    }

    /// Whether the worker thread has exited (or was already joined).
    pub fn is_finished(&self) -> bool {
        self.worker.as_ref().map_or(true, JoinHandle::is_finished)
    }

    fn submit(&self, command: AssemblyCommand) {
        if !self.is_accepting() {
            warn!("Document assembler is closed; dropping {:?}", command.kind());
            return;
        }
        if self.sender.send(command).is_err() {
            warn!("Document worker is gone; command dropped");
        }
    }

    pub fn init(&self) {
        self.submit(AssemblyCommand::Init);
    }

    pub fn append(&self, shot: SavedShot) {
        self.submit(AssemblyCommand::AppendShot(shot));
    }

    pub fn save(&self) {
        self.submit(AssemblyCommand::Save);
    }

    /// Stop accepting submissions and queue the final save. Only the first
    /// call has any effect.
    pub fn close(&self) {
        if self.accepting.swap(false, Ordering::AcqRel) {
            let _ = self.sender.send(AssemblyCommand::Close);
        }
    }

    /// Wait for the worker to exit. Returns at once if it was never started
    /// or has already been joined.
    pub fn join(&mut self) {
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("Document worker panicked");
            }
        }
    }

    /// Close, then wait for the final save.
    pub fn shutdown(mut self) {
        self.close();
        self.join();
    }
}

impl Drop for DocumentAssembler {
    fn drop(&mut self) {
        self.close();
    }
}

fn run(
    mut state: DocumentState,
    receiver: Receiver<AssemblyCommand>,
    accepting: Arc<AtomicBool>,
    reports: Option<Sender<CommandReport>>,
    poll: Duration,
) {
    info!("Document worker started for '{}'", state.session.project_name);

    let report = |r: CommandReport| {
        if let Some(reports) = &reports {
            let _ = reports.send(r);
        }
    };

    loop {
        match receiver.recv_timeout(poll) {
            Ok(command) => {
                debug!("Applying {:?}", command.kind());
                let is_close = matches!(command, AssemblyCommand::Close);
                report(state.apply(&command));
                if is_close {
                    break;
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                if !accepting.load(Ordering::Acquire) {
                    // Closed without a Close reaching the queue.
                    report(state.apply(&AssemblyCommand::Close));
                    break;
                }
            }
            Err(RecvTimeoutError::Disconnected) => {
                report(state.apply(&AssemblyCommand::Close));
                break;
            }
        }
    }

    info!("Document worker stopped for '{}'", state.session.project_name);
}
