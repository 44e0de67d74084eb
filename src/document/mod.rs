//! Document assembly
//!
//! A single background worker owns the slide deck and the paginated document
//! and applies commands to both in submission order. Each artifact fails on
//! its own; the other one keeps going.

pub mod assembler;
pub mod deck;
pub mod ooxml;
pub mod paginated;

pub use assembler::{
    ArtifactOutcome, AssemblerError, AssemblyCommand, CommandKind, CommandReport,
    DocumentAssembler, SavedShot,
};
pub use deck::SlideDeck;
pub use ooxml::EmbeddedImage;
pub use paginated::PaginatedDocument;

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("Cannot create artifact: {0}")]
    Init(String),

    #[error("Cannot add shot: {0}")]
    Append(String),

    #[error("Cannot write artifact: {0}")]
    Persist(String),

    #[error("Template rejected: {0}")]
    Template(String),

    #[error("Unusable image: {0}")]
    Image(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),
}
