//! Error types for refolio operations.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Pipeline stage an error originated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Extract,
    Parse,
    Load,
    Build,
    Package,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Extract => "extract",
            Stage::Parse => "parse",
            Stage::Load => "load",
            Stage::Build => "build",
            Stage::Package => "package",
        };
        f.write_str(name)
    }
}

/// Errors that can occur while restructuring an EPUB.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("archive entry escapes the extraction directory: {0}")]
    PathTraversal(String),

    #[error("archive entry {name} exceeds the {limit} byte size limit")]
    EntryTooLarge { name: String, limit: u64 },

    #[error("missing root file: {0}")]
    MissingRootFile(String),

    #[error("invalid package descriptor: {0}")]
    InvalidPackage(String),

    #[error("missing template file: {}", .0.display())]
    MissingTemplate(PathBuf),

    #[error("{stage} failed: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// The stage this error was raised in, if the pipeline tagged it.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Error::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Attach a [`Stage`] to an error result.
pub trait ResultExt<T> {
    fn stage(self, stage: Stage) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn stage(self, stage: Stage) -> Result<T> {
        self.map_err(|e| Error::Stage {
            stage,
            source: Box::new(e.into()),
        })
    }
}
