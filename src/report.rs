//! Run outcome and non-fatal diagnostics.

use std::path::PathBuf;

use log::warn;
use serde::Serialize;

/// Collects resolution warnings while also logging them.
#[derive(Debug, Default, Clone)]
pub struct Warnings(Vec<String>);

impl Warnings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!("{message}");
        self.0.push(message);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

/// Summary of a completed restructuring run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    pub input: PathBuf,
    pub output: PathBuf,
    pub title: String,
    /// Content documents loaded from the source spine.
    pub documents: usize,
    /// Chapters written to the output.
    pub chapters: usize,
    /// Chapters whose markup went through the pattern-based fallback.
    pub fallback_sanitized: usize,
    pub images: usize,
    pub has_cover: bool,
    pub warnings: Vec<String>,
}
