//! Template collaborators read from the format directory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::{Error, Result};

pub const STYLESHEET: &str = "stylesheet.css";
pub const FONT: &str = "jura.ttf";
pub const LOGO: &str = "logo.png";
pub const TITLEPAGE: &str = "titlepage.xhtml";
pub const JACKET: &str = "jacket.xhtml";
pub const NAV: &str = "nav.xhtml";

/// Contents of the format directory.
///
/// The stylesheet, font and navigation template are always needed. The
/// title page and jacket only matter once a cover resolves, so their
/// absence is reported by [`Templates::cover_pages`] instead of at load.
#[derive(Debug, Clone)]
pub struct Templates {
    pub dir: PathBuf,
    pub stylesheet: Vec<u8>,
    pub font: Vec<u8>,
    pub nav: String,
    pub titlepage: Option<String>,
    pub jacket: Option<String>,
    pub logo: Option<Vec<u8>>,
}

impl Templates {
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let templates = Self {
            dir: dir.to_path_buf(),
            stylesheet: required(dir, STYLESHEET)?,
            font: required(dir, FONT)?,
            nav: String::from_utf8_lossy(&required(dir, NAV)?).into_owned(),
            titlepage: optional(dir, TITLEPAGE)?.map(|b| String::from_utf8_lossy(&b).into_owned()),
            jacket: optional(dir, JACKET)?.map(|b| String::from_utf8_lossy(&b).into_owned()),
            logo: optional(dir, LOGO)?,
        };
        debug!(
            "templates from {}: titlepage={} jacket={} logo={}",
            dir.display(),
            templates.titlepage.is_some(),
            templates.jacket.is_some(),
            templates.logo.is_some()
        );
        Ok(templates)
    }

    /// Title page and jacket templates, both required once a cover exists.
    pub fn cover_pages(&self) -> Result<(&str, &str)> {
        let titlepage = self
            .titlepage
            .as_deref()
            .ok_or_else(|| Error::MissingTemplate(self.dir.join(TITLEPAGE)))?;
        let jacket = self
            .jacket
            .as_deref()
            .ok_or_else(|| Error::MissingTemplate(self.dir.join(JACKET)))?;
        Ok((titlepage, jacket))
    }
}

fn required(dir: &Path, name: &str) -> Result<Vec<u8>> {
    let path = dir.join(name);
    fs::read(&path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => Error::MissingTemplate(path),
        _ => Error::Io(e),
    })
}

fn optional(dir: &Path, name: &str) -> Result<Option<Vec<u8>>> {
    match fs::read(dir.join(name)) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Replace every `{{KEY}}` placeholder with its value.
///
/// Values are inserted literally; callers escape them first.
pub fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (key, value) in values {
        out = out.replace(&format!("{{{{{key}}}}}"), value);
    }
    out
}
