use crate::error::{ReadError, ReadResult};
use crate::{general, plain, slow};
use minperm_types::TestCase;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::info;

/// Where to read statements from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "path", rename_all = "snake_case")]
pub enum Source {
    SlowLog(PathBuf),
    GeneralLog(PathBuf),
    Plain(PathBuf),
}

impl Source {
    pub fn path(&self) -> &Path {
        match self {
            Source::SlowLog(path) | Source::GeneralLog(path) | Source::Plain(path) => path,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Source::SlowLog(_) => "slow log",
            Source::GeneralLog(_) => "general log",
            Source::Plain(_) => "statement file",
        }
    }

    /// Read every statement from the source, in file order.
    pub fn read(&self) -> ReadResult<Vec<TestCase>> {
        let path = expand_home(self.path());
        let file = File::open(&path).map_err(|source| ReadError::Io {
            path: path.clone(),
            source,
        })?;
        let reader = BufReader::new(file);

        let cases = match self {
            Source::SlowLog(_) => slow::parse(reader),
            Source::GeneralLog(_) => general::parse(reader),
            Source::Plain(_) => plain::parse(reader),
        }
        .map_err(|source| ReadError::Io {
            path: path.clone(),
            source,
        })?;

        info!(source = self.kind(), path = %path.display(), statements = cases.len(), "Read statements");
        Ok(cases)
    }
}

/// Replace a leading `~` with the current user's home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match dirs::home_dir() {
        Some(home) => home.join(rest),
        None => path.to_path_buf(),
    }
}
