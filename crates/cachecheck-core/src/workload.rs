//! Workload vectors and the sorted workload listing.
//!
//! A workload file holds one ASCII line:
//! `<capacity> <length> <key_0> ... <key_{length-1}>` followed by a newline.
//! File names carry a zero-padded counter (`test_000001.txt`) so that
//! lexicographic order equals numeric order.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::debug;

use crate::error::{HarnessError, HarnessResult};

pub const WORKLOAD_PREFIX: &str = "test_";
pub const WORKLOAD_SUFFIX: &str = ".txt";

/// File name of the `index`-th workload (1-based).
pub fn workload_file_name(index: usize) -> String {
    format!("{WORKLOAD_PREFIX}{index:06}{WORKLOAD_SUFFIX}")
}

/// Whether `name` belongs to the workload listing (`test_*.txt`).
pub fn is_workload_name(name: &str) -> bool {
    name.len() >= WORKLOAD_PREFIX.len() + WORKLOAD_SUFFIX.len()
        && name.starts_with(WORKLOAD_PREFIX)
        && name.ends_with(WORKLOAD_SUFFIX)
}

/// Strict parser rejections.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkloadError {
    #[error("workload is empty")]
    Empty,

    #[error("missing sequence length")]
    MissingLength,

    #[error("token {index} is not a non-negative integer: {token:?}")]
    BadToken { index: usize, token: String },

    #[error("cache capacity must be positive")]
    ZeroCapacity,

    #[error("sequence length is {declared} but {actual} keys follow")]
    LengthMismatch { declared: u64, actual: usize },
}

/// A cache-access test vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workload {
    pub capacity: u64,
    pub keys: Vec<u64>,
}

impl Workload {
    pub fn new(capacity: u64, keys: Vec<u64>) -> Self {
        Self { capacity, keys }
    }

    /// Parse the textual form. The declared length must equal the number of
    /// keys that follow it.
    pub fn parse(text: &str) -> Result<Self, WorkloadError> {
        let mut tokens = text.split_ascii_whitespace().enumerate();

        let (_, first) = tokens.next().ok_or(WorkloadError::Empty)?;
        let capacity = parse_token(0, first)?;
        if capacity == 0 {
            return Err(WorkloadError::ZeroCapacity);
        }

        let (_, second) = tokens.next().ok_or(WorkloadError::MissingLength)?;
        let declared = parse_token(1, second)?;

        let keys = tokens
            .map(|(index, token)| parse_token(index, token))
            .collect::<Result<Vec<_>, _>>()?;

        if keys.len() as u64 != declared {
            return Err(WorkloadError::LengthMismatch {
                declared,
                actual: keys.len(),
            });
        }

        Ok(Self { capacity, keys })
    }

    /// Declared sequence length.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Canonical file content, trailing newline included.
    pub fn to_line(&self) -> String {
        format!("{self}\n")
    }
}

impl fmt::Display for Workload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.capacity, self.keys.len())?;
        for key in &self.keys {
            write!(f, " {key}")?;
        }
        Ok(())
    }
}

impl FromStr for Workload {
    type Err = WorkloadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn parse_token(index: usize, token: &str) -> Result<u64, WorkloadError> {
    token.parse::<u64>().map_err(|_| WorkloadError::BadToken {
        index,
        token: token.to_string(),
    })
}

/// One entry of the workload listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkloadFile {
    pub name: String,
    pub path: PathBuf,
}

impl WorkloadFile {
    /// Read and strictly parse the file.
    pub fn load(&self) -> HarnessResult<Result<Workload, WorkloadError>> {
        let text = fs::read_to_string(&self.path).map_err(|source| HarnessError::Io {
            path: self.path.clone(),
            source,
        })?;
        Ok(Workload::parse(&text))
    }
}

/// Workload files of a directory, sorted by file name.
#[derive(Debug, Clone, Default)]
pub struct WorkloadListing {
    dir: PathBuf,
    files: Vec<WorkloadFile>,
}

impl WorkloadListing {
    /// List `test_*.txt` in `dir`. A missing directory and an empty listing
    /// are both reported as [`HarnessError::NoWorkloads`].
    pub fn discover(dir: &Path) -> HarnessResult<Self> {
        if !dir.is_dir() {
            return Err(HarnessError::NoWorkloads {
                dir: dir.to_path_buf(),
            });
        }

        let entries = fs::read_dir(dir).map_err(|source| HarnessError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| HarnessError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
            let file_name = entry.file_name();
            let name = match file_name.to_str() {
                Some(name) => name.to_string(),
                None => {
                    let lossy = file_name.to_string_lossy().into_owned();
                    debug!(dir = %dir.display(), name = %lossy, "file name is not UTF-8, listed under its lossy form");
                    lossy
                }
            };
            let path = entry.path();
            if is_workload_name(&name) && path.is_file() {
                files.push(WorkloadFile { name, path });
            }
        }

        if files.is_empty() {
            return Err(HarnessError::NoWorkloads {
                dir: dir.to_path_buf(),
            });
        }

        files.sort_by(|a, b| a.name.cmp(&b.name));
        debug!(dir = %dir.display(), count = files.len(), "discovered workloads");

        Ok(Self {
            dir: dir.to_path_buf(),
            files,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn files(&self) -> &[WorkloadFile] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, WorkloadFile> {
        self.files.iter()
    }
}

impl<'a> IntoIterator for &'a WorkloadListing {
    type Item = &'a WorkloadFile;
    type IntoIter = std::slice::Iter<'a, WorkloadFile>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.iter()
    }
}
