//! Executable discovery for candidate policies.
//!
//! Resolves a policy name to an executable with the following priority:
//! 1. Explicit path (CLI flag)
//! 2. `<POLICY>_BIN` environment variable
//! 3. `<project-root>/build/<name>`
//! 4. `<project-root>/<name>`
//! 5. `PATH` search
//!
//! The first candidate that exists and is executable wins; later sources are
//! not consulted.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{HarnessError, HarnessResult};

/// Policies registered by default, in run order.
pub const DEFAULT_POLICIES: &[&str] = &["lru", "lfu", "ideal"];

/// Environment variable consulted for `policy` (`lru` -> `LRU_BIN`).
pub fn env_var_for(policy: &str) -> String {
    let mut var: String = policy
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    var.push_str("_BIN");
    var
}

/// CLI flag carrying the explicit path for `policy`.
pub fn flag_for(policy: &str) -> String {
    if DEFAULT_POLICIES.contains(&policy) {
        format!("--{policy}-bin")
    } else {
        format!("--bin {policy}=PATH")
    }
}

/// A policy to resolve, with its optional explicit path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyRequest {
    pub name: String,
    pub explicit: Option<PathBuf>,
}

impl PolicyRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            explicit: None,
        }
    }

    pub fn with_explicit(mut self, path: impl Into<PathBuf>) -> Self {
        self.explicit = Some(path.into());
        self
    }
}

/// Where an executable was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveSource {
    /// Explicit CLI path.
    Explicit,

    /// Environment variable (name).
    Env(String),

    /// `<project-root>/build/<name>`.
    BuildDir,

    /// `<project-root>/<name>`.
    ProjectRoot,

    /// `PATH` search.
    SearchPath,
}

impl fmt::Display for ResolveSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Explicit => write!(f, "explicit"),
            Self::Env(var) => write!(f, "env:{}", var),
            Self::BuildDir => write!(f, "build-dir"),
            Self::ProjectRoot => write!(f, "project-root"),
            Self::SearchPath => write!(f, "path"),
        }
    }
}

/// A resolved policy. Immutable for the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyBinding {
    pub name: String,
    pub path: PathBuf,
    pub source: ResolveSource,
}

#[derive(Debug, Clone, Copy)]
enum Strategy {
    Explicit,
    Env,
    BuildDir,
    ProjectRoot,
    SearchPath,
}

const STRATEGIES: [Strategy; 5] = [
    Strategy::Explicit,
    Strategy::Env,
    Strategy::BuildDir,
    Strategy::ProjectRoot,
    Strategy::SearchPath,
];

type EnvLookup = Box<dyn Fn(&str) -> Option<OsString> + Send + Sync>;

/// Binary resolver.
pub struct BinaryResolver {
    /// Anchor for the conventional build locations.
    project_root: PathBuf,

    /// Value searched in the last step (normally `PATH`).
    search_path: Option<OsString>,

    /// Environment lookup.
    env: EnvLookup,
}

impl BinaryResolver {
    /// Resolver reading the process environment.
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            search_path: std::env::var_os("PATH"),
            env: Box::new(|key| std::env::var_os(key)),
        }
    }

    /// Replace the environment lookup.
    pub fn with_env<F>(mut self, env: F) -> Self
    where
        F: Fn(&str) -> Option<OsString> + Send + Sync + 'static,
    {
        self.env = Box::new(env);
        self
    }

    /// Replace the searched `PATH` value.
    pub fn with_search_path(mut self, search_path: Option<OsString>) -> Self {
        self.search_path = search_path;
        self
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Resolve one policy, or `None` if no candidate is executable.
    pub fn resolve(&self, request: &PolicyRequest) -> Option<PolicyBinding> {
        let binding = STRATEGIES
            .iter()
            .find_map(|strategy| self.try_strategy(*strategy, request));
        match &binding {
            Some(b) => debug!(
                policy = %request.name,
                path = %b.path.display(),
                source = %b.source,
                "resolved executable"
            ),
            None => debug!(policy = %request.name, "no executable found"),
        }
        binding
    }

    /// Resolve every request. Fails with all unresolved policies at once.
    pub fn resolve_all(&self, requests: &[PolicyRequest]) -> HarnessResult<Vec<PolicyBinding>> {
        let mut bindings = Vec::with_capacity(requests.len());
        let mut missing = Vec::new();
        for request in requests {
            match self.resolve(request) {
                Some(binding) => bindings.push(binding),
                None => missing.push(request.name.as_str()),
            }
        }

        if !missing.is_empty() {
            return Err(HarnessError::Unresolved {
                policies: missing.iter().map(|p| p.to_string()).collect(),
                flags: missing.iter().map(|p| flag_for(p)).collect(),
                env_vars: missing.iter().map(|p| env_var_for(p)).collect(),
            });
        }
        Ok(bindings)
    }

    fn try_strategy(&self, strategy: Strategy, request: &PolicyRequest) -> Option<PolicyBinding> {
        let name = &request.name;
        let (path, source) = match strategy {
            Strategy::Explicit => (request.explicit.clone()?, ResolveSource::Explicit),
            Strategy::Env => {
                let var = env_var_for(name);
                let value = (self.env)(&var).filter(|v| !v.is_empty())?;
                (PathBuf::from(value), ResolveSource::Env(var))
            }
            Strategy::BuildDir => (
                self.project_root.join("build").join(name),
                ResolveSource::BuildDir,
            ),
            Strategy::ProjectRoot => (self.project_root.join(name), ResolveSource::ProjectRoot),
            Strategy::SearchPath => (self.search(name)?, ResolveSource::SearchPath),
        };

        if is_executable(&path) {
            Some(PolicyBinding {
                name: name.clone(),
                path,
                source,
            })
        } else {
            debug!(policy = %name, candidate = %path.display(), source = %source, "candidate rejected");
            None
        }
    }

    fn search(&self, name: &str) -> Option<PathBuf> {
        let paths = self.search_path.as_ref()?;
        std::env::split_paths(paths)
            .filter(|dir| !dir.as_os_str().is_empty())
            .map(|dir| dir.join(name))
            .find(|candidate| is_executable(candidate))
    }
}

/// Regular file with an execute bit (any file on non-Unix targets).
pub fn is_executable(path: &Path) -> bool {
    let Ok(meta) = std::fs::metadata(path) else {
        return false;
    };
    if !meta.is_file() {
        return false;
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        meta.permissions().mode() & 0o111 != 0
    }
    #[cfg(not(unix))]
    {
        true
    }
}
