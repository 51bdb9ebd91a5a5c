use thiserror::Error;

#[derive(Error, Debug)]
pub enum VhostError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yml::Error),

    #[error("config error: {0}")]
    ConfigParse(String),

    #[error("invalid world pattern '{pattern}': {source}")]
    PatternCompile {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("command dispatch failed: {0}")]
    Dispatch(String),

    #[error("icon load failed for '{path}': {reason}")]
    IconLoad { path: String, reason: String },

    #[error("no login hostname recorded for '{0}'")]
    MissingSession(String),
}

impl VhostError {
    /// Get the kind/category of this error.
    pub fn kind(&self) -> VhostErrorKind {
        match self {
            VhostError::Io(_) => VhostErrorKind::Io,
            VhostError::Yaml(_) => VhostErrorKind::Yaml,
            VhostError::ConfigParse(_) => VhostErrorKind::ConfigParse,
            VhostError::PatternCompile { .. } => VhostErrorKind::PatternCompile,
            VhostError::Dispatch(_) => VhostErrorKind::Dispatch,
            VhostError::IconLoad { .. } => VhostErrorKind::IconLoad,
            VhostError::MissingSession(_) => VhostErrorKind::MissingSession,
        }
    }

    /// Whether the failure comes from operator configuration rather than runtime state.
    pub fn is_config(&self) -> bool {
        self.kind().is_config()
    }
}

/// Lightweight error category for pattern matching without borrowing the error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VhostErrorKind {
    Io,
    Yaml,
    ConfigParse,
    PatternCompile,
    Dispatch,
    IconLoad,
    MissingSession,
}

impl VhostErrorKind {
    pub fn is_config(self) -> bool {
        matches!(
            self,
            VhostErrorKind::Yaml | VhostErrorKind::ConfigParse | VhostErrorKind::PatternCompile
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            VhostErrorKind::Io => "IO",
            VhostErrorKind::Yaml => "YAML",
            VhostErrorKind::ConfigParse => "CONFIG_PARSE",
            VhostErrorKind::PatternCompile => "PATTERN_COMPILE",
            VhostErrorKind::Dispatch => "DISPATCH_FAILED",
            VhostErrorKind::IconLoad => "ICON_LOAD_FAILED",
            VhostErrorKind::MissingSession => "MISSING_SESSION",
        }
    }
}
