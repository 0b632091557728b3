use std::fmt;

/// Error returned by a module's readiness or execution callback.
#[derive(Debug, thiserror::Error)]
pub enum ModuleError {
    #[error("{0}")]
    Failed(String),
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl ModuleError {
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed(msg.into())
    }
}

/// Which module callback was running when a fault occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackPhase {
    Readiness,
    Execution,
}

impl fmt::Display for CallbackPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallbackPhase::Readiness => f.write_str("readiness check"),
            CallbackPhase::Execution => f.write_str("execution step"),
        }
    }
}

/// A module callback that failed or panicked. Caught at the tick boundary.
#[derive(Debug, thiserror::Error)]
pub enum ModuleFault {
    #[error("module {module} failed during {phase}: {source}")]
    Callback {
        module: String,
        phase: CallbackPhase,
        #[source]
        source: ModuleError,
    },
    #[error("module {module} panicked during {phase}: {message}")]
    Panicked {
        module: String,
        phase: CallbackPhase,
        message: String,
    },
}

impl ModuleFault {
    pub fn module(&self) -> &str {
        match self {
            ModuleFault::Callback { module, .. } | ModuleFault::Panicked { module, .. } => module,
        }
    }

    pub fn phase(&self) -> CallbackPhase {
        match self {
            ModuleFault::Callback { phase, .. } | ModuleFault::Panicked { phase, .. } => *phase,
        }
    }
}

/// Errors from parsing an inbound control message.
#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    #[error("malformed control message: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Errors from loading dispatcher configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Errors from dispatcher lifecycle operations.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("dispatcher already torn down")]
    AlreadyTornDown,
}
