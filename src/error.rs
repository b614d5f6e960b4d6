use std::error::Error as StdError;
use std::sync::Arc;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SenError>;

/// Shared pointer to a domain error raised by user code.
pub type ErrorPtr = Arc<dyn StdError + Send + Sync + 'static>;

#[derive(Debug, Clone, Error)]
pub enum SenError {
    #[error("hub: {name} is already registered")]
    AlreadyRegistered { name: String },

    #[error("hub: {name} is reserved, please use a different name")]
    ReservedName { name: String },

    #[error("hub: {name} is not registered")]
    NotRegistered { name: String },

    #[error("hub: couldn't find the dependency for {type_name}")]
    NoCandidate { type_name: &'static str },

    #[error("hub: there is a conflict when finding the dependency for {type_name}: {}", candidates.join(", "))]
    Ambiguous {
        type_name: &'static str,
        candidates: Vec<String>,
    },

    #[error("hub: {expected} is not assignable from {found} (registered as {name})")]
    TypeMismatch {
        name: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("hub: unable to parse directive '{directive}': {reason}")]
    InvalidDirective { directive: String, reason: String },

    #[error("hub: {type_name} is not injectable, exclusive access is expected")]
    NotInjectable { type_name: &'static str },

    #[error("lifecycle: cannot {operation} while {state}")]
    InvalidState {
        operation: &'static str,
        state: &'static str,
    },

    #[error("lifecycle: a {phase} hook panicked")]
    HookPanicked { phase: &'static str },

    #[error("lifecycle: stopped waiting for shutdown, the caller was cancelled")]
    Cancelled,

    #[error("config: {0}")]
    Config(Arc<config::ConfigError>),

    #[error("{0}")]
    Hook(ErrorPtr),
}

/// Comparable discriminant of a [`SenError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    AlreadyRegistered,
    ReservedName,
    NotRegistered,
    NoCandidate,
    Ambiguous,
    TypeMismatch,
    InvalidDirective,
    NotInjectable,
    InvalidState,
    HookPanicked,
    Cancelled,
    Config,
    Hook,
}

impl SenError {
    /// Wrap a domain error returned from hook or plugin code.
    pub fn hook<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::Hook(Arc::new(error))
    }

    pub fn not_registered(name: impl Into<String>) -> Self {
        Self::NotRegistered { name: name.into() }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AlreadyRegistered { .. } => ErrorKind::AlreadyRegistered,
            Self::ReservedName { .. } => ErrorKind::ReservedName,
            Self::NotRegistered { .. } => ErrorKind::NotRegistered,
            Self::NoCandidate { .. } => ErrorKind::NoCandidate,
            Self::Ambiguous { .. } => ErrorKind::Ambiguous,
            Self::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            Self::InvalidDirective { .. } => ErrorKind::InvalidDirective,
            Self::NotInjectable { .. } => ErrorKind::NotInjectable,
            Self::InvalidState { .. } => ErrorKind::InvalidState,
            Self::HookPanicked { .. } => ErrorKind::HookPanicked,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Config(_) => ErrorKind::Config,
            Self::Hook(_) => ErrorKind::Hook,
        }
    }

    /// Returns true for the "component not registered" error kind.
    pub fn is_not_registered(&self) -> bool {
        self.kind() == ErrorKind::NotRegistered
    }

    /// Access the domain error carried by a [`SenError::Hook`].
    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        match self {
            Self::Hook(inner) => inner.downcast_ref::<E>(),
            _ => None,
        }
    }
}

impl From<anyhow::Error> for SenError {
    fn from(err: anyhow::Error) -> Self {
        let boxed: Box<dyn StdError + Send + Sync + 'static> = err.into();
        Self::Hook(Arc::from(boxed))
    }
}

impl From<config::ConfigError> for SenError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(Arc::new(err))
    }
}
