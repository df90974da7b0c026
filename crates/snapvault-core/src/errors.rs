use thiserror::Error;

/// Result type alias using SnapshotError
pub type Result<T> = std::result::Result<T, SnapshotError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code that can be used for programmatic
/// error handling, structured logging and test assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Lookup
    NotFound,
    DuplicateId,

    // Structural
    StructureMismatch,

    // Configuration
    InvalidCapacity,
    InvalidConfig,
    UnknownComparator,

    // Persistence
    CorruptState,
    Serialization,
    Io,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::DuplicateId => "ERR_DUPLICATE_ID",
            ExErrorKind::StructureMismatch => "ERR_STRUCTURE_MISMATCH",
            ExErrorKind::InvalidCapacity => "ERR_INVALID_CAPACITY",
            ExErrorKind::InvalidConfig => "ERR_INVALID_CONFIG",
            ExErrorKind::UnknownComparator => "ERR_UNKNOWN_COMPARATOR",
            ExErrorKind::CorruptState => "ERR_CORRUPT_STATE",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Io => "ERR_IO",
        }
    }
}

/// Canonical structured error type
///
/// A flattened, cloneable view of a [`SnapshotError`] carrying the
/// classification fields the logging facility records.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    entity_id: Option<String>,
    message: String,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            entity_id: None,
            message: String::new(),
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add entity ID context
    pub fn with_entity_id(mut self, id: impl Into<String>) -> Self {
        self.entity_id = Some(id.into());
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Get the operation context, if any
    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    /// Get the entity ID context, if any
    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(entity_id) = &self.entity_id {
            write!(f, " (entity_id: {})", entity_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {}

// ========== End Error Facility ==========

/// Error taxonomy for snapshot operations
#[derive(Error, Debug)]
pub enum SnapshotError {
    /// An id-keyed operation named a snapshot that is not stored
    #[error("Snapshot with ID {snapshot_id} not found")]
    NotFound { snapshot_id: String },

    /// A caller-supplied id collides with a stored snapshot
    #[error("Snapshot with ID {snapshot_id} already exists")]
    DuplicateId { snapshot_id: String },

    /// Leaves or trees whose shapes disagree
    #[error("Structure mismatch: {reason}")]
    StructureMismatch { reason: String },

    /// Capacity must admit at least one snapshot
    #[error("Invalid capacity {requested}: max_capacity must be at least 1")]
    InvalidCapacity { requested: usize },

    /// Configuration source could not be interpreted
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    /// Persisted state names a comparator the registry cannot resolve
    #[error("Unknown comparator: {name}")]
    UnknownComparator { name: String },

    /// Persisted state failed validation
    #[error("Corrupt state payload: {reason}")]
    CorruptState { reason: String },

    /// Encoding or decoding of the state payload failed
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// Transport failure, passed through unmodified
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SnapshotError {
    /// Shorthand for [`SnapshotError::NotFound`]
    pub fn not_found(snapshot_id: impl Into<String>) -> Self {
        SnapshotError::NotFound {
            snapshot_id: snapshot_id.into(),
        }
    }

    /// Shorthand for [`SnapshotError::StructureMismatch`]
    pub fn structure_mismatch(reason: impl Into<String>) -> Self {
        SnapshotError::StructureMismatch {
            reason: reason.into(),
        }
    }

    /// Shorthand for [`SnapshotError::CorruptState`]
    pub fn corrupt(reason: impl Into<String>) -> Self {
        SnapshotError::CorruptState {
            reason: reason.into(),
        }
    }

    /// The canonical kind of this error
    pub fn kind(&self) -> ExErrorKind {
        match self {
            SnapshotError::NotFound { .. } => ExErrorKind::NotFound,
            SnapshotError::DuplicateId { .. } => ExErrorKind::DuplicateId,
            SnapshotError::StructureMismatch { .. } => ExErrorKind::StructureMismatch,
            SnapshotError::InvalidCapacity { .. } => ExErrorKind::InvalidCapacity,
            SnapshotError::InvalidConfig { .. } => ExErrorKind::InvalidConfig,
            SnapshotError::UnknownComparator { .. } => ExErrorKind::UnknownComparator,
            SnapshotError::CorruptState { .. } => ExErrorKind::CorruptState,
            SnapshotError::Serialization { .. } => ExErrorKind::Serialization,
            SnapshotError::Io(_) => ExErrorKind::Io,
        }
    }
}

/// Conversion from SnapshotError to the structured ExError
impl From<&SnapshotError> for ExError {
    fn from(err: &SnapshotError) -> Self {
        let ex = ExError::new(err.kind()).with_message(err.to_string());
        match err {
            SnapshotError::NotFound { snapshot_id } | SnapshotError::DuplicateId { snapshot_id } => {
                ex.with_entity_id(snapshot_id)
            }
            SnapshotError::UnknownComparator { name } => ex.with_entity_id(name),
            _ => ex,
        }
    }
}

impl From<SnapshotError> for ExError {
    fn from(err: SnapshotError) -> Self {
        ExError::from(&err)
    }
}

/// Conversion from serde_json::Error to SnapshotError
impl From<serde_json::Error> for SnapshotError {
    fn from(err: serde_json::Error) -> Self {
        SnapshotError::Serialization {
            message: err.to_string(),
        }
    }
}
