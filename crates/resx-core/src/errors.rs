use resx_core_types::{RequestId, TraceId};
use thiserror::Error;

/// Result type alias using ResxError
pub type Result<T> = std::result::Result<T, ResxError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Every failure surfaced by resx maps onto exactly one kind, and every kind
/// carries a stable `ERR_*` code that callers and tests can match on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Batch intake
    InvalidInput,
    InvalidResource,
    UnknownResourceType,
    DuplicateId,

    // Conditional matching
    MalformedCriteria,
    UnknownParameter,
    AmbiguousMatch,

    // Classification
    MissingIdentifier,
    UnresolvableTarget,
    NotFound,
    InvalidForcedId,

    // Integration/IO
    Io,
    Config,
    Serialization,
    Persistence,
    ConstraintViolation,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::InvalidResource => "ERR_INVALID_RESOURCE",
            ExErrorKind::UnknownResourceType => "ERR_UNKNOWN_RESOURCE_TYPE",
            ExErrorKind::DuplicateId => "ERR_DUPLICATE_ID_IN_BATCH",
            ExErrorKind::MalformedCriteria => "ERR_MALFORMED_CRITERIA",
            ExErrorKind::UnknownParameter => "ERR_UNKNOWN_PARAMETER",
            ExErrorKind::AmbiguousMatch => "ERR_AMBIGUOUS_MATCH",
            ExErrorKind::MissingIdentifier => "ERR_MISSING_IDENTIFIER",
            ExErrorKind::UnresolvableTarget => "ERR_UNRESOLVABLE_TARGET",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::InvalidForcedId => "ERR_INVALID_FORCED_ID",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Config => "ERR_CONFIG",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::ConstraintViolation => "ERR_CONSTRAINT_VIOLATION",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Store code and the engine boundary speak `ExError`; domain code raises
/// [`ResxError`] and converts on the way out.
#[derive(Debug, Clone, PartialEq)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    resource_type: Option<String>,
    resource_id: Option<String>,
    match_url: Option<String>,
    match_count: Option<usize>,
    request_id: Option<RequestId>,
    trace_id: Option<TraceId>,
    message: String,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            resource_type: None,
            resource_id: None,
            match_url: None,
            match_count: None,
            request_id: None,
            trace_id: None,
            message: String::new(),
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    pub fn with_resource_type(mut self, resource_type: impl Into<String>) -> Self {
        self.resource_type = Some(resource_type.into());
        self
    }

    pub fn with_resource_id(mut self, id: impl Into<String>) -> Self {
        self.resource_id = Some(id.into());
        self
    }

    /// Add the conditional match URL that produced the error
    pub fn with_match_url(mut self, match_url: impl Into<String>) -> Self {
        self.match_url = Some(match_url.into());
        self
    }

    /// Add the number of candidates a match URL produced
    pub fn with_match_count(mut self, count: usize) -> Self {
        self.match_count = Some(count);
        self
    }

    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    pub fn with_trace_id(mut self, trace_id: TraceId) -> Self {
        self.trace_id = Some(trace_id);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn resource_type(&self) -> Option<&str> {
        self.resource_type.as_deref()
    }

    pub fn resource_id(&self) -> Option<&str> {
        self.resource_id.as_deref()
    }

    pub fn match_url(&self) -> Option<&str> {
        self.match_url.as_deref()
    }

    pub fn match_count(&self) -> Option<usize> {
        self.match_count
    }

    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    pub fn trace_id(&self) -> Option<&TraceId> {
        self.trace_id.as_ref()
    }

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
        if let Some(resource_id) = &self.resource_id {
            write!(f, " (resource: {})", resource_id)?;
        } else if let Some(resource_type) = &self.resource_type {
            write!(f, " (type: {})", resource_type)?;
        }
        if let Some(match_url) = &self.match_url {
            write!(f, " (match: {})", match_url)?;
        }
        if let Some(request_id) = &self.request_id {
            write!(f, " (request_id: {})", request_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {}

// ========== End Error Facility ==========

/// Domain error taxonomy for transaction processing
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResxError {
    // ===== Intake =====
    /// Two entries in one batch name the same resource
    #[error("Transaction bundle contains multiple resources with ID: {resource_id}")]
    DuplicateIdInBatch { resource_id: String },

    /// Entry names a resource type the registry does not know
    #[error("Unknown resource type: {resource_type}")]
    UnknownResourceType { resource_type: String },

    /// Entry content cannot be interpreted as a resource
    #[error("Invalid resource: {reason}")]
    InvalidResource { reason: String },

    // ===== Conditional matching =====
    /// Match URL could not be parsed
    #[error("Malformed match URL \"{match_url}\": {reason}")]
    MalformedCriteria { match_url: String, reason: String },

    /// Match URL names a parameter that is not defined for the type
    #[error("Unknown search parameter '{parameter}' for resource type {resource_type}")]
    UnknownParameter {
        resource_type: String,
        parameter: String,
    },

    /// Match URL resolved to more than one existing resource
    #[error("Failed to {operation} with match URL \"{match_url}\" because this search matched {count} resources")]
    AmbiguousMatch {
        operation: String,
        match_url: String,
        count: usize,
    },

    // ===== Classification =====
    /// Update or delete without a usable identifier or match
    #[error("Cannot {operation} {resource_type}: no resource ID and no conditional match")]
    MissingIdentifier {
        operation: String,
        resource_type: String,
    },

    /// Conditional delete whose match URL found nothing
    #[error("Conditional delete of {resource_type} matched no resources: {match_url}")]
    UnresolvableTarget {
        resource_type: String,
        match_url: String,
    },

    /// Delete by id of a resource that does not exist
    #[error("Resource not found: {resource_id}")]
    ResourceNotFound { resource_id: String },

    /// Client-assigned id that the store cannot accept
    #[error("Invalid client-assigned ID {resource_id}: {reason}")]
    InvalidForcedId { resource_id: String, reason: String },

    // ===== Generic =====
    /// Serialization error (JSON encoding/decoding)
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// Failure raised by a store collaborator, surfaced unchanged
    #[error(transparent)]
    Store(#[from] ExError),
}

/// Conversion from ResxError to ExError
impl From<ResxError> for ExError {
    fn from(err: ResxError) -> Self {
        match err {
            ResxError::DuplicateIdInBatch { resource_id } => {
                ExError::new(ExErrorKind::DuplicateId)
                    .with_op("intake")
                    .with_resource_id(resource_id)
                    .with_message("Transaction bundle contains duplicate resource IDs")
            }

            ResxError::UnknownResourceType { resource_type } => {
                ExError::new(ExErrorKind::UnknownResourceType)
                    .with_op("intake")
                    .with_message(format!("Unknown resource type: {}", resource_type))
                    .with_resource_type(resource_type)
            }

            ResxError::InvalidResource { reason } => {
                ExError::new(ExErrorKind::InvalidResource).with_message(reason)
            }

            ResxError::MalformedCriteria { match_url, reason } => {
                ExError::new(ExErrorKind::MalformedCriteria)
                    .with_op("resolve_match")
                    .with_match_url(match_url)
                    .with_message(reason)
            }

            ResxError::UnknownParameter {
                resource_type,
                parameter,
            } => ExError::new(ExErrorKind::UnknownParameter)
                .with_op("resolve_match")
                .with_message(format!("Unknown search parameter '{}'", parameter))
                .with_resource_type(resource_type),

            ResxError::AmbiguousMatch {
                operation,
                match_url,
                count,
            } => ExError::new(ExErrorKind::AmbiguousMatch)
                .with_op("classify")
                .with_message(format!(
                    "Failed to {} with match URL because this search matched {} resources",
                    operation, count
                ))
                .with_match_url(match_url)
                .with_match_count(count),

            ResxError::MissingIdentifier {
                operation,
                resource_type,
            } => ExError::new(ExErrorKind::MissingIdentifier)
                .with_op("classify")
                .with_message(format!("Cannot {} without a resource ID", operation))
                .with_resource_type(resource_type),

            ResxError::UnresolvableTarget {
                resource_type,
                match_url,
            } => ExError::new(ExErrorKind::UnresolvableTarget)
                .with_op("classify")
                .with_message("Conditional delete matched no resources")
                .with_resource_type(resource_type)
                .with_match_url(match_url),

            ResxError::ResourceNotFound { resource_id } => ExError::new(ExErrorKind::NotFound)
                .with_op("classify")
                .with_resource_id(resource_id)
                .with_message("Resource not found"),

            ResxError::InvalidForcedId {
                resource_id,
                reason,
            } => ExError::new(ExErrorKind::InvalidForcedId)
                .with_op("classify")
                .with_resource_id(resource_id)
                .with_message(reason),

            ResxError::Serialization { message } => {
                ExError::new(ExErrorKind::Serialization).with_message(message)
            }

            ResxError::Store(inner) => inner,
        }
    }
}

/// Conversion from serde_json::Error to ResxError
impl From<serde_json::Error> for ResxError {
    fn from(err: serde_json::Error) -> Self {
        ResxError::Serialization {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_error_kind_codes() {
        let cases = [
            (ExErrorKind::DuplicateId, "ERR_DUPLICATE_ID_IN_BATCH"),
            (ExErrorKind::MalformedCriteria, "ERR_MALFORMED_CRITERIA"),
            (ExErrorKind::UnknownParameter, "ERR_UNKNOWN_PARAMETER"),
            (ExErrorKind::AmbiguousMatch, "ERR_AMBIGUOUS_MATCH"),
            (ExErrorKind::MissingIdentifier, "ERR_MISSING_IDENTIFIER"),
            (ExErrorKind::UnresolvableTarget, "ERR_UNRESOLVABLE_TARGET"),
        ];
        for (kind, expected_code) in cases {
            assert_eq!(kind.code(), expected_code, "Wrong code for {:?}", kind);
        }
    }

    #[test]
    fn test_ambiguous_match_carries_count_and_url() {
        let err: ExError = ResxError::AmbiguousMatch {
            operation: "CREATE".to_string(),
            match_url: "identifier=a|1".to_string(),
            count: 3,
        }
        .into();

        assert_eq!(err.kind(), ExErrorKind::AmbiguousMatch);
        assert_eq!(err.match_count(), Some(3));
        assert_eq!(err.match_url(), Some("identifier=a|1"));
    }

    #[test]
    fn test_store_error_passes_through_unchanged() {
        let inner = ExError::new(ExErrorKind::Persistence)
            .with_op("flush")
            .with_message("disk full");
        let err: ResxError = inner.clone().into();
        let back: ExError = err.into();
        assert_eq!(back, inner);
    }

    #[test]
    fn test_display_includes_code_and_context() {
        let err = ExError::new(ExErrorKind::NotFound)
            .with_op("classify")
            .with_resource_id("Patient/7")
            .with_message("Resource not found");
        let text = err.to_string();
        assert!(text.starts_with("[ERR_NOT_FOUND]"));
        assert!(text.contains("Patient/7"));
    }
}
