use qsig_audit_log::AuditLogError;
use qsig_core::{IntegrityError, StorageError};

/// Command failure reported as `<reason>[: <detail>]`, with `reason` a stable
/// snake_case code.
#[derive(Debug)]
pub struct CliError {
    reason: &'static str,
    detail: Option<String>,
}

impl CliError {
    pub fn new(reason: &'static str) -> Self {
        Self {
            reason,
            detail: None,
        }
    }

    pub fn with_detail(reason: &'static str, detail: String) -> Self {
        Self {
            reason,
            detail: Some(detail),
        }
    }

    pub fn reason(&self) -> &'static str {
        self.reason
    }

    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.detail.as_ref() {
            Some(detail) => write!(f, "{}: {}", self.reason, detail),
            None => write!(f, "{}", self.reason),
        }
    }
}

impl std::error::Error for CliError {}

impl From<IntegrityError> for CliError {
    fn from(e: IntegrityError) -> Self {
        CliError::with_detail(e.reason(), e.to_string())
    }
}

impl From<StorageError> for CliError {
    fn from(e: StorageError) -> Self {
        CliError::with_detail("storage_failed", e.to_string())
    }
}

impl From<AuditLogError> for CliError {
    fn from(e: AuditLogError) -> Self {
        CliError::with_detail("audit_failed", e.to_string())
    }
}
