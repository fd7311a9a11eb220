use crate::error::CliError;
use qsig_audit_log::AuditAppender;
use qsig_core::IntegrityStatus;
use serde::Serialize;
use std::path::Path;

pub const AUDIT_SCHEMA: &str = "integrityd.audit.v1";

#[derive(Debug, Serialize)]
struct AuditEnvelope<'a> {
    schema: &'static str,
    event: &'a AuditEvent,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case", tag = "event_type")]
pub(crate) enum AuditEvent {
    ContentRegistered {
        run_id: String,
        identifier: String,
        length: usize,
        signature: f64,
        digest: String,
    },
    ContentVerified {
        run_id: String,
        identifier: String,
        integrity_status: IntegrityStatus,
        signature_delta: f64,
        digest_matches: bool,
        tolerance_threshold: f64,
    },
    VerificationRejected {
        run_id: String,
        identifier: String,
        reason: String,
    },
}

/// Open the run's audit log, refusing to start when the chain is broken.
pub(crate) fn open_audit(audit_path: &Path) -> Result<AuditAppender, CliError> {
    Ok(AuditAppender::open(audit_path)?)
}

fn append_event(
    audit: &mut AuditAppender,
    event: &AuditEvent,
) -> Result<String, CliError> {
    let envelope = AuditEnvelope {
        schema: AUDIT_SCHEMA,
        event,
    };
    Ok(audit.append(&envelope)?)
}

/// Append once the outcome is settled. A failure here cannot undo the
/// outcome, so it is reported on stderr and the run still succeeds.
pub(crate) fn record_committed(audit: &mut AuditAppender, event: &AuditEvent) {
    if let Err(e) = append_event(audit, event) {
        eprintln!("warning: {}", e);
    }
}
