use crate::audit::{open_audit, record_committed, AuditEvent};
use crate::command::{
    AuditVerifyArgs, InputSource, ListArgs, RegisterArgs, ShowArgs, SignatureArgs, VerifyArgs,
};
use crate::config::{audit_log_path, load_config};
use crate::error::CliError;
use qsig_audit_log::verify_log;
use qsig_core::{digest, fingerprint, IntegrityError, Registry, Verifier, VerifierPolicy};
use qsig_registry::JsonFileRegistry;
use serde_json::json;
use std::io::Read;
use std::path::Path;
use uuid::Uuid;

fn new_run_id() -> String {
    Uuid::new_v4().to_string()
}

pub(crate) fn read_input(source: &InputSource) -> Result<Vec<u8>, CliError> {
    match source {
        InputSource::File(path) => std::fs::read(path).map_err(|e| {
            CliError::with_detail("input_read_failed", format!("{}: {}", path.display(), e))
        }),
        InputSource::Stdin => {
            let mut buf = Vec::new();
            std::io::stdin()
                .read_to_end(&mut buf)
                .map_err(|e| CliError::with_detail("input_read_failed", e.to_string()))?;
            Ok(buf)
        }
    }
}

fn open_registry(runtime_root: &Path) -> Result<(JsonFileRegistry, VerifierPolicy), CliError> {
    let config = load_config(runtime_root)?;
    let policy = config.policy(None)?;
    let registry = JsonFileRegistry::open(config.registry_path(runtime_root))?;
    Ok((registry, policy))
}

fn emit(payload: &serde_json::Value) -> Result<(), CliError> {
    let output = serde_json::to_string(payload)
        .map_err(|e| CliError::with_detail("output_failed", e.to_string()))?;
    println!("{}", output);
    Ok(())
}

pub(crate) fn run_register(args: RegisterArgs) -> Result<(), CliError> {
    let bytes = read_input(&args.source)?;
    let (registry, policy) = open_registry(&args.runtime_root)?;
    // a broken log fails the run before anything is committed
    let mut audit = open_audit(&audit_log_path(&args.runtime_root))?;
    let record = Verifier::new(policy).register_content(&registry, &args.identifier, &bytes)?;

    record_committed(
        &mut audit,
        &AuditEvent::ContentRegistered {
            run_id: new_run_id(),
            identifier: record.identifier.clone(),
            length: bytes.len(),
            signature: record.signature,
            digest: record.digest.clone(),
        },
    );

    emit(&json!({
        "ok": true,
        "identifier": record.identifier,
        "signature": record.signature,
        "digest": record.digest,
    }))
}

pub(crate) fn run_verify(args: VerifyArgs) -> Result<(), CliError> {
    let run_id = new_run_id();
    let bytes = read_input(&args.source)?;

    let config = load_config(&args.runtime_root)?;
    let policy = config.policy(args.tolerance)?;
    let mut audit = open_audit(&audit_log_path(&args.runtime_root))?;
    let verifier = Verifier::new(policy);
    let outcome = JsonFileRegistry::open(config.registry_path(&args.runtime_root))
        .map_err(|source| IntegrityError::Storage {
            identifier: args.identifier.clone(),
            operation: qsig_core::StorageOp::Get,
            source,
        })
        .and_then(|registry| {
            verifier.verify_with_comparison(&registry, &args.identifier, &bytes)
        });

    let (verdict, comparison) = match outcome {
        Ok(v) => v,
        Err(e) => {
            record_committed(
                &mut audit,
                &AuditEvent::VerificationRejected {
                    run_id,
                    identifier: args.identifier.clone(),
                    reason: e.reason().to_string(),
                },
            );
            return Err(e.into());
        }
    };

    record_committed(
        &mut audit,
        &AuditEvent::ContentVerified {
            run_id,
            identifier: args.identifier.clone(),
            integrity_status: verdict.integrity_status,
            signature_delta: verdict.signature_delta,
            digest_matches: verdict.digest_matches,
            tolerance_threshold: policy.tolerance_threshold(),
        },
    );

    let mut payload = json!({
        "ok": true,
        "identifier": args.identifier,
        "verdict": verdict,
    });
    if args.comparison {
        payload["comparison"] = serde_json::to_value(&comparison)
            .map_err(|e| CliError::with_detail("output_failed", e.to_string()))?;
    }
    emit(&payload)
}

pub(crate) fn run_show(args: ShowArgs) -> Result<(), CliError> {
    let (registry, _) = open_registry(&args.runtime_root)?;
    let record = registry
        .get(&args.identifier)?
        .ok_or_else(|| IntegrityError::NotFound {
            identifier: args.identifier.clone(),
        })?;
    emit(&json!({
        "ok": true,
        "identifier": record.identifier,
        "signature": record.signature,
        "digest": record.digest,
    }))
}

pub(crate) fn run_list(args: ListArgs) -> Result<(), CliError> {
    let (registry, _) = open_registry(&args.runtime_root)?;
    let identifiers = registry.list_identifiers()?;
    emit(&json!({
        "ok": true,
        "identifiers": identifiers,
    }))
}

pub(crate) fn run_signature(args: SignatureArgs) -> Result<(), CliError> {
    let bytes = read_input(&args.source)?;
    emit(&json!({
        "ok": true,
        "length": bytes.len(),
        "signature": fingerprint(&bytes),
        "digest": digest(&bytes),
    }))
}

pub(crate) fn run_audit_verify(args: AuditVerifyArgs) -> Result<(), CliError> {
    let last_hash = verify_log(audit_log_path(&args.runtime_root))?;
    emit(&json!({
        "ok": true,
        "last_hash": last_hash,
    }))
}
