use crate::command::{
    AuditVerifyArgs, InputSource, ListArgs, RegisterArgs, ShowArgs, SignatureArgs, VerifyArgs,
};
use crate::config::default_runtime_root;
use crate::error::CliError;
use crate::runner::{
    run_audit_verify, run_list, run_register, run_show, run_signature, run_verify,
};
use std::path::PathBuf;

const USAGE: &str = "usage: integrityd <register|verify|show|list|signature|audit-verify> [flags]";

#[derive(Debug, PartialEq)]
pub(crate) enum Command {
    Register(RegisterArgs),
    Verify(VerifyArgs),
    Show(ShowArgs),
    List(ListArgs),
    Signature(SignatureArgs),
    AuditVerify(AuditVerifyArgs),
}

/// Flags shared by the commands that read content.
#[derive(Default)]
struct ContentFlags {
    runtime_root: Option<PathBuf>,
    identifier: Option<String>,
    source: Option<InputSource>,
    tolerance: Option<f64>,
    comparison: bool,
}

fn set_once<T>(slot: &mut Option<T>, value: T, flag: &str) -> Result<(), String> {
    if slot.is_some() {
        return Err(format!("multiple values provided for {}", flag));
    }
    *slot = Some(value);
    Ok(())
}

fn parse_content_flags<I>(mut it: I, command: &str, allowed: &[&str]) -> Result<ContentFlags, String>
where
    I: Iterator<Item = String>,
{
    let mut flags = ContentFlags::default();
    while let Some(a) = it.next() {
        if a.starts_with("--") && !allowed.contains(&a.as_str()) {
            if matches!(
                a.as_str(),
                "--runtime" | "--id" | "--in" | "--stdin" | "--tolerance" | "--comparison"
            ) {
                return Err(format!("flag {} is not valid for {}", a, command));
            }
            return Err(format!("unknown flag {}", a));
        }
        match a.as_str() {
            "--runtime" => {
                let v = it.next().ok_or("missing value for --runtime")?;
                set_once(&mut flags.runtime_root, PathBuf::from(v), "--runtime")?;
            }
            "--id" => {
                let v = it.next().ok_or("missing value for --id")?;
                if v.trim().is_empty() {
                    return Err("empty value for --id".to_string());
                }
                set_once(&mut flags.identifier, v, "--id")?;
            }
            "--in" => {
                if flags.source.is_some() {
                    return Err("multiple input sources provided".to_string());
                }
                let v = it.next().ok_or("missing value for --in")?;
                flags.source = Some(InputSource::File(PathBuf::from(v)));
            }
            "--stdin" => {
                if flags.source.is_some() {
                    return Err("multiple input sources provided".to_string());
                }
                flags.source = Some(InputSource::Stdin);
            }
            "--tolerance" => {
                let v = it.next().ok_or("missing value for --tolerance")?;
                let t = v
                    .parse::<f64>()
                    .map_err(|_| "invalid value for --tolerance".to_string())?;
                set_once(&mut flags.tolerance, t, "--tolerance")?;
            }
            "--comparison" => {
                flags.comparison = true;
            }
            _ => return Err(format!("unexpected arg {}", a)),
        }
    }
    Ok(flags)
}

/// `--id`, else the file name of `--in`.
fn resolve_identifier(flags: &ContentFlags) -> Result<String, String> {
    if let Some(id) = flags.identifier.as_ref() {
        return Ok(id.clone());
    }
    match flags.source.as_ref() {
        Some(InputSource::File(path)) => path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| "cannot derive --id from --in path".to_string()),
        _ => Err("missing value for --id".to_string()),
    }
}

fn require_source(flags: &mut ContentFlags) -> Result<InputSource, String> {
    flags
        .source
        .take()
        .ok_or_else(|| "missing input: provide --in <path> or --stdin".to_string())
}

fn parse_register_args_from<I>(it: I) -> Result<RegisterArgs, String>
where
    I: Iterator<Item = String>,
{
    let mut flags = parse_content_flags(it, "register", &["--runtime", "--id", "--in", "--stdin"])?;
    let identifier = resolve_identifier(&flags)?;
    let source = require_source(&mut flags)?;
    Ok(RegisterArgs {
        runtime_root: flags.runtime_root.unwrap_or_else(default_runtime_root),
        identifier,
        source,
    })
}

fn parse_verify_args_from<I>(it: I) -> Result<VerifyArgs, String>
where
    I: Iterator<Item = String>,
{
    let mut flags = parse_content_flags(
        it,
        "verify",
        &[
            "--runtime",
            "--id",
            "--in",
            "--stdin",
            "--tolerance",
            "--comparison",
        ],
    )?;
    let identifier = resolve_identifier(&flags)?;
    let source = require_source(&mut flags)?;
    Ok(VerifyArgs {
        runtime_root: flags.runtime_root.unwrap_or_else(default_runtime_root),
        identifier,
        source,
        tolerance: flags.tolerance,
        comparison: flags.comparison,
    })
}

fn parse_show_args_from<I>(it: I) -> Result<ShowArgs, String>
where
    I: Iterator<Item = String>,
{
    let flags = parse_content_flags(it, "show", &["--runtime", "--id"])?;
    let identifier = flags.identifier.ok_or("missing value for --id")?;
    Ok(ShowArgs {
        runtime_root: flags.runtime_root.unwrap_or_else(default_runtime_root),
        identifier,
    })
}

fn parse_list_args_from<I>(it: I) -> Result<ListArgs, String>
where
    I: Iterator<Item = String>,
{
    let flags = parse_content_flags(it, "list", &["--runtime"])?;
    Ok(ListArgs {
        runtime_root: flags.runtime_root.unwrap_or_else(default_runtime_root),
    })
}

fn parse_signature_args_from<I>(it: I) -> Result<SignatureArgs, String>
where
    I: Iterator<Item = String>,
{
    let mut flags = parse_content_flags(it, "signature", &["--in", "--stdin"])?;
    Ok(SignatureArgs {
        source: require_source(&mut flags)?,
    })
}

fn parse_audit_verify_args_from<I>(it: I) -> Result<AuditVerifyArgs, String>
where
    I: Iterator<Item = String>,
{
    let flags = parse_content_flags(it, "audit-verify", &["--runtime"])?;
    Ok(AuditVerifyArgs {
        runtime_root: flags.runtime_root.unwrap_or_else(default_runtime_root),
    })
}

pub(crate) fn parse_command_from<I>(mut it: I) -> Result<Command, String>
where
    I: Iterator<Item = String>,
{
    let sub = it.next().ok_or_else(|| USAGE.to_string())?;
    match sub.as_str() {
        "register" => Ok(Command::Register(parse_register_args_from(it)?)),
        "verify" => Ok(Command::Verify(parse_verify_args_from(it)?)),
        "show" => Ok(Command::Show(parse_show_args_from(it)?)),
        "list" => Ok(Command::List(parse_list_args_from(it)?)),
        "signature" => Ok(Command::Signature(parse_signature_args_from(it)?)),
        "audit-verify" => Ok(Command::AuditVerify(parse_audit_verify_args_from(it)?)),
        other => Err(format!("unknown command {}; {}", other, USAGE)),
    }
}

fn parse_command() -> Result<Command, CliError> {
    parse_command_from(std::env::args().skip(1)).map_err(|e| CliError::with_detail("usage", e))
}

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let result = match parse_command()? {
        Command::Register(args) => run_register(args),
        Command::Verify(args) => run_verify(args),
        Command::Show(args) => run_show(args),
        Command::List(args) => run_list(args),
        Command::Signature(args) => run_signature(args),
        Command::AuditVerify(args) => run_audit_verify(args),
    };
    Ok(result?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Command, String> {
        parse_command_from(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn register_defaults_identifier_to_file_name() {
        let cmd = parse(&["register", "--in", "docs/report.pdf", "--runtime", "/tmp/rt"]).unwrap();
        assert_eq!(
            cmd,
            Command::Register(RegisterArgs {
                runtime_root: PathBuf::from("/tmp/rt"),
                identifier: "report.pdf".to_string(),
                source: InputSource::File(PathBuf::from("docs/report.pdf")),
            })
        );
    }

    #[test]
    fn stdin_requires_explicit_identifier() {
        let err = parse(&["register", "--stdin", "--runtime", "/tmp/rt"]).unwrap_err();
        assert!(err.contains("--id"), "{}", err);
        let ok = parse(&["register", "--stdin", "--id", "blob", "--runtime", "/tmp/rt"]).unwrap();
        assert!(matches!(
            ok,
            Command::Register(RegisterArgs { ref identifier, source: InputSource::Stdin, .. })
                if identifier == "blob"
        ));
    }

    #[test]
    fn verify_flags() {
        let cmd = parse(&[
            "verify",
            "--id",
            "f",
            "--in",
            "f.bin",
            "--tolerance",
            "0.01",
            "--comparison",
            "--runtime",
            "/tmp/rt",
        ])
        .unwrap();
        match cmd {
            Command::Verify(args) => {
                assert_eq!(args.identifier, "f");
                assert_eq!(args.tolerance, Some(0.01));
                assert!(args.comparison);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse(&[]).is_err());
        assert!(parse(&["frobnicate"]).is_err());
        assert!(parse(&["register", "--id", "x"]).is_err());
        assert!(parse(&["register", "--in", "a", "--stdin"]).is_err());
        assert!(parse(&["register", "--in", "a", "--comparison"])
            .unwrap_err()
            .contains("not valid for register"));
        assert!(parse(&["verify", "--in", "a", "--tolerance", "lots"]).is_err());
        assert!(parse(&["show"]).is_err());
        assert!(parse(&["list", "--bogus"])
            .unwrap_err()
            .contains("unknown flag"));
        assert!(parse(&["list", "stray"]).is_err());
        assert!(parse(&["register", "--id", "a", "--id", "b", "--in", "x"])
            .unwrap_err()
            .contains("multiple values"));
    }

    #[test]
    fn signature_needs_no_runtime() {
        let cmd = parse(&["signature", "--in", "x.bin"]).unwrap();
        assert_eq!(
            cmd,
            Command::Signature(SignatureArgs {
                source: InputSource::File(PathBuf::from("x.bin")),
            })
        );
    }
}
