use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    File(PathBuf),
    Stdin,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegisterArgs {
    pub runtime_root: PathBuf,
    pub identifier: String,
    pub source: InputSource,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VerifyArgs {
    pub runtime_root: PathBuf,
    pub identifier: String,
    pub source: InputSource,
    pub tolerance: Option<f64>,
    pub comparison: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShowArgs {
    pub runtime_root: PathBuf,
    pub identifier: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListArgs {
    pub runtime_root: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignatureArgs {
    pub source: InputSource,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AuditVerifyArgs {
    pub runtime_root: PathBuf,
}
