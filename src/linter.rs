//! Catalog linting - static analysis of catalog files.
//!
//! Checks each catalog file for:
//! - JSON syntax errors (E001)
//! - catalog structure violations (E002)
//! - malformed documentation (E003)
//! - schema conversion failures (E004)
//!
//! and reports synthesis advisories as warnings: undocumented fields (W001),
//! unions of different scalars (W002) and untyped `any` fields (W003).

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{LoadError, SchemaError};
use crate::loader::{catalog_documents, load_json};
use crate::synth::{AdvisoryKind, TypeSynthesizer};
use crate::types::{Catalog, DocumentCatalog};

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A single diagnostic message from linting.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: String,
    pub file: PathBuf,
    /// JSON Pointer into the catalog file, or the generated name of the
    /// affected field for synthesis diagnostics.
    pub path: String,
    pub message: String,
}

/// Result of linting a single file.
#[derive(Debug, Clone, Serialize)]
pub struct FileResult {
    pub file: PathBuf,
    pub status: FileStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

/// Status of a linted file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Ok,
    Error,
    Warning,
}

/// Result of linting a directory or set of files.
#[derive(Debug, Clone, Serialize)]
pub struct LintResult {
    pub path: PathBuf,
    pub files_checked: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    pub warnings: usize,
    pub results: Vec<FileResult>,
}

impl LintResult {
    /// Returns true if all files passed (no errors).
    pub fn is_ok(&self) -> bool {
        self.errors == 0
    }
}

/// Lint a file or directory.
///
/// If path is a directory, recursively finds all .json files.
/// If `strict` is true, warnings are treated as errors.
pub fn lint(path: &Path, strict: bool) -> LintResult {
    let files = collect_catalog_files(path);
    let mut results = Vec::new();
    let mut total_errors = 0;
    let mut total_warnings = 0;

    for file in &files {
        let file_result = lint_file(file, path);
        total_errors += file_result
            .diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count();
        total_warnings += file_result
            .diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count();
        results.push(file_result);
    }

    let failed = results
        .iter()
        .filter(|r| {
            if strict {
                r.status != FileStatus::Ok
            } else {
                r.status == FileStatus::Error
            }
        })
        .count();

    LintResult {
        path: path.to_path_buf(),
        files_checked: files.len(),
        passed: files.len() - failed,
        failed,
        errors: total_errors,
        warnings: total_warnings,
        results,
    }
}

/// Lint a single catalog file.
pub fn lint_file(file: &Path, base_path: &Path) -> FileResult {
    let mut report = Report::new(file);
    check_file(file, &mut report);
    report.finish(file.strip_prefix(base_path).unwrap_or(file))
}

// --- Internal implementation ---

struct Report {
    file: PathBuf,
    diagnostics: Vec<Diagnostic>,
}

impl Report {
    fn new(file: &Path) -> Self {
        Self {
            file: file.to_path_buf(),
            diagnostics: Vec::new(),
        }
    }

    fn push(&mut self, severity: Severity, code: &str, path: impl Into<String>, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            severity,
            code: code.to_string(),
            file: self.file.clone(),
            path: path.into(),
            message: message.into(),
        });
    }

    fn finish(self, file: &Path) -> FileResult {
        let has = |severity| self.diagnostics.iter().any(|d| d.severity == severity);
        let status = if has(Severity::Error) {
            FileStatus::Error
        } else if has(Severity::Warning) {
            FileStatus::Warning
        } else {
            FileStatus::Ok
        };

        FileResult {
            file: file.to_path_buf(),
            status,
            diagnostics: self.diagnostics,
        }
    }
}

fn check_file(file: &Path, report: &mut Report) {
    let value = match load_json(file) {
        Ok(value) => value,
        Err(e) => {
            report.push(Severity::Error, "E001", "/", format!("syntax error: {e}"));
            return;
        }
    };

    let documents = match catalog_documents(&value) {
        Ok(documents) => documents,
        Err(LoadError::InvalidCatalog { errors }) => {
            for SchemaError { path, message } in errors {
                let path = if path.is_empty() { "/".to_string() } else { path };
                report.push(Severity::Error, "E002", path, message);
            }
            return;
        }
        Err(e) => {
            report.push(Severity::Error, "E002", "/", e.to_string());
            return;
        }
    };

    let mut catalog = Catalog::new();
    for (i, document) in documents.into_iter().enumerate() {
        let pointer = format!("/documents/{i}/{}", document.docs_pointer());
        match document.into_definition() {
            Ok(definition) => catalog.insert(definition),
            Err(e) => report.push(Severity::Error, "E003", pointer, e.to_string()),
        }
    }

    check_synthesis(catalog, report);
}

fn check_synthesis(catalog: Catalog, report: &mut Report) {
    let kinds = catalog.kinds();
    let synth = TypeSynthesizer::new(catalog);

    for kind in kinds {
        if let Err(e) = synth.document_type(kind) {
            report.push(Severity::Error, "E004", e.path(), e.to_string());
        }
    }

    for advisory in synth.advisories() {
        let code = match advisory.kind {
            AdvisoryKind::Undocumented => "W001",
            AdvisoryKind::ScalarUnion => "W002",
            AdvisoryKind::Untyped => "W003",
        };
        report.push(Severity::Warning, code, advisory.path, advisory.message);
    }
}

/// Collect all .json files in a path (file or directory).
fn collect_catalog_files(path: &Path) -> Vec<PathBuf> {
    if path.is_file() {
        if path.extension().map(|e| e == "json").unwrap_or(false) {
            return vec![path.to_path_buf()];
        }
        return vec![];
    }

    let mut files = Vec::new();
    collect_files_recursive(path, &mut files);
    files.sort();
    files
}

fn collect_files_recursive(dir: &Path, files: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_files_recursive(&path, files);
        } else if path.extension().map(|e| e == "json").unwrap_or(false) {
            files.push(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use tempfile::tempdir;

    fn write(dir: &Path, name: &str, value: &Value) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, serde_json::to_string_pretty(value).unwrap()).unwrap();
        path
    }

    fn document(fields: Value, docs: Value) -> Value {
        json!({
            "documents": [{
                "kind": "app",
                "name": "AppConfiguration",
                "schema": { "type": "object", "fields": fields },
                "docs": docs
            }]
        })
    }

    #[test]
    fn lint_clean_catalog() {
        let dir = tempdir().unwrap();
        let file = write(
            dir.path(),
            "app.json",
            &document(json!({ "name": { "type": "string" } }), json!({ "name": "App name" })),
        );

        let result = lint_file(&file, dir.path());
        assert_eq!(result.status, FileStatus::Ok);
        assert!(result.diagnostics.is_empty());
        assert_eq!(result.file, Path::new("app.json"));
    }

    #[test]
    fn lint_invalid_json_syntax() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("bad.json");
        std::fs::write(&file, "{ not valid json }").unwrap();

        let result = lint_file(&file, dir.path());
        assert_eq!(result.status, FileStatus::Error);
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].code, "E001");
    }

    #[test]
    fn lint_structure_error() {
        let dir = tempdir().unwrap();
        let file = write(dir.path(), "bad.json", &json!({ "documents": [{ "kind": "app" }] }));

        let result = lint_file(&file, dir.path());
        assert_eq!(result.status, FileStatus::Error);
        assert!(result.diagnostics.iter().all(|d| d.code == "E002"));
    }

    #[test]
    fn lint_documentation_error() {
        let dir = tempdir().unwrap();
        let file = write(
            dir.path(),
            "doc.json",
            &json!({
                "documents": [{
                    "kind": "app",
                    "name": "AppConfiguration",
                    "schema": { "type": "object", "fields": {} },
                    "docstring": "Only prose."
                }]
            }),
        );

        let result = lint_file(&file, dir.path());
        let diagnostic = &result.diagnostics[0];
        assert_eq!(diagnostic.code, "E003");
        assert_eq!(diagnostic.path, "/documents/0/docstring");
    }

    #[test]
    fn lint_conversion_error() {
        let dir = tempdir().unwrap();
        let file = write(
            dir.path(),
            "mixed.json",
            &document(
                json!({
                    "value": {
                        "type": "union",
                        "alternatives": [
                            { "type": "string" },
                            { "type": "object", "fields": { "x": { "type": "string" } } }
                        ]
                    }
                }),
                json!({ "value": { "<<text>>": "A value", "x": "X" } }),
            ),
        );

        let result = lint_file(&file, dir.path());
        assert_eq!(result.status, FileStatus::Error);
        let diagnostic = result.diagnostics.iter().find(|d| d.code == "E004").unwrap();
        assert_eq!(diagnostic.path, "AppConfigurationValue");
    }

    #[test]
    fn lint_advisories_are_warnings() {
        let dir = tempdir().unwrap();
        let file = write(
            dir.path(),
            "warn.json",
            &document(
                json!({
                    "hidden": { "type": "string" },
                    "extra": { "type": "any" },
                    "port": {
                        "type": "union",
                        "alternatives": [{ "type": "string" }, { "type": "integer" }]
                    }
                }),
                json!({ "extra": "Anything", "port": "A port" }),
            ),
        );

        let result = lint_file(&file, dir.path());
        assert_eq!(result.status, FileStatus::Warning);
        let codes: Vec<&str> = result.diagnostics.iter().map(|d| d.code.as_str()).collect();
        assert_eq!(codes, ["W001", "W003", "W002"]);
    }

    #[test]
    fn failed_kinds_report_no_advisories() {
        let dir = tempdir().unwrap();
        let file = write(
            dir.path(),
            "failing.json",
            &json!({
                "documents": [
                    {
                        "kind": "app",
                        "name": "AppConfiguration",
                        "schema": {
                            "type": "object",
                            "fields": {
                                "hidden": { "type": "string" },
                                "check": {
                                    "type": "validated",
                                    "validator": { "kind": "custom", "name": "Regex" }
                                }
                            }
                        },
                        "docs": { "check": "Checked value" }
                    },
                    {
                        "kind": "project",
                        "name": "ProjectConfiguration",
                        "schema": {
                            "type": "object",
                            "fields": { "app": { "type": "reference", "target": "app" } }
                        },
                        "docs": { "app": "The app" }
                    }
                ]
            }),
        );

        let result = lint_file(&file, dir.path());
        assert_eq!(result.status, FileStatus::Error);
        let codes: Vec<&str> = result.diagnostics.iter().map(|d| d.code.as_str()).collect();
        assert_eq!(codes, ["E004", "E004"]);
    }

    #[test]
    fn lint_directory_and_strict_mode() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            "warn.json",
            &document(
                json!({ "name": { "type": "string" }, "hidden": { "type": "string" } }),
                json!({ "name": "App name" }),
            ),
        );
        std::fs::write(dir.path().join("invalid.json"), "{ not json }").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let result = lint(dir.path(), false);
        assert_eq!(result.files_checked, 2);
        assert_eq!(result.passed, 1);
        assert_eq!(result.failed, 1);
        assert_eq!(result.warnings, 1);
        assert!(!result.is_ok());

        let result = lint(dir.path(), true);
        assert_eq!(result.passed, 0);
        assert_eq!(result.failed, 2);
    }
}
