//! JSON diagnostic report, section 4.12 / §6's `toJson` contract. Built
//! with `serde_json::json!` as an ad hoc object rather than a dedicated
//! report struct, since the shape here is a thin, rarely-reused view over
//! `Diagnostic`.

use diagramlint_core::{Diagnostics, Severity};
use serde_json::{json, Value};

pub fn to_json(file: &str, diagnostics: &Diagnostics) -> Value {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    for diag in diagnostics.iter() {
        let entry = json!({
            "line": diag.position.line,
            "column": diag.position.column,
            "severity": diag.severity,
            "code": diag.code,
            "message": diag.message,
            "hint": diag.hint,
            "length": diag.position.length,
        });
        match diag.severity {
            Severity::Error => errors.push(entry),
            Severity::Warning => warnings.push(entry),
        }
    }

    json!({
        "file": file,
        "valid": !diagnostics.has_errors(),
        "errorCount": diagnostics.error_count(),
        "warningCount": diagnostics.warning_count(),
        "errors": errors,
        "warnings": warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use diagramlint_core::Position;

    #[test]
    fn valid_is_false_when_any_error_present() {
        let mut diags = Diagnostics::new();
        diags.error(Position::new(1, 1), "bad").code("FL-DIR-MISSING").emit();
        let report = to_json("a.mmd", &diags);
        assert_eq!(report["valid"], false);
        assert_eq!(report["errorCount"], 1);
        assert_eq!(report["errors"][0]["code"], "FL-DIR-MISSING");
    }

    #[test]
    fn valid_is_true_with_only_warnings() {
        let mut diags = Diagnostics::new();
        diags.warning(Position::new(1, 1), "hmm").code("FL-LABEL-ESCAPED-QUOTE").emit();
        let report = to_json("a.mmd", &diags);
        assert_eq!(report["valid"], true);
        assert_eq!(report["warningCount"], 1);
    }

    #[test]
    fn no_diagnostics_yields_empty_arrays() {
        let diags = Diagnostics::new();
        let report = to_json("a.mmd", &diags);
        assert_eq!(report["errors"].as_array().unwrap().len(), 0);
        assert_eq!(report["warnings"].as_array().unwrap().len(), 0);
    }
}
