//! Dangerous operation pattern catalog
//!
//! A fixed, ordered table of case-insensitive regexes evaluated
//! top-to-bottom against the raw source text. This is deliberately not an
//! AST pass: it stays fast and total over arbitrary (even non-Python)
//! input, at the cost of over-matching string literals and under-matching
//! obfuscated attribute access.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::safety::report::{OpCategory, OperationMatch, RiskLevel};

/// One entry in the pattern catalog
pub(crate) struct PatternRule {
    pub regex: Regex,
    pub category: OpCategory,
    pub severity: RiskLevel,
    pub description: &'static str,
}

fn rule(
    pattern: &str,
    category: OpCategory,
    severity: RiskLevel,
    description: &'static str,
) -> PatternRule {
    // Static table entries; a failure to compile is a programming error.
    let regex = Regex::new(&format!("(?i){pattern}")).expect("invalid catalog pattern");
    PatternRule {
        regex,
        category,
        severity,
        description,
    }
}

/// The ordered pattern catalog
///
/// Extending this table is fine; narrowing it below the documented minimum
/// (file I/O, system tokens, dynamic eval, network, destructive scene ops,
/// curated window-manager ops) is not.
pub(crate) static PATTERN_CATALOG: Lazy<Vec<PatternRule>> = Lazy::new(|| {
    use OpCategory::*;
    use RiskLevel::*;

    vec![
        // File operations
        rule(r"\bopen\s*\(", FileOp, High, "File operations detected"),
        rule(r"\bfile\s*\(", FileOp, High, "File operations detected"),
        rule(r"\.read\s*\(", FileOp, High, "File read operation"),
        rule(r"\.write\s*\(", FileOp, High, "File write operation"),
        // System operations
        rule(r"\bos\b", SystemOp, Critical, "Operating system access"),
        rule(r"\bsys\b", SystemOp, Critical, "System module access"),
        rule(r"\bsubprocess\b", SystemOp, Critical, "Subprocess execution"),
        rule(r"\bthreading\b", SystemOp, High, "Threading operations"),
        rule(
            r"\bmultiprocessing\b",
            SystemOp,
            High,
            "Multiprocessing operations",
        ),
        // Dynamic evaluation
        rule(r"\beval\s*\(", DynamicEval, Critical, "Dynamic code evaluation"),
        rule(r"\bexec\s*\(", DynamicEval, Critical, "Dynamic code execution"),
        rule(
            r"\b__import__\s*\(",
            DynamicEval,
            Critical,
            "Dynamic module import",
        ),
        rule(r"\bcompile\s*\(", DynamicEval, Critical, "Dynamic code compilation"),
        // Network operations
        rule(r"\burllib\b", NetworkOp, High, "Network access"),
        rule(r"\brequests\b", NetworkOp, High, "HTTP requests"),
        rule(r"\bsocket\b", NetworkOp, High, "Socket operations"),
        // Destructive scene operations
        rule(
            r"bpy\.data\..*\.remove\s*\(",
            DestructiveOp,
            High,
            "Data removal operation",
        ),
        rule(
            r"bpy\.ops\..*\.delete",
            DestructiveOp,
            High,
            "Delete operation",
        ),
        rule(r"\.delete\s*\(", DestructiveOp, High, "Delete operation"),
        rule(r"\.clear\s*\(", DestructiveOp, High, "Clear operation"),
        rule(
            r"bpy\.context\.scene\.objects\.unlink",
            DestructiveOp,
            Medium,
            "Object unlink operation",
        ),
        // Curated window-manager operations
        rule(
            r"bpy\.ops\.wm\.quit",
            BlenderOp,
            Critical,
            "Blender quit operation",
        ),
        rule(r"bpy\.ops\.wm\.save", BlenderOp, High, "File save operation"),
        rule(r"bpy\.ops\.wm\.open", BlenderOp, High, "File open operation"),
        // Benign scene operations, recorded but not penalized
        rule(
            r"bpy\.ops\.material\.new",
            BlenderOp,
            Low,
            "Material creation",
        ),
        rule(
            r"bpy\.ops\.mesh\.primitive",
            BlenderOp,
            Low,
            "Primitive creation",
        ),
        rule(r"bpy\.ops\.transform\.", BlenderOp, Low, "Transform operation"),
    ]
});

/// 1-based line number of a byte offset into `text`
fn line_of(text: &str, offset: usize) -> usize {
    text[..offset].bytes().filter(|&b| b == b'\n').count() + 1
}

/// Scan `code` against the catalog, producing findings in catalog order
/// (then match order within each pattern)
pub(crate) fn scan(code: &str) -> Vec<OperationMatch> {
    let mut findings = Vec::new();
    for rule in PATTERN_CATALOG.iter() {
        for m in rule.regex.find_iter(code) {
            findings.push(OperationMatch {
                category: rule.category,
                description: rule.description.to_string(),
                line: line_of(code, m.start()),
                matched_text: m.as_str().to_string(),
                severity: rule.severity,
            });
        }
    }
    findings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_compiles() {
        assert!(!PATTERN_CATALOG.is_empty());
    }

    #[test]
    fn test_line_numbers() {
        let code = "x = 1\ny = 2\neval(\"1+1\")\n";
        let findings = scan(code);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].line, 3);
        assert_eq!(findings[0].matched_text, "eval(");
        assert_eq!(findings[0].severity, RiskLevel::Critical);
    }

    #[test]
    fn test_case_insensitive() {
        let findings = scan("EVAL (x)");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].category, OpCategory::DynamicEval);
    }

    #[test]
    fn test_word_boundaries() {
        // "os" inside larger identifiers must not match
        assert!(scan("position = cost").is_empty());
        assert_eq!(scan("import os").len(), 1);
    }

    #[test]
    fn test_data_removal_pattern() {
        let findings = scan(r#"bpy.data.objects.remove(bpy.data.objects["Cube"])"#);
        assert!(findings
            .iter()
            .any(|f| f.description == "Data removal operation"
                && f.severity == RiskLevel::High
                && f.category == OpCategory::DestructiveOp));
    }

    #[test]
    fn test_benign_blender_ops_are_low() {
        let findings = scan("bpy.ops.mesh.primitive_cube_add(size=2)");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, RiskLevel::Low);
        assert_eq!(findings[0].category, OpCategory::BlenderOp);
    }

    #[test]
    fn test_wm_quit_is_critical() {
        let findings = scan("bpy.ops.wm.quit_blender()");
        assert!(findings
            .iter()
            .any(|f| f.severity == RiskLevel::Critical && f.category == OpCategory::BlenderOp));
    }

    #[test]
    fn test_scan_order_is_stable() {
        let code = "open('f')\neval('x')\nopen('g')";
        let a = scan(code);
        let b = scan(code);
        assert_eq!(a, b);
        // Catalog order: both `open` matches precede the `eval` match
        assert_eq!(a[0].line, 1);
        assert_eq!(a[1].line, 3);
        assert_eq!(a[2].line, 2);
    }

    #[test]
    fn test_garbage_input_is_handled() {
        let findings = scan("�� not python at all {{{ \u{0} \n\n\t]]");
        assert!(findings.is_empty());
    }
}
