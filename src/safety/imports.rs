//! Import statement analysis
//!
//! Classifies every `import X` / `from X import ...` line against two
//! disjoint module-name sets: an allow-list of host and safe stdlib
//! modules, and a deny-list that is always a critical violation. Unknown
//! modules are flagged under strict mode (unknown != trusted) and ignored
//! under permissive mode.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

use crate::config::SafetyMode;
use crate::safety::report::{ImportViolation, RiskLevel};

/// Modules generated code may import: host scene-API modules plus a safe
/// standard-library subset
pub(crate) const ALLOWED_MODULES: &[&str] = &[
    // Host scene-API modules
    "bpy",
    "bmesh",
    "mathutils",
    "bpy_extras",
    "gpu",
    "gpu_extras",
    "blf",
    "aud",
    "freestyle",
    "cycles",
    // Safe standard library
    "math",
    "random",
    "time",
    "datetime",
    "json",
    "re",
    "collections",
    "itertools",
    "functools",
    "operator",
    "typing",
    "enum",
    "dataclasses",
    "copy",
    "weakref",
    "decimal",
    "fractions",
    "statistics",
    "uuid",
    "string",
    "textwrap",
    "unicodedata",
    "codecs",
    "base64",
    "binascii",
    "struct",
    "array",
    "bisect",
    "heapq",
    "keyword",
    "reprlib",
];

/// Modules generated code may never import, in any mode
pub(crate) const RESTRICTED_MODULES: &[&str] = &[
    // File system and OS access
    "os",
    "sys",
    "subprocess",
    "shutil",
    "glob",
    "pathlib",
    "tempfile",
    "fileinput",
    "stat",
    "filecmp",
    "fnmatch",
    "linecache",
    "shlex",
    // Network and internet
    "urllib",
    "requests",
    "socket",
    "socketserver",
    "http",
    "ftplib",
    "poplib",
    "imaplib",
    "nntplib",
    "smtplib",
    "telnetlib",
    "ssl",
    "xmlrpc",
    "webbrowser",
    "cgi",
    "cgitb",
    "wsgiref",
    // Process and threading
    "threading",
    "multiprocessing",
    "_thread",
    "concurrent",
    "asyncio",
    "queue",
    "sched",
    "signal",
    "atexit",
    // Serialization and databases
    "pickle",
    "marshal",
    "shelve",
    "dbm",
    "sqlite3",
    "csv",
    // Code execution and introspection
    "imp",
    "importlib",
    "pkgutil",
    "modulefinder",
    "runpy",
    "ast",
    "dis",
    "inspect",
    "types",
    "gc",
    "ctypes",
    "mmap",
    // Debugging and profiling
    "pdb",
    "profile",
    "pstats",
    "timeit",
    "trace",
    "tracemalloc",
];

static ALLOWED_SET: Lazy<HashSet<&'static str>> =
    Lazy::new(|| ALLOWED_MODULES.iter().copied().collect());

static RESTRICTED_SET: Lazy<HashSet<&'static str>> =
    Lazy::new(|| RESTRICTED_MODULES.iter().copied().collect());

// Anchored per-line import forms. Aliased and multi-target imports resolve
// to the first dotted name; the runtime import guard covers the rest.
static IMPORT_PATTERNS: Lazy<[Regex; 2]> = Lazy::new(|| {
    [
        Regex::new(r"^\s*import\s+([A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)*)")
            .expect("invalid import pattern"),
        Regex::new(r"^\s*from\s+([A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)*)\s+import")
            .expect("invalid from-import pattern"),
    ]
});

/// Whether a root module name is on the deny-list
pub(crate) fn is_restricted(root: &str) -> bool {
    RESTRICTED_SET.contains(root)
}

/// Whether a root module name is on the allow-list
pub(crate) fn is_allowed(root: &str) -> bool {
    ALLOWED_SET.contains(root) || root.starts_with("bpy")
}

/// Scan import statements line by line and classify each against the two
/// module sets. Deny-listed imports are critical in both modes; unknown
/// modules are medium violations under strict mode only.
pub(crate) fn scan(code: &str, mode: SafetyMode) -> Vec<ImportViolation> {
    let mut violations = Vec::new();

    for (idx, line) in code.lines().enumerate() {
        let line_num = idx + 1;
        for pattern in IMPORT_PATTERNS.iter() {
            let Some(caps) = pattern.captures(line) else {
                continue;
            };
            let dotted = &caps[1];
            let root = dotted.split('.').next().unwrap_or(dotted);

            if is_restricted(root) {
                violations.push(ImportViolation {
                    module_name: root.to_string(),
                    line: line_num,
                    severity: RiskLevel::Critical,
                    description: format!("Module '{}' is restricted", root),
                });
            } else if mode == SafetyMode::Strict && !is_allowed(root) {
                violations.push(ImportViolation {
                    module_name: root.to_string(),
                    line: line_num,
                    severity: RiskLevel::Medium,
                    description: format!("Module '{}' may be restricted", root),
                });
            }
            break;
        }
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_sets_are_disjoint() {
        for module in ALLOWED_MODULES {
            assert!(
                !is_restricted(module),
                "module '{}' is on both lists",
                module
            );
        }
    }

    #[test]
    fn test_denied_import_is_critical_in_both_modes() {
        for mode in [SafetyMode::Strict, SafetyMode::Permissive] {
            for module in RESTRICTED_MODULES {
                let code = format!("import {}", module);
                let violations = scan(&code, mode);
                assert_eq!(violations.len(), 1, "import {} not flagged", module);
                assert_eq!(violations[0].severity, RiskLevel::Critical);
                assert_eq!(violations[0].module_name, *module);
            }
        }
    }

    #[test]
    fn test_from_import_root_extraction() {
        let violations = scan("from os.path import join", SafetyMode::Strict);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].module_name, "os");
    }

    #[test]
    fn test_allowed_import_passes() {
        assert!(scan("import math\nfrom mathutils import Vector", SafetyMode::Strict).is_empty());
    }

    #[test]
    fn test_bpy_prefixed_modules_pass() {
        assert!(scan("import bpy_types", SafetyMode::Strict).is_empty());
    }

    #[test]
    fn test_unknown_import_strict_vs_permissive() {
        let strict = scan("import numpy", SafetyMode::Strict);
        assert_eq!(strict.len(), 1);
        assert_eq!(strict[0].severity, RiskLevel::Medium);

        assert!(scan("import numpy", SafetyMode::Permissive).is_empty());
    }

    #[test]
    fn test_indented_import_detected() {
        let violations = scan("def f():\n    import socket", SafetyMode::Strict);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].line, 2);
    }

    #[test]
    fn test_import_in_expression_not_matched() {
        // Anchored scan only catches statement-position imports; the body
        // pattern catalog and the runtime guard cover the rest.
        assert!(scan("x = 'import os'", SafetyMode::Permissive).is_empty());
    }
}
