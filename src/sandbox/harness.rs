//! Restricted interpreter harness
//!
//! Renders the Python program that actually runs gated code. The harness
//! reproduces the restricted namespace in-process: curated builtins with
//! denial stubs, a scoped import guard sharing the analyzer's module sets,
//! a statement-level trace hook enforcing the operation and wall-clock
//! budgets, and stdout/stderr capture. It reports exactly one JSON object
//! on the real stdout, which the executor parses.
//!
//! The import guard and the dangerous-builtin stubs are installed around
//! the `exec` and restored in a `finally`, so the interpreter's global
//! state is never left mutated even when the gated code raises.

use serde::Deserialize;

use crate::config::{ExecutionLimits, SafetyMode};
use crate::error::Result;
use crate::safety::{ALLOWED_MODULES, RESTRICTED_MODULES};
use crate::sandbox::Outcome;

/// Safe stdlib modules pre-imported into the namespace so gated code can
/// use them without exercising the import guard
const PREIMPORTED_STDLIB: &[&str] = &[
    "math",
    "random",
    "time",
    "datetime",
    "json",
    "re",
    "collections",
    "itertools",
    "functools",
    "copy",
    "uuid",
];

/// What the harness reports back on its real stdout
#[derive(Debug, Deserialize)]
pub(crate) struct HarnessReport {
    pub outcome: Outcome,
    pub detail: Option<String>,
    pub stdout: String,
    pub stderr: String,
    pub wall_seconds: f64,
}

const TEMPLATE: &str = r#"
import builtins as _builtins
import io as _io
import json as _json
import sys as _sys
import time as _time
import traceback as _traceback

_USER_CODE = @USER_CODE@
_DENY = set(@DENY@)
_ALLOW = set(@ALLOW@)
_STRICT = @STRICT@
_MAX_OPS = @MAX_OPS@
_MAX_SECS = @MAX_SECS@
_PREIMPORT = @PREIMPORT@

_real_import = _builtins.__import__

def _guarded_import(name, globals=None, locals=None, fromlist=(), level=0):
    root = name.split('.')[0]
    if root in _DENY:
        raise PermissionError("import of module '%s' is restricted" % name)
    if _STRICT and root not in _ALLOW and not root.startswith('bpy'):
        raise PermissionError("module '%s' is not on the allowed module list" % name)
    return _real_import(name, globals, locals, fromlist, level)

def _denied(name):
    def _blocked(*args, **kwargs):
        raise PermissionError("builtin '%s' is restricted" % name)
    _blocked.__name__ = name
    return _blocked

_SAFE_BUILTINS = {
    'print': print, 'len': len, 'range': range, 'enumerate': enumerate,
    'zip': zip, 'map': map, 'filter': filter, 'sorted': sorted,
    'reversed': reversed, 'sum': sum, 'min': min, 'max': max,
    'abs': abs, 'round': round, 'pow': pow, 'divmod': divmod,
    'int': int, 'float': float, 'str': str, 'bool': bool, 'complex': complex,
    'list': list, 'tuple': tuple, 'dict': dict, 'set': set,
    'frozenset': frozenset, 'bytes': bytes, 'bytearray': bytearray,
    'isinstance': isinstance, 'issubclass': issubclass,
    'type': type, 'id': id, 'hash': hash, 'repr': repr, 'format': format,
    'iter': iter, 'next': next, 'any': any, 'all': all, 'slice': slice,
    'object': object, 'super': super, 'property': property,
    'staticmethod': staticmethod, 'classmethod': classmethod,
    'BaseException': BaseException, 'Exception': Exception,
    'ValueError': ValueError, 'TypeError': TypeError, 'KeyError': KeyError,
    'IndexError': IndexError, 'AttributeError': AttributeError,
    'NameError': NameError, 'RuntimeError': RuntimeError,
    'StopIteration': StopIteration, 'ZeroDivisionError': ZeroDivisionError,
    'ArithmeticError': ArithmeticError, 'NotImplementedError': NotImplementedError,
    'True': True, 'False': False, 'None': None,
}
for _name in ('eval', 'exec', 'compile', 'open', 'input', '__import__',
              'getattr', 'setattr', 'delattr', 'hasattr', 'vars',
              'globals', 'locals', 'dir', 'breakpoint', 'exit', 'quit',
              'help', 'memoryview'):
    _SAFE_BUILTINS[_name] = _denied(_name)
_SAFE_BUILTINS['__import__'] = _guarded_import

_env = {'__name__': '__main__', '__builtins__': _SAFE_BUILTINS}
for _mod in _PREIMPORT:
    try:
        _env[_mod] = _real_import(_mod)
    except ImportError:
        pass
if 'mathutils' in _env:
    for _cls in ('Vector', 'Matrix', 'Euler', 'Quaternion'):
        if hasattr(_env['mathutils'], _cls):
            _env[_cls] = getattr(_env['mathutils'], _cls)

_ops = 0
_deadline = None

def _budget_trace(frame, event, arg):
    global _ops
    if event == 'line':
        _ops += 1
        if _ops > _MAX_OPS:
            raise RuntimeError('operation budget exceeded')
        if _time.monotonic() > _deadline:
            raise TimeoutError('wall clock budget of %.1fs exceeded' % _MAX_SECS)
    return _budget_trace

_out = _io.StringIO()
_err = _io.StringIO()
_outcome = 'completed'
_detail = None
_prev_out, _prev_err = _sys.stdout, _sys.stderr
_sys.stdout, _sys.stderr = _out, _err
_start = _time.monotonic()
_deadline = _start + _MAX_SECS
try:
    _code_obj = compile(_USER_CODE, '<generated>', 'exec')
    _builtins.__import__ = _guarded_import
    _sys.settrace(_budget_trace)
    try:
        exec(_code_obj, _env)
    finally:
        _sys.settrace(None)
        _builtins.__import__ = _real_import
except PermissionError as _exc:
    _outcome = 'permission_denied'
    _detail = str(_exc)
except TimeoutError as _exc:
    _outcome = 'timed_out'
    _detail = str(_exc)
except SyntaxError:
    _outcome = 'runtime_fault'
    _detail = _traceback.format_exc(limit=0)
except BaseException:
    _outcome = 'runtime_fault'
    _detail = _traceback.format_exc()
finally:
    _sys.stdout, _sys.stderr = _prev_out, _prev_err
_json.dump({
    'outcome': _outcome,
    'detail': _detail,
    'stdout': _out.getvalue(),
    'stderr': _err.getvalue(),
    'wall_seconds': _time.monotonic() - _start,
}, _sys.stdout)
"#;

/// Render the harness program for one execution call
///
/// The user code and the module sets are embedded as JSON literals, which
/// are also valid Python literals, so arbitrary source text cannot escape
/// into the harness.
pub(crate) fn render(
    code: &str,
    mode: SafetyMode,
    limits: &ExecutionLimits,
    host_modules: &[String],
) -> Result<String> {
    let mut preimport: Vec<&str> = host_modules.iter().map(String::as_str).collect();
    for module in PREIMPORTED_STDLIB {
        if !preimport.contains(module) {
            preimport.push(module);
        }
    }

    let rendered = TEMPLATE
        .replace("@USER_CODE@", &serde_json::to_string(code)?)
        .replace("@DENY@", &serde_json::to_string(RESTRICTED_MODULES)?)
        .replace("@ALLOW@", &serde_json::to_string(ALLOWED_MODULES)?)
        .replace(
            "@STRICT@",
            if mode == SafetyMode::Strict {
                "True"
            } else {
                "False"
            },
        )
        .replace("@MAX_OPS@", &limits.max_operations.to_string())
        .replace("@MAX_SECS@", &format!("{:?}", limits.max_wall_seconds))
        .replace("@PREIMPORT@", &serde_json::to_string(&preimport)?);

    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_embeds_code_as_literal() {
        let harness = render(
            "print('hi\\n\"quoted\"')",
            SafetyMode::Strict,
            &ExecutionLimits::default(),
            &[],
        )
        .unwrap();
        assert!(harness.contains(r#"_USER_CODE = "print"#));
        assert!(!harness.contains("@USER_CODE@"));
    }

    #[test]
    fn test_render_substitutes_all_tokens() {
        let harness = render(
            "pass",
            SafetyMode::Permissive,
            &ExecutionLimits {
                max_operations: 42,
                max_wall_seconds: 1.5,
            },
            &["bpy".to_string()],
        )
        .unwrap();
        assert!(!harness.contains('@'));
        assert!(harness.contains("_STRICT = False"));
        assert!(harness.contains("_MAX_OPS = 42"));
        assert!(harness.contains("_MAX_SECS = 1.5"));
        assert!(harness.contains("\"bpy\""));
    }

    #[test]
    fn test_host_modules_not_duplicated() {
        let harness = render(
            "pass",
            SafetyMode::Strict,
            &ExecutionLimits::default(),
            &["math".to_string()],
        )
        .unwrap();
        let preimport_line = harness
            .lines()
            .find(|l| l.starts_with("_PREIMPORT"))
            .unwrap();
        assert_eq!(preimport_line.matches("\"math\"").count(), 1);
    }

    #[test]
    fn test_deny_list_embedded() {
        let harness =
            render("pass", SafetyMode::Strict, &ExecutionLimits::default(), &[]).unwrap();
        assert!(harness.contains("\"subprocess\""));
        assert!(harness.contains("\"pickle\""));
    }
}
