//! Native built-in functions

use super::env::{visible_bindings, EnvRef};
use super::error::{InterpResult, RuntimeError};
use super::host::Host;
use super::value::Value;
use std::collections::HashMap;
use std::time::Duration;

/// What a built-in can reach while it runs
pub struct BuiltinCtx<'a> {
    pub host: &'a mut dyn Host,
    /// Environment of the call site
    pub env: &'a EnvRef,
}

/// Builtin function type
pub type BuiltinFn = fn(&mut BuiltinCtx<'_>, &[Value]) -> InterpResult<Value>;

/// Register built-in functions
pub fn register_builtins(builtins: &mut HashMap<String, BuiltinFn>) {
    builtins.insert("println".to_string(), builtin_println);
    builtins.insert("print".to_string(), builtin_print);
    builtins.insert("sleep".to_string(), builtin_sleep);
    builtins.insert("assert_eq".to_string(), builtin_assert_eq);
    builtins.insert("spill".to_string(), builtin_spill);
}

fn check_arity(name: &str, expected: usize, args: &[Value]) -> InterpResult<()> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(RuntimeError::arity_mismatch(name, expected, args.len()))
    }
}

fn concat(args: &[Value]) -> Vec<u8> {
    let mut out = Vec::new();
    for arg in args {
        arg.write_to(&mut out);
    }
    out
}

/// println(args...) -> ()
fn builtin_println(ctx: &mut BuiltinCtx<'_>, args: &[Value]) -> InterpResult<Value> {
    let mut line = concat(args);
    line.push(b'\n');
    ctx.host.write(&line)?;
    Ok(Value::Unit)
}

/// print(args...) -> ()
fn builtin_print(ctx: &mut BuiltinCtx<'_>, args: &[Value]) -> InterpResult<Value> {
    ctx.host.write(&concat(args))?;
    Ok(Value::Unit)
}

/// sleep(ns: int) -> ()
fn builtin_sleep(ctx: &mut BuiltinCtx<'_>, args: &[Value]) -> InterpResult<Value> {
    check_arity("sleep", 1, args)?;
    let nanos = match &args[0] {
        Value::Int(n) => u64::try_from(*n)
            .map_err(|_| RuntimeError::type_mismatch("non-negative int", "negative int"))?,
        other => return Err(RuntimeError::type_mismatch("int", other.type_name())),
    };
    ctx.host.sleep(Duration::from_nanos(nanos));
    Ok(Value::Unit)
}

/// assert_eq(actual, expected) -> ()
fn builtin_assert_eq(_ctx: &mut BuiltinCtx<'_>, args: &[Value]) -> InterpResult<Value> {
    check_arity("assert_eq", 2, args)?;
    let (actual, expected) = (&args[0], &args[1]);
    match actual.structural_eq(expected) {
        None => {
            let offender = if actual.is_comparable() { expected } else { actual };
            Err(RuntimeError::not_comparable(offender.type_name()))
        }
        Some(true) => Ok(Value::Unit),
        Some(false) => Err(RuntimeError::assertion_failure(
            actual.repr(),
            expected.repr(),
        )),
    }
}

/// spill() -> (); dumps every visible binding as `name = value`
fn builtin_spill(ctx: &mut BuiltinCtx<'_>, args: &[Value]) -> InterpResult<Value> {
    check_arity("spill", 0, args)?;
    let mut dump = Vec::new();
    for (name, value) in visible_bindings(ctx.env) {
        dump.extend_from_slice(name.as_bytes());
        dump.extend_from_slice(b" = ");
        value.write_to(&mut dump);
        dump.push(b'\n');
    }
    ctx.host.write(&dump)?;
    Ok(Value::Unit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interp::env::{child_env, Environment};
    use crate::interp::error::ErrorKind;
    use crate::interp::host::CaptureHost;

    fn call(name: &str, args: &[Value]) -> (InterpResult<Value>, CaptureHost) {
        let env = Environment::new().into_ref();
        call_in(name, args, &env)
    }

    fn call_in(name: &str, args: &[Value], env: &EnvRef) -> (InterpResult<Value>, CaptureHost) {
        let mut builtins = HashMap::new();
        register_builtins(&mut builtins);
        let builtin = builtins[name];
        let mut host = CaptureHost::new();
        let result = {
            let mut ctx = BuiltinCtx {
                host: &mut host,
                env,
            };
            builtin(&mut ctx, args)
        };
        (result, host)
    }

    #[test]
    fn test_println_concatenates_without_separator() {
        let (result, host) = call(
            "println",
            &[Value::string("a"), Value::Int(1), Value::Bool(false)],
        );
        assert_eq!(result.unwrap(), Value::Unit);
        assert_eq!(host.output_str(), "a1false\n");
    }

    #[test]
    fn test_println_no_args_prints_newline() {
        let (_, host) = call("println", &[]);
        assert_eq!(host.output_str(), "\n");
    }

    #[test]
    fn test_print_has_no_newline() {
        let (_, host) = call("print", &[Value::string("x"), Value::Unit, Value::Int(2)]);
        assert_eq!(host.output_str(), "x2");
    }

    #[test]
    fn test_sleep_records_duration() {
        let (result, host) = call("sleep", &[Value::Int(1_000)]);
        assert!(result.is_ok());
        assert_eq!(host.sleeps, vec![Duration::from_nanos(1_000)]);
    }

    #[test]
    fn test_sleep_rejects_negative_and_non_int() {
        let (result, host) = call("sleep", &[Value::Int(-1)]);
        assert_eq!(result.unwrap_err().kind, ErrorKind::TypeMismatch);
        assert!(host.sleeps.is_empty());

        let (result, _) = call("sleep", &[Value::string("1")]);
        assert_eq!(result.unwrap_err().kind, ErrorKind::TypeMismatch);
    }

    #[test]
    fn test_sleep_arity() {
        let (result, _) = call("sleep", &[]);
        assert_eq!(result.unwrap_err().kind, ErrorKind::ArityMismatch);
    }

    #[test]
    fn test_assert_eq_equal_is_unit() {
        let (result, _) = call("assert_eq", &[Value::Int(5), Value::Int(5)]);
        assert_eq!(result.unwrap(), Value::Unit);
    }

    #[test]
    fn test_assert_eq_unequal_carries_values() {
        let (result, _) = call("assert_eq", &[Value::Int(5), Value::Int(6)]);
        let err = result.unwrap_err();
        match err.kind {
            ErrorKind::AssertionFailure { actual, expected } => {
                assert_eq!(actual, "5");
                assert_eq!(expected, "6");
            }
            other => panic!("expected AssertionFailure, got {other:?}"),
        }
    }

    #[test]
    fn test_assert_eq_different_types_fail() {
        let (result, _) = call("assert_eq", &[Value::Int(1), Value::string("1")]);
        let err = result.unwrap_err();
        assert!(matches!(err.kind, ErrorKind::AssertionFailure { .. }));
        assert_eq!(err.message, "assertion failed: expected \"1\", got 1");
    }

    #[test]
    fn test_assert_eq_range_is_type_mismatch() {
        let range = Value::Range(crate::interp::RangeValue::new(0, 3, false));
        let (result, _) = call("assert_eq", &[range.clone(), range]);
        assert_eq!(result.unwrap_err().kind, ErrorKind::TypeMismatch);
    }

    #[test]
    fn test_assert_eq_arity() {
        let (result, _) = call("assert_eq", &[Value::Int(1)]);
        assert_eq!(result.unwrap_err().kind, ErrorKind::ArityMismatch);
    }

    #[test]
    fn test_spill_dumps_visible_bindings() {
        let root = Environment::new().into_ref();
        root.borrow_mut().define("n".to_string(), Value::Int(3));
        let inner = child_env(&root);
        inner.borrow_mut().define("greeting".to_string(), Value::string("hi"));

        let (result, host) = call_in("spill", &[], &inner);
        assert!(result.is_ok());
        assert_eq!(host.output_str(), "n = 3\ngreeting = hi\n");
    }

    #[test]
    fn test_spill_rejects_arguments() {
        let (result, _) = call("spill", &[Value::Int(1)]);
        assert_eq!(result.unwrap_err().kind, ErrorKind::ArityMismatch);
    }
}
