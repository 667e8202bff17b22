//! Call protocol: the surface native library functions use to call back
//! into the language.

use std::sync::Arc;

use anyhow::Result;

use crate::error::{ErrorKind, lang_error};
use crate::interp::{EvaluationContext, Stack};
use crate::val::{FunctionValue, Value};

/// What a native function sees of the running evaluation.
pub struct CallContext<'a> {
    stack: &'a mut Stack,
    context: &'a EvaluationContext,
}

impl<'a> CallContext<'a> {
    pub fn new(stack: &'a mut Stack, context: &'a EvaluationContext) -> Self {
        Self { stack, context }
    }

    pub fn stack(&mut self) -> &mut Stack {
        self.stack
    }

    pub fn context(&self) -> &EvaluationContext {
        self.context
    }

    /// One-off call of an arbitrary value with exactly its arity of arguments.
    pub fn call(&mut self, callee: &Value, args: Vec<Value>) -> Result<Value> {
        let function = callable(callee)?;
        function.invoke(self.stack, self.context, args)
    }

    pub fn arity1(&self, callee: &Value) -> Result<Arity1CallSite> {
        Ok(Arity1CallSite {
            function: fixed_arity(callee, 1)?,
        })
    }

    pub fn arity2(&self, callee: &Value) -> Result<Arity2CallSite> {
        Ok(Arity2CallSite {
            function: fixed_arity(callee, 2)?,
        })
    }

    pub fn arity3(&self, callee: &Value) -> Result<Arity3CallSite> {
        Ok(Arity3CallSite {
            function: fixed_arity(callee, 3)?,
        })
    }

    pub fn arity4(&self, callee: &Value) -> Result<Arity4CallSite> {
        Ok(Arity4CallSite {
            function: fixed_arity(callee, 4)?,
        })
    }
}

/// The function behind `callee`: `NilError` for nil, `CastError` for
/// anything else that is not a function.
pub fn callable(callee: &Value) -> Result<&Arc<FunctionValue>> {
    match callee {
        Value::Function(f) => Ok(f),
        Value::Nil => Err(lang_error(ErrorKind::NilError, "cannot call nil")),
        other => Err(lang_error(
            ErrorKind::CastError,
            format!("cannot call {} value {}", other.type_name(), other),
        )),
    }
}

fn fixed_arity(callee: &Value, arity: usize) -> Result<Arc<FunctionValue>> {
    let function = callable(callee)?;
    if function.arity() != arity {
        return Err(lang_error(
            ErrorKind::IllegalArgument,
            format!(
                "expected a function of {} parameter(s), got one with {}",
                arity,
                function.arity()
            ),
        ));
    }
    Ok(function.clone())
}

macro_rules! call_site {
    ($name:ident, $($arg:ident),+) => {
        /// Arity-checked handle on a function, built once and called many times.
        #[derive(Debug, Clone)]
        pub struct $name {
            function: Arc<FunctionValue>,
        }

        impl $name {
            pub fn function(&self) -> &Arc<FunctionValue> {
                &self.function
            }

            #[inline]
            pub fn call(&self, cx: &mut CallContext<'_>, $($arg: Value),+) -> Result<Value> {
                self.function.invoke_unchecked(cx.stack, cx.context, vec![$($arg),+])
            }
        }
    };
}

call_site!(Arity1CallSite, a);
call_site!(Arity2CallSite, a, b);
call_site!(Arity3CallSite, a, b, c);
call_site!(Arity4CallSite, a, b, c, d);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::error_kind;
    use crate::typ::Type;
    use crate::val::{FunctionSignature, Parameter};

    fn add(_: &mut CallContext<'_>, args: &[Value]) -> Result<Value> {
        Ok(Value::Long(args[0].as_long()? + args[1].as_long()?))
    }

    fn adder() -> Value {
        let sig = FunctionSignature::new(
            vec![Parameter::new("a", Type::Long), Parameter::new("b", Type::Long)],
            Type::Long,
        );
        Value::from(FunctionValue::native("add", sig, add))
    }

    #[test]
    fn test_call_site_invokes() -> Result<()> {
        let mut stack = Stack::new();
        let ctx = EvaluationContext::default();
        let mut cx = CallContext::new(&mut stack, &ctx);
        let site = cx.arity2(&adder())?;
        assert_eq!(site.call(&mut cx, Value::Long(2), Value::Long(3))?, Value::Long(5));
        assert_eq!(site.call(&mut cx, Value::Long(-2), Value::Long(3))?, Value::Long(1));
        Ok(())
    }

    #[test]
    fn test_wrong_arity_fails_at_construction() {
        let mut stack = Stack::new();
        let ctx = EvaluationContext::default();
        let cx = CallContext::new(&mut stack, &ctx);
        let err = cx.arity1(&adder()).unwrap_err();
        assert_eq!(error_kind(&err), Some(ErrorKind::IllegalArgument));
        let err = cx.arity3(&adder()).unwrap_err();
        assert_eq!(error_kind(&err), Some(ErrorKind::IllegalArgument));
    }

    #[test]
    fn test_nil_and_non_function_callees() {
        let mut stack = Stack::new();
        let ctx = EvaluationContext::default();
        let mut cx = CallContext::new(&mut stack, &ctx);
        assert_eq!(error_kind(&cx.arity1(&Value::Nil).unwrap_err()), Some(ErrorKind::NilError));
        assert_eq!(
            error_kind(&cx.arity1(&Value::Long(1)).unwrap_err()),
            Some(ErrorKind::CastError)
        );
        let err = cx.call(&adder(), vec![Value::Long(1)]).unwrap_err();
        assert_eq!(error_kind(&err), Some(ErrorKind::IllegalArgument));
    }

    fn reject(_: &mut CallContext<'_>, _: &[Value]) -> Result<Value> {
        Err(lang_error(ErrorKind::IllegalArgument, "rejected"))
    }

    #[test]
    fn test_native_errors_carry_trace() {
        let mut stack = Stack::new();
        let ctx = EvaluationContext::default();
        let mut cx = CallContext::new(&mut stack, &ctx);
        let sig = FunctionSignature::new(vec![Parameter::new("x", Type::Any)], Type::Any);
        let reject = Value::from(FunctionValue::native("reject", sig, reject));
        let err = cx.call(&reject, vec![Value::Long(1)]).unwrap_err();
        let lang = err.downcast_ref::<crate::error::LangError>().unwrap();
        assert_eq!(lang.kind(), ErrorKind::IllegalArgument);
        assert_eq!(&*lang.trace[0].name, "reject");
        assert_eq!(&*lang.trace[1].name, "<top>");
    }
}
