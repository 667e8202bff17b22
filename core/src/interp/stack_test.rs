#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use anyhow::Result;

    use crate::error::{ErrorKind, error_kind, lang_error};
    use crate::interp::{Frame, MemorySpace, Stack};
    use crate::val::Value;

    #[test]
    fn test_scope_depth_restored_after_error() {
        let mut stack = Stack::new();
        stack.bind("x", Value::Long(1));
        let result: Result<()> = stack.with_scope(|stack| {
            stack.bind("x", Value::Long(2));
            stack.with_scope(|_| Err(lang_error(ErrorKind::NilError, "boom")))
        });
        assert_eq!(error_kind(&result.unwrap_err()), Some(ErrorKind::NilError));
        assert_eq!(stack.scope_depth(), 1);
        assert_eq!(stack.lookup("x"), Some(&Value::Long(1)));
    }

    #[test]
    fn test_inner_scope_shadows_outer() -> Result<()> {
        let mut stack = Stack::new();
        stack.bind("a", Value::from("outer"));
        stack.with_scope(|stack| {
            stack.bind("a", Value::from("inner"));
            assert_eq!(stack.lookup("a"), Some(&Value::from("inner")));
            Ok(())
        })?;
        assert_eq!(stack.lookup("a"), Some(&Value::from("outer")));
        Ok(())
    }

    #[test]
    fn test_frame_hides_caller_locals_but_sees_closure() -> Result<()> {
        let mut stack = Stack::new();
        stack.bind("local", Value::Long(1));
        let mut captured = MemorySpace::new();
        captured.bind("free", Value::Long(2));
        let frame = Frame::new("f", Some(Arc::new(captured)));
        stack.with_frame(frame, 100, |stack| {
            assert_eq!(stack.lookup("local"), None);
            assert_eq!(stack.lookup("free"), Some(&Value::Long(2)));
            assert_eq!(stack.depth(), 2);
            Ok(())
        })?;
        assert_eq!(stack.depth(), 1);
        Ok(())
    }

    #[test]
    fn test_capture_flattens_visible_bindings() -> Result<()> {
        let mut stack = Stack::new();
        stack.bind("a", Value::Long(1));
        let captured = stack.with_scope(|stack| {
            stack.bind("b", Value::Long(2));
            stack.bind("a", Value::Long(3));
            Ok(stack.capture())
        })?;
        assert_eq!(captured.get("a"), Some(&Value::Long(3)));
        assert_eq!(captured.get("b"), Some(&Value::Long(2)));
        Ok(())
    }

    #[test]
    fn test_trace_lists_innermost_first() -> Result<()> {
        let mut stack = Stack::new();
        let names = stack.with_frame(Frame::new("outer", None), 100, |stack| {
            stack.with_frame(Frame::new("inner", None), 100, |stack| {
                Ok(stack.trace().iter().map(|f| f.name.to_string()).collect::<Vec<_>>())
            })
        })?;
        assert_eq!(names, vec!["inner", "outer", "<top>"]);
        Ok(())
    }

    #[test]
    fn test_max_depth_raises_stack_overflow() {
        let mut stack = Stack::new();
        let err = stack
            .with_frame(Frame::new("f", None), 1, |_| Ok(()))
            .unwrap_err();
        assert_eq!(error_kind(&err), Some(ErrorKind::StackOverflow));
        assert_eq!(stack.depth(), 1);
    }
}
