use std::sync::Arc;

use anyhow::Result;
use tracing::trace;

use crate::error::{self, ErrorKind, LangError, SourceInfo, TraceFrame};
use crate::val::Value;

use super::MemorySpace;

/// A call frame: the scopes opened by one function invocation.
#[derive(Debug)]
pub struct Frame {
    name: Arc<str>,
    /// Source position the frame is currently evaluating a call at.
    position: Option<SourceInfo>,
    /// Read-only bindings captured when the called closure was created.
    closure: Option<Arc<MemorySpace>>,
    scope: MemorySpace,
    outer: Vec<MemorySpace>,
}

impl Frame {
    pub fn new(name: impl Into<Arc<str>>, closure: Option<Arc<MemorySpace>>) -> Self {
        Self {
            name: name.into(),
            position: None,
            closure,
            scope: MemorySpace::new(),
            outer: Vec::new(),
        }
    }

    fn lookup(&self, name: &str) -> Option<&Value> {
        if let Some(v) = self.scope.get(name) {
            return Some(v);
        }
        for scope in self.outer.iter().rev() {
            if let Some(v) = scope.get(name) {
                return Some(v);
            }
        }
        self.closure.as_ref().and_then(|c| c.get(name))
    }

    fn trace_frame(&self) -> TraceFrame {
        TraceFrame {
            name: self.name.clone(),
            position: self.position.clone(),
        }
    }
}

/// Evaluation stack of one logical thread of control.
///
/// Scopes and frames are strictly nested; `with_scope` and `with_frame`
/// restore the previous depth whether the body succeeds or fails.
#[derive(Debug)]
pub struct Stack {
    current: Frame,
    callers: Vec<Frame>,
}

impl Default for Stack {
    fn default() -> Self {
        Self::new()
    }
}

impl Stack {
    pub fn new() -> Self {
        Self {
            current: Frame::new("<top>", None),
            callers: Vec::new(),
        }
    }

    /// Number of active call frames, the top-level frame included.
    #[inline]
    pub fn depth(&self) -> usize {
        self.callers.len() + 1
    }

    /// Number of open scopes in the current frame.
    #[inline]
    pub fn scope_depth(&self) -> usize {
        self.current.outer.len() + 1
    }

    #[inline]
    pub fn bind(&mut self, name: impl Into<Arc<str>>, value: Value) {
        self.current.scope.bind(name, value);
    }

    /// The innermost scope, the target of pattern binds.
    #[inline]
    pub fn scope_mut(&mut self) -> &mut MemorySpace {
        &mut self.current.scope
    }

    /// Resolve a local name. Globals are not consulted here.
    pub fn lookup(&self, name: &str) -> Option<&Value> {
        self.current.lookup(name)
    }

    pub fn set_position(&mut self, position: Option<&SourceInfo>) {
        self.current.position = position.cloned();
    }

    pub fn with_scope<T>(&mut self, f: impl FnOnce(&mut Stack) -> Result<T>) -> Result<T> {
        let parent = std::mem::take(&mut self.current.scope);
        self.current.outer.push(parent);
        let result = f(self);
        if let Some(parent) = self.current.outer.pop() {
            self.current.scope = parent;
        }
        result
    }

    pub fn with_frame<T>(
        &mut self,
        frame: Frame,
        max_depth: usize,
        f: impl FnOnce(&mut Stack) -> Result<T>,
    ) -> Result<T> {
        if self.depth() >= max_depth {
            return Err(self.locate(
                error::lang_error(
                    ErrorKind::StackOverflow,
                    format!("call depth exceeded {} frames", max_depth),
                ),
                None,
            ));
        }
        trace!(target: "twig::call", frame = %frame.name, depth = self.depth(), "push frame");
        let caller = std::mem::replace(&mut self.current, frame);
        self.callers.push(caller);
        let result = f(self);
        if let Some(caller) = self.callers.pop() {
            let done = std::mem::replace(&mut self.current, caller);
            trace!(target: "twig::call", frame = %done.name, "pop frame");
        }
        result
    }

    /// Flattened snapshot of every local binding visible right now, for
    /// closures to keep as read-only history.
    pub fn capture(&self) -> Arc<MemorySpace> {
        let frame = &self.current;
        let mut captured = MemorySpace::new();
        if let Some(closure) = &frame.closure {
            captured.absorb(closure);
        }
        for scope in &frame.outer {
            captured.absorb(scope);
        }
        captured.absorb(&frame.scope);
        Arc::new(captured)
    }

    /// Frames from innermost to outermost.
    pub fn trace(&self) -> Vec<TraceFrame> {
        std::iter::once(&self.current)
            .chain(self.callers.iter().rev())
            .map(Frame::trace_frame)
            .collect()
    }

    /// Attach `source` and the current trace to a language error that has neither yet.
    pub fn locate(&self, err: anyhow::Error, source: Option<&SourceInfo>) -> anyhow::Error {
        error::locate(err, source, || self.trace())
    }

    /// Raise a located language error.
    pub fn error(&self, kind: ErrorKind, message: impl Into<String>, source: Option<&SourceInfo>) -> anyhow::Error {
        LangError::new(kind, message)
            .with_source(source.cloned())
            .with_trace(self.trace())
            .into()
    }
}
