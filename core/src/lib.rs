pub mod ast;
pub mod call;
pub mod error;
pub mod interp;
pub mod module;
pub mod op;
pub mod pattern;
pub mod typ;
pub mod util;
pub mod val;
