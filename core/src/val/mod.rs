pub mod de;
pub mod function;
mod values;

#[cfg(test)]
mod de_test;
#[cfg(test)]
mod val_test;

pub use function::{FunctionBody, FunctionSignature, FunctionValue, NativeFn, Parameter};
pub use values::*;
