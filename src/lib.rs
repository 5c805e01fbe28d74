//! Tail call elimination for a small call-based language.
//!
//! [`rewrite::rewrite_function`] turns every `return` whose whole value is a call into a
//! continuation record, and [`trampoline::trampoline`] runs those records in a loop so chains
//! of tail calls use constant stack. [`Interpreter::transform`] ties both to the parser and the
//! global namespace.

pub mod ast;
pub mod config;
pub mod error;
pub mod interp;
pub mod parser;
pub mod rewrite;
pub mod trampoline;
pub mod value;

mod builtins;
mod transform;


pub use config::Config;
pub use error::{
    RewriteError,
    RuntimeError,
    TransformError,
};
pub use interp::Interpreter;
pub use trampoline::{
    Bounce,
    Continuation,
    Invoke,
    trampoline,
};
pub use value::Value;

/// factorial, odd and even, written with tail calls only.
pub const DEMO_SOURCE: &str = include_str!("../demos/demo.tramp");
