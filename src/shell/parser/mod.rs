pub mod ast;
pub mod lexer;
#[allow(clippy::module_inception)]
pub mod parser;

pub use ast::{Command, Pipeline, RedirectMode, Redirection, Stream};
pub use parser::Parser;
