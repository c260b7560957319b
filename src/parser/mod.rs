// Parser module: Go source text to compilation units

pub mod ast;
mod go;

pub use ast::*;
pub use go::GoParser;
