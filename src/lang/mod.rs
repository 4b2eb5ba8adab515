/*!
# Rust Language Module

This Rust module provides lexical analysis and single pass compilation
of the C subset into machine code.

*/

pub type LineNumber = Option<u32>;

#[macro_use]
mod error;
mod lex;
mod parse;
mod symbol;
mod token;

pub use error::Error;
pub use error::ErrorCode;
pub use lex::Lexer;
pub use parse::compile;
pub use parse::Compiler;
pub use symbol::{Binding, Class, Symbol, SymbolId, SymbolTable, Type, Width};
pub use token::{Precedence, Token};
