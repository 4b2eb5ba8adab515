/*!
## Rust Machine Module

This Rust module is the bytecode and virtual machine the compiler targets.

*/

pub type Address = usize;
pub type Word = i64;

/// Size of a machine word in bytes.
pub const WORD: usize = std::mem::size_of::<Word>();

/// Default size of the heap and of the stack.
pub const POOL_SIZE: usize = 256 * 1024;

/// Default number of instructions per `Runtime::execute` slice.
pub const CYCLES: usize = 5000;

mod host;
mod listing;
mod memory;
mod opcode;
mod program;
mod runtime;

pub use listing::Listing;
pub use memory::Memory;
pub use opcode::Opcode;
pub use program::Instructions;
pub use program::Program;
pub use runtime::Event;
pub use runtime::Runtime;

/// ## Machine configuration

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Bytes reserved for each of the heap and the stack.
    pub pool_size: usize,
    /// Print every executed instruction to stderr.
    pub trace: bool,
    /// Instructions per execution slice.
    pub cycles: usize,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            pool_size: POOL_SIZE,
            trace: false,
            cycles: CYCLES,
        }
    }
}
