//! # minic
//!
//! A compiler and virtual machine for a small subset of C, in one pass.
//!
//! The supported language has `char`, `int`, pointers to either, `enum`
//! constants, global and local variables, functions, `if`, `else`,
//! `while` and `return`. Programs talk to the outside world through a
//! fixed set of library calls: `open`, `read`, `close`, `printf`,
//! `malloc`, `free`, `memset`, `memcmp` and `exit`.
//!
//! ```text
//! minic hello.c
//! minic -s hello.c
//! minic -d hello.c arg1 arg2
//! ```
//!
//! `-s` prints the compiled code instead of running it and `-d` traces
//! every executed instruction to stderr. The exit status is the value
//! returned by `main`, or -1 when compiling or running fails.

pub mod lang;
pub mod mach;
pub mod term;
