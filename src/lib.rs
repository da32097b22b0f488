//! PDP-10 machine model and debugger host.
//!
//! This crate supplies everything an assembler front end needs to know about
//! the machine: the 36-bit [`Word`] representation and its field layout
//! ([`constants`]), the opcode table ([`enums`]), instruction word
//! construction ([`instructions`]), and the [`Debugger`](debugger::Debugger)
//! host, which evaluates infix expressions against a variable table and
//! encodes single instructions from mnemonic-plus-operand text.
//!
//! Words are held in the low 36 bits of a `u64`; all arithmetic that crosses
//! the word boundary is masked by the caller with
//! [`WORD_MASK`](constants::WORD_MASK).

pub mod constants;
pub mod debugger;
pub mod enums;
pub mod instructions;

/// A 36-bit machine word in the low bits of a `u64`.
pub type Word = u64;

pub use crate::constants::*;
pub use crate::debugger::{BufferConsole, Console, Debugger, StdoutConsole};
pub use crate::enums::{IoFunct, Opcode};
pub use crate::instructions::*;

#[cfg(test)]
mod test;
