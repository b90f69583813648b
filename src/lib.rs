// Machine
mod isa;
pub use isa::{Opcode, Register};
mod alu;
pub use alu::AluOp;
mod runtime;
pub use runtime::{Flags, Processor, MEMORY_SIZE, STACK_TOP};

// Loading
mod loader;
pub use loader::{Program, ProgramLoader};

mod error;
pub use error::{Error, Result};

pub mod env;

/// Amount of lines to show as context, each side of focus line (line containing span).
pub const DIAGNOSTIC_CONTEXT_LINES: usize = 2;
