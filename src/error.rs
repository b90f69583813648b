use std::{io, path::PathBuf};

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

use crate::alu::AluOp;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Every way a run can end other than `HLT`.
///
/// None of these are recoverable: the machine stops at the point of detection
/// and the driver reports the error and exits with [`Error::exit_code`].
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    // Invocation errors
    #[error("Expected exactly one program file argument: {reason}")]
    #[diagnostic(
        code(ls8::invocation),
        help("usage: ls8 [--minimal] [--trace] <PROGRAM>")
    )]
    Invocation { reason: String },

    // Loader errors
    #[error("Program file `{}` not found", path.display())]
    #[diagnostic(
        code(ls8::load::not_found),
        help("check the path passed on the command line")
    )]
    ProgramNotFound { path: PathBuf },

    #[error("Could not read program file `{}`", path.display())]
    #[diagnostic(code(ls8::load::read))]
    ProgramRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Encountered an invalid instruction word on line {line}")]
    #[diagnostic(
        code(ls8::load::bad_word),
        help("each line holds one base-2 literal from 0 to 11111111, optionally followed by a # comment")
    )]
    InvalidWord {
        line: usize,
        #[source_code]
        src: NamedSource<String>,
        #[label("not an 8-bit binary literal")]
        span: SourceSpan,
    },

    #[error("Program is {len} words long and cannot fit in memory")]
    #[diagnostic(
        code(ls8::load::too_large),
        help("memory holds at most 256 words, shared with the stack")
    )]
    ProgramTooLarge { len: usize },

    // Execution errors
    #[error("Unsupported ALU operation {op}")]
    #[diagnostic(code(ls8::exec::unsupported_alu_op))]
    UnsupportedOperation { op: AluOp },

    #[error("Unknown opcode {opcode:#010b} at address {pc:#04x}")]
    #[diagnostic(
        code(ls8::exec::unknown_opcode),
        help("the program counter may have run into data or the stack")
    )]
    UnknownOpcode { opcode: u8, pc: usize },

    #[error("Register index {index} out of bounds in instruction at {pc:#04x}")]
    #[diagnostic(code(ls8::exec::bad_register), help("registers are numbered 0 to 7"))]
    RegisterOutOfBounds { index: u8, pc: usize },

    #[error("Memory address {address:#x} out of bounds in instruction at {pc:#04x}")]
    #[diagnostic(code(ls8::exec::bad_address), help("memory is addressed from 0x00 to 0xff"))]
    MemoryOutOfBounds { address: usize, pc: usize },

    #[error("Stack overflow in instruction at {pc:#04x}")]
    #[diagnostic(
        code(ls8::exec::stack_overflow),
        help("the stack pointer cannot move below address 0x00")
    )]
    StackOverflow { pc: usize },

    #[error("Stack underflow in instruction at {pc:#04x}")]
    #[diagnostic(
        code(ls8::exec::stack_underflow),
        help("more values were popped than pushed")
    )]
    StackUnderflow { pc: usize },

    #[error("Could not write program output")]
    #[diagnostic(code(ls8::exec::output))]
    Output(#[source] io::Error),
}

impl Error {
    /// Process exit status reported by the `ls8` binary. Distinct per kind.
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::Invocation { .. } => 1,
            Error::ProgramNotFound { .. } => 2,
            Error::ProgramRead { .. } => 3,
            Error::InvalidWord { .. } => 4,
            Error::ProgramTooLarge { .. } => 5,
            Error::UnsupportedOperation { .. } => 6,
            Error::UnknownOpcode { .. } => 7,
            Error::RegisterOutOfBounds { .. } | Error::MemoryOutOfBounds { .. } => 8,
            Error::StackOverflow { .. } | Error::StackUnderflow { .. } => 9,
            Error::Output(_) => 10,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn loader_and_invocation_codes_differ() {
        let invocation = Error::Invocation {
            reason: "missing required argument".into(),
        };
        let missing = Error::ProgramNotFound {
            path: "prog.ls8".into(),
        };
        assert_eq!(invocation.exit_code(), 1);
        assert_eq!(missing.exit_code(), 2);
    }

    #[test]
    fn diagnostics_carry_codes() {
        let err = Error::UnknownOpcode {
            opcode: 0b1111_1111,
            pc: 4,
        };
        assert_eq!(
            err.code().map(|code| code.to_string()).as_deref(),
            Some("ls8::exec::unknown_opcode")
        );
        assert_eq!(
            err.to_string(),
            "Unknown opcode 0b11111111 at address 0x04"
        );
    }
}
