use std::fmt;

use crate::error::Error;

/// Every instruction understood by the LS-8.
///
/// Opcode values are matched literally. The machine never decodes the operand
/// count or ALU bits out of the byte, although the values happen to follow that
/// layout.
#[allow(clippy::upper_case_acronyms)]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[repr(u8)]
pub enum Opcode {
    /// Halt and reset the program counter
    HLT = 0b0000_0001,
    /// Load immediate into register
    LDI = 0b1000_0010,
    /// Print register as decimal
    PRN = 0b0100_0111,
    /// Multiply register A by register B
    MUL = 0b1010_0010,
    /// Push register onto the stack
    PUSH = 0b0100_0101,
    /// Pop top of stack into register
    POP = 0b0100_0110,
    /// Push return address and jump to address in register
    CALL = 0b0101_0000,
    /// Pop return address into the program counter
    RET = 0b0001_0001,
    /// Add register B to register A, through the ALU
    ADD = 0b1010_0000,
    /// Compare two registers and set flags
    CMP = 0b1010_0111,
    /// Jump to address in register
    JMP = 0b0101_0100,
    /// Jump if not equal
    JNE = 0b0101_0110,
    /// Jump if equal
    JEQ = 0b0101_0101,
}

impl Opcode {
    pub const ALL: [Opcode; 13] = [
        Opcode::HLT,
        Opcode::LDI,
        Opcode::PRN,
        Opcode::MUL,
        Opcode::PUSH,
        Opcode::POP,
        Opcode::CALL,
        Opcode::RET,
        Opcode::ADD,
        Opcode::CMP,
        Opcode::JMP,
        Opcode::JNE,
        Opcode::JEQ,
    ];

    /// Number of bytes following the opcode in memory.
    pub fn operand_count(self) -> usize {
        match self {
            Opcode::HLT | Opcode::RET => 0,
            Opcode::PRN
            | Opcode::PUSH
            | Opcode::POP
            | Opcode::CALL
            | Opcode::JMP
            | Opcode::JNE
            | Opcode::JEQ => 1,
            Opcode::LDI | Opcode::MUL | Opcode::ADD | Opcode::CMP => 2,
        }
    }

    /// Distance to the next instruction when executed as straight-line code.
    pub fn width(self) -> usize {
        1 + self.operand_count()
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::HLT => "HLT",
            Opcode::LDI => "LDI",
            Opcode::PRN => "PRN",
            Opcode::MUL => "MUL",
            Opcode::PUSH => "PUSH",
            Opcode::POP => "POP",
            Opcode::CALL => "CALL",
            Opcode::RET => "RET",
            Opcode::ADD => "ADD",
            Opcode::CMP => "CMP",
            Opcode::JMP => "JMP",
            Opcode::JNE => "JNE",
            Opcode::JEQ => "JEQ",
        }
    }

    /// Decode the byte found at `pc`.
    pub fn decode(byte: u8, pc: usize) -> Result<Opcode, Error> {
        Opcode::try_from(byte).map_err(|_| Error::UnknownOpcode { opcode: byte, pc })
    }
}

impl TryFrom<u8> for Opcode {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Opcode::ALL
            .into_iter()
            .find(|op| *op as u8 == value)
            .ok_or(value)
    }
}

impl From<Opcode> for u8 {
    fn from(value: Opcode) -> Self {
        value as u8
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// Represents the CPU registers.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum Register {
    R0 = 0,
    R1,
    R2,
    R3,
    R4,
    R5,
    R6,
    /// Reserved as the stack pointer.
    R7,
}

impl Register {
    pub const SP: Register = Register::R7;
    pub const COUNT: usize = 8;

    pub fn index(self) -> usize {
        self as usize
    }

    /// Decode a register operand read at `pc`.
    pub fn decode(byte: u8, pc: usize) -> Result<Register, Error> {
        Register::try_from(byte).map_err(|_| Error::RegisterOutOfBounds { index: byte, pc })
    }
}

impl TryFrom<u8> for Register {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Register::R0),
            1 => Ok(Register::R1),
            2 => Ok(Register::R2),
            3 => Ok(Register::R3),
            4 => Ok(Register::R4),
            5 => Ok(Register::R5),
            6 => Ok(Register::R6),
            7 => Ok(Register::R7),
            _ => Err(value),
        }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R{}", self.index())
    }
}
