use std::fmt;

use crate::{
    error::{Error, Result},
    isa::Register,
    runtime::Processor,
};

/// Operation tags accepted by the arithmetic logic unit.
///
/// The tag space mirrors the full LS-8 ALU, but only [`AluOp::Add`] is wired up.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AluOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    And,
    Or,
    Xor,
    Not,
    Shl,
    Shr,
    Inc,
    Dec,
    Cmp,
}

impl fmt::Display for AluOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AluOp::Add => "ADD",
            AluOp::Sub => "SUB",
            AluOp::Mul => "MUL",
            AluOp::Div => "DIV",
            AluOp::Mod => "MOD",
            AluOp::And => "AND",
            AluOp::Or => "OR",
            AluOp::Xor => "XOR",
            AluOp::Not => "NOT",
            AluOp::Shl => "SHL",
            AluOp::Shr => "SHR",
            AluOp::Inc => "INC",
            AluOp::Dec => "DEC",
            AluOp::Cmp => "CMP",
        };
        f.write_str(name)
    }
}

impl Processor {
    /// Apply `op` to `reg_a` and `reg_b`, storing the result in `reg_a`.
    ///
    /// Unsupported tags fail before any register is touched.
    pub fn alu(&mut self, op: AluOp, reg_a: Register, reg_b: Register) -> Result<()> {
        match op {
            AluOp::Add => {
                let res = self.reg(reg_a).wrapping_add(self.reg(reg_b));
                *self.reg_mut(reg_a) = res;
                Ok(())
            }
            _ => Err(Error::UnsupportedOperation { op }),
        }
    }
}
