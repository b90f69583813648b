use std::{
    cmp::Ordering,
    fmt::Write as _,
    io::{self, Write},
};

use tracing::{debug, trace};

use crate::{
    alu::AluOp,
    error::{Error, Result},
    isa::{Opcode, Register},
    loader::Program,
};

/// The LS-8 can address 256 bytes of memory, shared by program text and stack.
pub const MEMORY_SIZE: usize = 256;

/// Initial value of the stack pointer. The stack grows down from here.
pub const STACK_TOP: u8 = 0xF4;

/// Represents complete processor state during runtime.
#[derive(Clone, Debug)]
pub struct Processor {
    /// System memory, program text and stack alike
    mem: [u8; MEMORY_SIZE],
    /// Program counter
    pc: usize,
    /// 8x 8-bit registers, R7 is the stack pointer
    reg: [u8; Register::COUNT],
    /// Result of the last `CMP`
    flags: Flags,
    running: bool,
}

/// Comparison flags, laid out like the low bits of the `FL` register: `00000LGE`.
///
/// Only ever built from an [`Ordering`], so at most one flag is set.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Flags {
    #[default]
    Clear = 0b000,
    Less = 0b100,
    Greater = 0b010,
    Equal = 0b001,
}

impl Flags {
    pub fn equal(self) -> u8 {
        self as u8 & 0b001
    }

    pub fn greater_than(self) -> u8 {
        (self as u8 & 0b010) >> 1
    }

    pub fn less_than(self) -> u8 {
        (self as u8 & 0b100) >> 2
    }
}

impl From<Ordering> for Flags {
    fn from(value: Ordering) -> Self {
        match value {
            Ordering::Less => Flags::Less,
            Ordering::Equal => Flags::Equal,
            Ordering::Greater => Flags::Greater,
        }
    }
}

impl Default for Processor {
    fn default() -> Self {
        Self::new()
    }
}

impl Processor {
    pub fn new() -> Processor {
        let mut reg = [0; Register::COUNT];
        reg[Register::SP.index()] = STACK_TOP;
        Processor {
            mem: [0; MEMORY_SIZE],
            pc: 0,
            reg,
            flags: Flags::Clear,
            running: false,
        }
    }

    /// Fresh processor with `raw` loaded at address 0.
    pub fn from_raw(raw: &[u8]) -> Result<Processor> {
        let mut cpu = Processor::new();
        cpu.load_words(raw)?;
        Ok(cpu)
    }

    pub fn load(&mut self, program: &Program) -> Result<()> {
        self.load_words(program.words())
    }

    /// Copy `words` into memory starting at address 0. Memory is left untouched
    /// if the program does not fit.
    pub fn load_words(&mut self, words: &[u8]) -> Result<()> {
        if words.len() > MEMORY_SIZE {
            return Err(Error::ProgramTooLarge { len: words.len() });
        }
        self.mem[..words.len()].copy_from_slice(words);
        debug!(words = words.len(), "loaded program");
        Ok(())
    }

    /// Return every field to its power-on state, including memory.
    pub fn reset(&mut self) {
        *self = Processor::new();
    }

    /// Leave the halted state. `HLT` is the only way back.
    pub fn start(&mut self) {
        self.running = true;
    }

    /// Run with preset memory until `HLT`, printing to stdout.
    pub fn run(&mut self) -> Result<()> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        self.run_with(&mut out)
    }

    /// Run with preset memory until `HLT`, printing to `out`.
    ///
    /// Never gives up on its own: a program that jumps to itself keeps this
    /// looping forever.
    pub fn run_with(&mut self, out: &mut impl Write) -> Result<()> {
        self.start();
        let mut steps: u64 = 0;
        while self.running {
            if let Err(err) = self.step(out) {
                self.running = false;
                debug!(steps, pc = self.pc, "aborted");
                return Err(err);
            }
            steps += 1;
        }
        debug!(steps, "halted");
        out.flush().map_err(Error::Output)
    }

    /// Fetch, decode and execute a single instruction.
    pub fn step(&mut self, out: &mut impl Write) -> Result<()> {
        let pc = self.pc;
        let op = Opcode::decode(self.read(pc)?, pc)?;
        trace!(target: "ls8::trace", "{}", self.trace_line());
        match op {
            Opcode::HLT => self.hlt(),
            Opcode::LDI => self.ldi()?,
            Opcode::PRN => self.prn(out)?,
            Opcode::MUL => self.mul()?,
            Opcode::PUSH => self.push()?,
            Opcode::POP => self.pop()?,
            Opcode::CALL => self.call()?,
            Opcode::RET => self.ret()?,
            Opcode::ADD => self.add()?,
            Opcode::CMP => self.cmp()?,
            Opcode::JMP => self.jmp()?,
            Opcode::JNE => self.jne()?,
            Opcode::JEQ => self.jeq()?,
        }
        Ok(())
    }

    pub fn memory(&self) -> &[u8; MEMORY_SIZE] {
        &self.mem
    }

    pub fn registers(&self) -> &[u8; Register::COUNT] {
        &self.reg
    }

    pub fn register(&self, reg: Register) -> u8 {
        self.reg(reg)
    }

    pub fn program_counter(&self) -> usize {
        self.pc
    }

    pub fn stack_pointer(&self) -> u8 {
        self.reg(Register::SP)
    }

    pub fn flags(&self) -> Flags {
        self.flags
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// One line of machine state: `TRACE: PC | M[PC] M[PC+1] M[PC+2] | R0 .. R7`.
    pub fn trace_line(&self) -> String {
        let peek = |addr: usize| self.mem.get(addr).copied().unwrap_or(0);
        let mut line = format!(
            "TRACE: {:02X} | {:02X} {:02X} {:02X} |",
            self.pc,
            peek(self.pc),
            peek(self.pc + 1),
            peek(self.pc + 2),
        );
        for val in self.reg {
            // Writing to a `String` cannot fail
            let _ = write!(line, " {val:02X}");
        }
        line
    }

    #[inline]
    pub(crate) fn reg(&self, reg: Register) -> u8 {
        self.reg[reg.index()]
    }

    #[inline]
    pub(crate) fn reg_mut(&mut self, reg: Register) -> &mut u8 {
        &mut self.reg[reg.index()]
    }

    #[inline]
    fn read(&self, addr: usize) -> Result<u8> {
        self.mem
            .get(addr)
            .copied()
            .ok_or_else(|| Error::MemoryOutOfBounds {
                address: addr,
                pc: self.pc,
            })
    }

    /// Operand byte `n` places after the opcode.
    #[inline]
    fn operand(&self, n: usize) -> Result<u8> {
        self.read(self.pc + n)
    }

    #[inline]
    fn operand_reg(&self, n: usize) -> Result<Register> {
        Register::decode(self.operand(n)?, self.pc)
    }

    fn push_val(&mut self, val: u8) -> Result<()> {
        let sp = self.stack_pointer();
        if sp == 0 {
            return Err(Error::StackOverflow { pc: self.pc });
        }
        // Decrement stack
        *self.reg_mut(Register::SP) = sp - 1;
        // Save onto stack
        self.mem[(sp - 1) as usize] = val;
        Ok(())
    }

    fn pop_val(&mut self) -> Result<u8> {
        let sp = self.stack_pointer();
        if sp == u8::MAX {
            return Err(Error::StackUnderflow { pc: self.pc });
        }
        let val = self.mem[sp as usize];
        *self.reg_mut(Register::SP) = sp + 1;
        Ok(val)
    }

    fn hlt(&mut self) {
        self.running = false;
        self.pc = 0;
    }

    fn ldi(&mut self) -> Result<()> {
        let dr = self.operand_reg(1)?;
        let imm = self.operand(2)?;
        *self.reg_mut(dr) = imm;
        self.pc += Opcode::LDI.width();
        Ok(())
    }

    fn prn(&mut self, out: &mut impl Write) -> Result<()> {
        let sr = self.operand_reg(1)?;
        writeln!(out, "{}", self.reg(sr)).map_err(Error::Output)?;
        self.pc += Opcode::PRN.width();
        Ok(())
    }

    fn mul(&mut self) -> Result<()> {
        let ra = self.operand_reg(1)?;
        let rb = self.operand_reg(2)?;
        let res = self.reg(ra).wrapping_mul(self.reg(rb));
        *self.reg_mut(ra) = res;
        self.pc += Opcode::MUL.width();
        Ok(())
    }

    fn add(&mut self) -> Result<()> {
        let ra = self.operand_reg(1)?;
        let rb = self.operand_reg(2)?;
        self.alu(AluOp::Add, ra, rb)?;
        self.pc += Opcode::ADD.width();
        Ok(())
    }

    fn push(&mut self) -> Result<()> {
        let sr = self.operand_reg(1)?;
        self.push_val(self.reg(sr))?;
        self.pc += Opcode::PUSH.width();
        Ok(())
    }

    fn pop(&mut self) -> Result<()> {
        let dr = self.operand_reg(1)?;
        let val = self.pop_val()?;
        *self.reg_mut(dr) = val;
        self.pc += Opcode::POP.width();
        Ok(())
    }

    fn call(&mut self) -> Result<()> {
        let br = self.operand_reg(1)?;
        let ret_addr = self.pc + Opcode::CALL.width();
        let ret_addr = u8::try_from(ret_addr).map_err(|_| Error::MemoryOutOfBounds {
            address: ret_addr,
            pc: self.pc,
        })?;
        self.push_val(ret_addr)?;
        self.pc = self.reg(br) as usize;
        Ok(())
    }

    fn ret(&mut self) -> Result<()> {
        self.pc = self.pop_val()? as usize;
        Ok(())
    }

    fn cmp(&mut self) -> Result<()> {
        let ra = self.operand_reg(1)?;
        let rb = self.operand_reg(2)?;
        self.flags = Flags::from(self.reg(ra).cmp(&self.reg(rb)));
        self.pc += Opcode::CMP.width();
        Ok(())
    }

    fn jmp(&mut self) -> Result<()> {
        let br = self.operand_reg(1)?;
        self.pc = self.reg(br) as usize;
        Ok(())
    }

    fn jeq(&mut self) -> Result<()> {
        let br = self.operand_reg(1)?;
        if self.flags.equal() == 1 {
            self.pc = self.reg(br) as usize;
        } else {
            self.pc += Opcode::JEQ.width();
        }
        Ok(())
    }

    // Only looks at `E`, `L` and `G` are ignored
    fn jne(&mut self) -> Result<()> {
        let br = self.operand_reg(1)?;
        if self.flags.equal() == 0 {
            self.pc = self.reg(br) as usize;
        } else {
            self.pc += Opcode::JNE.width();
        }
        Ok(())
    }
}
