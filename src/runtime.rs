use crate::encoding::{decode, skip_selector, SkipCondition, OPERAND_MASK};
use crate::error::Fault;
use crate::image::Image;
use crate::memory::Memory;
use crate::output::Console;
use crate::parser::AsmParser;
use crate::symbol::Opcode;

/// MARIE register file.
///
/// Arithmetic is not truncated to 16 bits, so registers are wider than a memory word. Results
/// that leave the `i64` range fault instead of wrapping.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub struct Registers {
    /// Accumulator
    pub ac: i64,
    /// Memory address register
    pub mar: i64,
    /// Memory buffer register
    pub mbr: i64,
    /// Program counter
    pub pc: i64,
    /// Instruction register
    pub ir: i64,
    /// Input register
    pub input: i64,
    /// Output register
    pub output: i64,
}

impl Registers {
    /// Name and value of every register, in report order.
    pub fn iter(&self) -> [(&'static str, i64); 7] {
        [
            ("AC", self.ac),
            ("MAR", self.mar),
            ("MBR", self.mbr),
            ("PC", self.pc),
            ("IR", self.ir),
            ("InREG", self.input),
            ("OutREG", self.output),
        ]
    }
}

/// Outcome of a single instruction.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Step {
    Continue,
    Halt,
}

/// Why the run loop stopped.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Termination {
    Halted,
    Faulted(Fault),
}

/// Represents complete program state during runtime.
pub struct RunState {
    mem: Memory,
    reg: Registers,
}

impl RunState {
    /// Load an assembled image at the program origin, ready to execute from there.
    pub fn from_image(image: &Image) -> Result<RunState, Fault> {
        let mem = Memory::with_image(AsmParser::ORIG as usize, image.words())?;
        Ok(RunState::new(mem))
    }

    pub fn new(mem: Memory) -> RunState {
        RunState {
            mem,
            reg: Registers {
                pc: i64::from(AsmParser::ORIG),
                ..Registers::default()
            },
        }
    }

    pub fn registers(&self) -> &Registers {
        &self.reg
    }

    pub fn memory(&self) -> &Memory {
        &self.mem
    }

    /// Run until `halt` or a fault, then report the final register values.
    pub fn run(&mut self, console: &mut impl Console) -> Termination {
        let termination = loop {
            match self.step(console) {
                Ok(Step::Continue) => (),
                Ok(Step::Halt) => break Termination::Halted,
                Err(fault) => break Termination::Faulted(fault),
            }
        };
        console.print_termination(&termination);
        console.print_registers(&self.reg);
        termination
    }

    /// Fetch, decode and execute one instruction.
    pub fn step(&mut self, console: &mut impl Console) -> Result<Step, Fault> {
        let addr = self.reg.pc;
        self.fetch()?;
        let opcode = self.decode()?;
        console.print_trace(addr, self.reg.ir, opcode);
        self.execute(opcode, console)
    }

    fn fetch(&mut self) -> Result<(), Fault> {
        self.reg.mar = self.reg.pc;
        self.reg.mbr = self.mem.get(self.reg.mar)?;
        self.reg.ir = self.reg.mbr;
        self.reg.pc += 1;
        Ok(())
    }

    fn decode(&mut self) -> Result<Opcode, Fault> {
        let ir = self.reg.ir;
        self.reg.mar = ir & i64::from(OPERAND_MASK);
        // Stored accumulator values can be anything, not only 16-bit words
        let word = u16::try_from(ir).map_err(|_| Fault::UnrecognizedOpcode { ir })?;
        let (code, _) = decode(word);
        Opcode::from_code(code).ok_or(Fault::UnrecognizedOpcode { ir })
    }

    fn execute(&mut self, opcode: Opcode, console: &mut impl Console) -> Result<Step, Fault> {
        let reg = &mut self.reg;
        match opcode {
            Opcode::JumpAndStore => {
                reg.mbr = reg.pc;
                self.mem.set(reg.mar, reg.mbr)?;
                // Return slot is at MAR, subroutine body starts after it
                reg.mbr = reg.mar;
                reg.ac = reg.mbr + 1;
                reg.pc = reg.ac;
            }
            Opcode::Load => {
                reg.mbr = self.mem.get(reg.mar)?;
                reg.ac = reg.mbr;
            }
            Opcode::Store => {
                reg.mbr = reg.ac;
                self.mem.set(reg.mar, reg.mbr)?;
            }
            Opcode::Add => {
                reg.mbr = self.mem.get(reg.mar)?;
                reg.ac = checked(reg.ac.checked_add(reg.mbr), reg.ac)?;
            }
            Opcode::Subtract => {
                reg.mbr = self.mem.get(reg.mar)?;
                reg.ac = checked(reg.ac.checked_sub(reg.mbr), reg.ac)?;
            }
            Opcode::Input => {
                reg.input = parse_input(console.read_line().as_deref());
                reg.ac = reg.input;
            }
            Opcode::Output => {
                reg.output = reg.ac;
                match printable(reg.output) {
                    Some(ch) => console.print_char(ch),
                    None => console.print_decimal(reg.output),
                }
            }
            Opcode::Halt => return Ok(Step::Halt),
            Opcode::SkipCond => {
                let cond = SkipCondition::from_selector(skip_selector(reg.ir as u16));
                if cond.holds(reg.ac) {
                    reg.pc += 1;
                }
            }
            Opcode::Jump => reg.pc = reg.mar,
            Opcode::Clear => reg.ac = 0,
            Opcode::AddIndirect => {
                reg.mbr = self.mem.get(reg.mar)?;
                reg.mar = reg.mbr;
                reg.mbr = self.mem.get(reg.mar)?;
                reg.ac = checked(reg.ac.checked_add(reg.mbr), reg.ac)?;
            }
            Opcode::JumpIndirect => {
                reg.mbr = self.mem.get(reg.mar)?;
                reg.pc = reg.mbr;
            }
        }
        Ok(Step::Continue)
    }
}

fn checked(result: Option<i64>, ac: i64) -> Result<i64, Fault> {
    result.ok_or(Fault::Overflow { ac })
}

/// Integer input is taken as is, anything else as the code of its first character.
/// Exhausted input reads as zero.
fn parse_input(line: Option<&str>) -> i64 {
    let Some(line) = line else {
        return 0;
    };
    let line = line.trim();
    line.parse()
        .unwrap_or_else(|_| line.chars().next().map_or(0, |ch| i64::from(u32::from(ch))))
}

/// Only letters are printed as characters.
fn printable(value: i64) -> Option<char> {
    u8::try_from(value)
        .ok()
        .filter(u8::is_ascii_alphabetic)
        .map(char::from)
}
