//! Bit layout shared by the assembler and the interpreter.
//!
//! ```text
//!  15    12 11                       0
//! +--------+--------------------------+
//! | opcode |     operand / address    |
//! +--------+--------------------------+
//!           11 10
//!          +-----+
//!          | sel |  skipcond condition selector
//!          +-----+
//! ```

use crate::symbol::Opcode;

/// Mask of the 12-bit operand field.
pub const OPERAND_MASK: u16 = 0x0FFF;

/// Pack an instruction word. Operands wider than 12 bits are truncated.
pub fn encode(opcode: Opcode, operand: u16) -> u16 {
    (opcode.code() << 12) | (operand & OPERAND_MASK)
}

/// Split a word into its opcode code and operand field.
pub fn decode(word: u16) -> (u16, u16) {
    (word >> 12, word & OPERAND_MASK)
}

/// Condition selector of a skipcond, taken from the full word.
pub fn skip_selector(word: u16) -> u16 {
    (word >> 10) & 0b11
}

/// Condition under which `skipcond` skips the next instruction.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SkipCondition {
    /// AC < 0
    Negative,
    /// AC == 0
    Zero,
    /// AC > 0
    Positive,
    /// Selector 0b11; never skips
    Never,
}

impl SkipCondition {
    pub fn from_selector(selector: u16) -> Self {
        match selector & 0b11 {
            0b00 => SkipCondition::Negative,
            0b01 => SkipCondition::Zero,
            0b10 => SkipCondition::Positive,
            _ => SkipCondition::Never,
        }
    }

    pub fn holds(self, ac: i64) -> bool {
        match self {
            SkipCondition::Negative => ac < 0,
            SkipCondition::Zero => ac == 0,
            SkipCondition::Positive => ac > 0,
            SkipCondition::Never => false,
        }
    }
}
