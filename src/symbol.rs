use std::{fmt, str::FromStr};

use fxhash::FxBuildHasher;
use indexmap::IndexMap;

// Symbol table of label -> memory address
type FxMap<K, V> = IndexMap<K, V, FxBuildHasher>;

/// The thirteen MARIE operations, bound to their 4-bit codes.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Opcode {
    /// Store return address at operand, continue after it
    JumpAndStore = 0x0,
    Load = 0x1,
    Store = 0x2,
    Add = 0x3,
    Subtract = 0x4,
    Input = 0x5,
    Output = 0x6,
    Halt = 0x7,
    /// Skip next instruction depending on AC and the condition selector
    SkipCond = 0x8,
    Jump = 0x9,
    Clear = 0xA,
    AddIndirect = 0xB,
    JumpIndirect = 0xC,
}

impl Opcode {
    pub const ALL: [Opcode; 13] = [
        Opcode::JumpAndStore,
        Opcode::Load,
        Opcode::Store,
        Opcode::Add,
        Opcode::Subtract,
        Opcode::Input,
        Opcode::Output,
        Opcode::Halt,
        Opcode::SkipCond,
        Opcode::Jump,
        Opcode::Clear,
        Opcode::AddIndirect,
        Opcode::JumpIndirect,
    ];

    pub fn code(self) -> u16 {
        self as u16
    }

    /// Look up the operation bound to a 4-bit code. Codes 13 to 15 have none.
    pub fn from_code(code: u16) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::JumpAndStore => "jns",
            Opcode::Load => "load",
            Opcode::Store => "store",
            Opcode::Add => "add",
            Opcode::Subtract => "subt",
            Opcode::Input => "input",
            Opcode::Output => "output",
            Opcode::Halt => "halt",
            Opcode::SkipCond => "skipcond",
            Opcode::Jump => "jump",
            Opcode::Clear => "clear",
            Opcode::AddIndirect => "addi",
            Opcode::JumpIndirect => "jumpi",
        }
    }
}

impl FromStr for Opcode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.mnemonic().eq_ignore_ascii_case(s))
            .ok_or(())
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// Data directives, each emitting one raw word.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DirKind {
    Dec,
    Hex,
}

impl DirKind {
    pub fn name(self) -> &'static str {
        match self {
            DirKind::Dec => "dec",
            DirKind::Hex => "hex",
        }
    }

    pub fn radix(self) -> u32 {
        match self {
            DirKind::Dec => 10,
            DirKind::Hex => 16,
        }
    }
}

impl FromStr for DirKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("dec") {
            Ok(DirKind::Dec)
        } else if s.eq_ignore_ascii_case("hex") {
            Ok(DirKind::Hex)
        } else {
            Err(())
        }
    }
}

/// Mnemonics and directive names cannot be used as labels.
pub fn is_reserved(word: &str) -> bool {
    word.parse::<Opcode>().is_ok() || word.parse::<DirKind>().is_ok()
}

/// Why a label could not be defined.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DefineError {
    Reserved,
    Duplicate,
}

/// Label -> address mapping built during the first assembler pass.
///
/// Labels are case-insensitive and surrounding whitespace is ignored.
#[derive(Debug, Default)]
pub struct SymbolTable {
    table: FxMap<String, u16>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable {
            table: IndexMap::with_hasher(FxBuildHasher::default()),
        }
    }

    fn key(label: &str) -> String {
        label.trim().to_ascii_lowercase()
    }

    pub fn define(&mut self, label: &str, addr: u16) -> Result<(), DefineError> {
        let key = Self::key(label);
        if is_reserved(&key) {
            return Err(DefineError::Reserved);
        }
        if self.table.contains_key(&key) {
            return Err(DefineError::Duplicate);
        }
        self.table.insert(key, addr);
        Ok(())
    }

    pub fn get(&self, label: &str) -> Option<u16> {
        self.table.get(&Self::key(label)).copied()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Labels in definition order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u16)> {
        self.table.iter().map(|(label, addr)| (label.as_str(), *addr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opcode_codes() {
        for (code, op) in Opcode::ALL.iter().enumerate() {
            assert_eq!(op.code() as usize, code);
            assert_eq!(Opcode::from_code(code as u16), Some(*op));
        }
        for code in 13..16 {
            assert_eq!(Opcode::from_code(code), None);
        }
    }

    #[test]
    fn mnemonics_case_insensitive() {
        assert_eq!("LOAD".parse(), Ok(Opcode::Load));
        assert_eq!("SkipCond".parse(), Ok(Opcode::SkipCond));
        assert_eq!("jns".parse(), Ok(Opcode::JumpAndStore));
        assert!("ld".parse::<Opcode>().is_err());
        assert_eq!("HEX".parse(), Ok(DirKind::Hex));
    }

    #[test]
    fn reserved_labels() {
        let mut table = SymbolTable::new();
        assert_eq!(table.define("halt", 1), Err(DefineError::Reserved));
        assert_eq!(table.define("Dec", 1), Err(DefineError::Reserved));
        assert!(table.is_empty());
    }

    #[test]
    fn duplicate_labels() {
        let mut table = SymbolTable::new();
        assert_eq!(table.define("loop", 3), Ok(()));
        assert_eq!(table.define(" LOOP ", 7), Err(DefineError::Duplicate));
        assert_eq!(table.get("Loop"), Some(3));
        assert_eq!(table.len(), 1);
    }
}
