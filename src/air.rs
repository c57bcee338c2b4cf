use crate::{
    encoding::{encode, OPERAND_MASK},
    error::{CompileError, CompileErrorKind},
    span::Span,
    symbol::{Opcode, SymbolTable},
};

/// Assembly intermediate representation: statements in address order plus the labels they
/// define.
#[derive(Debug, Default)]
pub struct Air {
    ast: Vec<AirStmt>,
    symbols: SymbolTable,
}

impl Air {
    pub fn new() -> Self {
        Air {
            ast: Vec::new(),
            symbols: SymbolTable::new(),
        }
    }

    pub fn add_stmt(&mut self, stmt: AirStmt) {
        self.ast.push(stmt)
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn symbols_mut(&mut self) -> &mut SymbolTable {
        &mut self.symbols
    }

    pub fn into_symbols(self) -> SymbolTable {
        self.symbols
    }

    /// Second pass: resolve every operand left unresolved during parsing, using the now
    /// complete symbol table. Statements that cannot be resolved are reported and left as is.
    pub fn backpatch(&mut self) -> Vec<CompileError> {
        let mut errors = Vec::new();
        for stmt in &mut self.ast {
            let AirKind::Instr { opcode, operand } = &mut stmt.kind else {
                continue;
            };
            let Operand::Unresolved(sym) = &*operand else {
                continue;
            };
            match resolve(&self.symbols, *opcode, sym) {
                Ok(addr) => *operand = Operand::Resolved(addr),
                Err(kind) => errors.push(CompileError::new(kind, stmt.line, stmt.span)),
            }
        }
        errors
    }

    pub fn get(&self, idx: usize) -> &AirStmt {
        &self.ast[idx]
    }

    pub fn len(&self) -> usize {
        self.ast.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ast.is_empty()
    }
}

impl<'a> IntoIterator for &'a Air {
    type Item = &'a AirStmt;
    type IntoIter = std::slice::Iter<'a, AirStmt>;

    fn into_iter(self) -> Self::IntoIter {
        self.ast.iter()
    }
}

/// Operand symbol lookup, in order: label, skipcond condition in hex, decimal address.
fn resolve(symbols: &SymbolTable, opcode: Opcode, sym: &str) -> Result<u16, CompileErrorKind> {
    if let Some(addr) = symbols.get(sym) {
        return Ok(addr);
    }
    let literal = if opcode == Opcode::SkipCond {
        let digits = strip_hex_prefix(sym);
        u32::from_str_radix(digits, 16)
            .map_err(|_| CompileErrorKind::InvalidNumber(sym.to_owned()))?
    } else {
        sym.parse::<u32>()
            .map_err(|_| CompileErrorKind::UnrecognizedSymbol(sym.to_owned()))?
    };
    // Must fit the address field
    u16::try_from(literal)
        .ok()
        .filter(|addr| *addr <= OPERAND_MASK)
        .ok_or_else(|| CompileErrorKind::InvalidNumber(sym.to_owned()))
}

pub(crate) fn strip_hex_prefix(lit: &str) -> &str {
    lit.strip_prefix("0x")
        .or_else(|| lit.strip_prefix("0X"))
        .unwrap_or(lit)
}

/// Instruction operand, either known or waiting on the second pass.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Operand {
    Resolved(u16),
    Unresolved(String),
}

/// Single MARIE statement occupying one word of memory.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct AirStmt {
    /// Memory address this word is loaded at
    pub addr: u16,
    pub kind: AirKind,
    /// Source line, 1-based
    pub line: usize,
    /// Operand or instruction span, used for diagnostics
    pub span: Span,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum AirKind {
    Instr { opcode: Opcode, operand: Operand },
    /// Literal from `dec` or `hex`
    RawWord(RawWord),
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct RawWord(pub u16);

impl AirStmt {
    /// Encode into a machine word. Fails if the operand was never resolved.
    pub fn emit(&self) -> Result<u16, CompileError> {
        match &self.kind {
            AirKind::Instr {
                opcode,
                operand: Operand::Resolved(addr),
            } => Ok(encode(*opcode, *addr)),
            AirKind::Instr {
                operand: Operand::Unresolved(sym),
                ..
            } => Err(CompileError::new(
                CompileErrorKind::UnrecognizedSymbol(sym.clone()),
                self.line,
                self.span,
            )),
            AirKind::RawWord(RawWord(word)) => Ok(*word),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instr(addr: u16, opcode: Opcode, operand: Operand) -> AirStmt {
        AirStmt {
            addr,
            kind: AirKind::Instr { opcode, operand },
            line: addr as usize,
            span: Span::default(),
        }
    }

    #[test]
    fn backpatch_labels() {
        let mut air = Air::new();
        air.add_stmt(instr(1, Opcode::Load, Operand::Unresolved("Num".into())));
        air.add_stmt(instr(2, Opcode::Halt, Operand::Resolved(0)));
        air.symbols_mut().define("num", 3).unwrap();
        air.add_stmt(AirStmt {
            addr: 3,
            kind: AirKind::RawWord(RawWord(42)),
            line: 3,
            span: Span::default(),
        });

        assert!(air.backpatch().is_empty());
        assert_eq!(air.get(0).kind, AirKind::Instr {
            opcode: Opcode::Load,
            operand: Operand::Resolved(3),
        });
        let words: Vec<u16> = (&air).into_iter().map(|stmt| stmt.emit().unwrap()).collect();
        assert_eq!(words, [0x1003, 0x7000, 42]);
    }

    #[test]
    fn backpatch_skipcond_hex() {
        let mut air = Air::new();
        air.add_stmt(instr(1, Opcode::SkipCond, Operand::Unresolved("800".into())));
        assert!(air.backpatch().is_empty());
        assert_eq!(air.get(0).emit(), Ok(0x8800));
    }

    #[test]
    fn backpatch_decimal_address() {
        let mut air = Air::new();
        air.add_stmt(instr(1, Opcode::Store, Operand::Unresolved("100".into())));
        assert!(air.backpatch().is_empty());
        assert_eq!(air.get(0).emit(), Ok(0x2064));
    }

    #[test]
    fn backpatch_reports_every_unknown_symbol() {
        let mut air = Air::new();
        air.add_stmt(instr(1, Opcode::Load, Operand::Unresolved("nope".into())));
        air.add_stmt(instr(2, Opcode::Jump, Operand::Unresolved("nowhere".into())));
        let errors = air.backpatch();
        assert_eq!(errors.len(), 2);
        assert_eq!(
            errors[1].kind,
            CompileErrorKind::UnrecognizedSymbol("nowhere".into())
        );
        assert_eq!(errors[1].line, 2);
        assert!(air.get(0).emit().is_err());
    }

    #[test]
    fn backpatch_rejects_wide_literals() {
        let mut air = Air::new();
        air.add_stmt(instr(1, Opcode::Load, Operand::Unresolved("5000".into())));
        air.add_stmt(instr(2, Opcode::Store, Operand::Unresolved("4095".into())));
        air.add_stmt(instr(3, Opcode::SkipCond, Operand::Unresolved("1000".into())));
        air.add_stmt(instr(4, Opcode::Jump, Operand::Unresolved("70000".into())));
        let errors = air.backpatch();
        let kinds: Vec<_> = errors.iter().map(|err| (err.line, &err.kind)).collect();
        assert_eq!(
            kinds,
            [
                (1, &CompileErrorKind::InvalidNumber("5000".into())),
                (3, &CompileErrorKind::InvalidNumber("1000".into())),
                (4, &CompileErrorKind::InvalidNumber("70000".into())),
            ]
        );
        assert_eq!(air.get(1).emit(), Ok(0x2FFF));
    }
}
