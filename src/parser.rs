use crate::{
    air::{strip_hex_prefix, Air, AirKind, AirStmt, Operand, RawWord},
    error::{CompileError, CompileErrorKind},
    lexer::{lex, SourceLine, Token},
    symbol::{DefineError, DirKind, Opcode},
};

/// First assembler pass: transforms source lines into AIR and fills the symbol table.
pub struct AsmParser<'a> {
    /// Reference to the source file
    src: &'a str,
    /// Assembly intermediate representation
    air: Air,
    /// Address the next emitted word is loaded at
    addr: u16,
    /// Diagnostics collected so far
    errors: Vec<CompileError>,
}

impl<'a> AsmParser<'a> {
    /// Programs are loaded starting at this address.
    pub const ORIG: u16 = 1;

    pub fn new(src: &'a str) -> Self {
        AsmParser {
            src,
            air: Air::new(),
            addr: Self::ORIG,
            errors: Vec::new(),
        }
    }

    /// Create AIR out of the source. Lines with errors are skipped so that every line gets
    /// checked; all diagnostics are returned alongside the AIR.
    pub fn parse(mut self) -> (Air, Vec<CompileError>) {
        for line in lex(self.src) {
            if let Err(err) = self.parse_line(&line) {
                self.errors.push(err);
            }
        }
        (self.air, self.errors)
    }

    fn parse_line(&mut self, line: &SourceLine) -> Result<(), CompileError> {
        if let Some(label) = line.label {
            self.define_label(label, line.number)?;
        }

        let Some((first, rest)) = line.body.split_first() else {
            // Blank or label-only
            return Ok(());
        };

        let kind = if let Ok(opcode) = first.text.parse::<Opcode>() {
            AirKind::Instr {
                opcode,
                operand: self.operand(rest.first()),
            }
        } else if let Ok(dir) = first.text.parse::<DirKind>() {
            AirKind::RawWord(self.parse_literal(dir, *first, rest, line.number)?)
        } else {
            return Err(CompileError::new(
                CompileErrorKind::UnrecognizedSymbol(first.text.to_owned()),
                line.number,
                first.span,
            ));
        };

        // Operand span is more useful to point at during backpatching
        let span = rest.first().unwrap_or(first).span;
        self.air.add_stmt(AirStmt {
            addr: self.addr,
            kind,
            line: line.number,
            span,
        });
        self.addr += 1;
        Ok(())
    }

    fn define_label(&mut self, label: Token, line: usize) -> Result<(), CompileError> {
        let name = label.text.trim().to_ascii_lowercase();
        match self.air.symbols_mut().define(&name, self.addr) {
            Ok(()) => Ok(()),
            Err(DefineError::Reserved) => Err(CompileError::new(
                CompileErrorKind::ReservedWord(name),
                line,
                label.span,
            )),
            Err(DefineError::Duplicate) => Err(CompileError::new(
                CompileErrorKind::Redefinition(name),
                line,
                label.span,
            )),
        }
    }

    /// Labels defined above this line are resolved immediately, everything else waits for
    /// the second pass. A missing operand is zero.
    fn operand(&self, tok: Option<&Token>) -> Operand {
        match tok {
            None => Operand::Resolved(0),
            Some(tok) => match self.air.symbols().get(tok.text) {
                Some(addr) => Operand::Resolved(addr),
                None => Operand::Unresolved(tok.text.to_ascii_lowercase()),
            },
        }
    }

    fn parse_literal(
        &self,
        dir: DirKind,
        dir_tok: Token,
        rest: &[Token],
        line: usize,
    ) -> Result<RawWord, CompileError> {
        let [lit] = rest else {
            return Err(CompileError::new(
                CompileErrorKind::MissingNumber(dir.name().to_owned()),
                line,
                dir_tok.span,
            ));
        };
        let invalid = || {
            CompileError::new(
                CompileErrorKind::InvalidNumber(lit.text.to_owned()),
                line,
                lit.span,
            )
        };

        let (negative, digits) = match lit.text.strip_prefix('-') {
            Some(digits) => (true, digits),
            None => (false, lit.text.strip_prefix('+').unwrap_or(lit.text)),
        };
        let digits = match dir {
            DirKind::Dec => digits,
            DirKind::Hex => strip_hex_prefix(digits),
        };
        let magnitude = u32::from_str_radix(digits, dir.radix()).map_err(|_| invalid())?;
        let value = if negative {
            -(magnitude as i64)
        } else {
            magnitude as i64
        };

        // Negative literals are stored as their two's complement
        if !(i16::MIN as i64..=u16::MAX as i64).contains(&value) {
            return Err(invalid());
        }
        Ok(RawWord(value as u16))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> (Air, Vec<CompileError>) {
        AsmParser::new(src).parse()
    }

    fn kinds(errors: &[CompileError]) -> Vec<&CompileErrorKind> {
        errors.iter().map(|err| &err.kind).collect()
    }

    #[test]
    fn parse_instructions() {
        let (air, errors) = parse("load x\nHALT\nx, dec 7");
        assert!(errors.is_empty());
        assert_eq!(air.len(), 3);
        assert_eq!(
            air.get(0).kind,
            AirKind::Instr {
                opcode: Opcode::Load,
                operand: Operand::Unresolved("x".into()),
            }
        );
        assert_eq!(
            air.get(1).kind,
            AirKind::Instr {
                opcode: Opcode::Halt,
                operand: Operand::Resolved(0),
            }
        );
        assert_eq!(air.get(2).kind, AirKind::RawWord(RawWord(7)));
        assert_eq!(air.get(2).addr, 3);
        assert_eq!(air.symbols().get("x"), Some(3));
    }

    #[test]
    fn backward_reference_resolves_early() {
        let (air, errors) = parse("top, clear\njump Top");
        assert!(errors.is_empty());
        assert_eq!(
            air.get(1).kind,
            AirKind::Instr {
                opcode: Opcode::Jump,
                operand: Operand::Resolved(1),
            }
        );
    }

    #[test]
    fn blank_and_label_only_lines_take_no_address() {
        let src = "/ header comment\n\nstart,\n    clear\nend, halt\n";
        let (air, errors) = parse(src);
        assert!(errors.is_empty());
        assert_eq!(air.len(), 2);
        assert_eq!(air.symbols().get("start"), Some(1));
        assert_eq!(air.symbols().get("end"), Some(2));
        assert_eq!(air.get(1).line, 5);
    }

    #[test]
    fn parse_literals() {
        let (air, errors) = parse("a, hex FF\nb, dec -1\nc, hex 0x10\nd, dec 65535");
        assert!(errors.is_empty());
        let words: Vec<_> = (&air).into_iter().map(|stmt| stmt.emit().unwrap()).collect();
        assert_eq!(words, [0x00FF, 0xFFFF, 0x0010, 0xFFFF]);
    }

    #[test]
    fn missing_number() {
        let (air, errors) = parse("clear\nx, dec\nhalt");
        assert_eq!(
            kinds(&errors),
            [&CompileErrorKind::MissingNumber("dec".into())]
        );
        assert_eq!(errors[0].line, 2);
        // Label is still defined, the line emits nothing
        assert_eq!(air.len(), 2);
        assert_eq!(air.get(1).addr, 2);
    }

    #[test]
    fn too_many_literals() {
        let (_, errors) = parse("x, hex 1 2");
        assert_eq!(
            kinds(&errors),
            [&CompileErrorKind::MissingNumber("hex".into())]
        );
    }

    #[test]
    fn invalid_numbers() {
        let (_, errors) = parse("a, dec twelve\nb, hex 10000\nc, dec -32769\nd, hex 0x");
        assert_eq!(errors.len(), 4);
        assert!(errors
            .iter()
            .all(|err| matches!(err.kind, CompileErrorKind::InvalidNumber(_))));
    }

    #[test]
    fn reserved_and_duplicate_labels() {
        let (_, errors) = parse("load, clear\nx, clear\nX, halt");
        assert_eq!(
            kinds(&errors),
            [
                &CompileErrorKind::ReservedWord("load".into()),
                &CompileErrorKind::Redefinition("x".into()),
            ]
        );
        assert_eq!(errors[1].line, 3);
    }

    #[test]
    fn unknown_mnemonic_keeps_going() {
        let (air, errors) = parse("lod x\nbogus\nhalt");
        assert_eq!(errors.len(), 2);
        assert_eq!(
            errors[0].kind,
            CompileErrorKind::UnrecognizedSymbol("lod".into())
        );
        assert_eq!(errors[1].line, 2);
        assert_eq!(air.len(), 1);
        assert_eq!(air.get(0).addr, 1);
    }
}
