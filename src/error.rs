use std::fmt;

use miette::{miette, LabeledSpan, Report, Severity};

use crate::span::Span;

// Assembler errors

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum CompileErrorKind {
    /// Label is a mnemonic or directive name
    ReservedWord(String),
    /// Label defined more than once
    Redefinition(String),
    /// `dec`/`hex` without exactly one literal
    MissingNumber(String),
    /// Literal that cannot be parsed or does not fit in a word
    InvalidNumber(String),
    /// Unknown mnemonic, or operand that is not a label
    UnrecognizedSymbol(String),
}

/// Single assembler diagnostic, tied to the source line it came from.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct CompileError {
    pub kind: CompileErrorKind,
    /// 1-based source line
    pub line: usize,
    pub span: Span,
}

impl CompileError {
    pub fn new(kind: CompileErrorKind, line: usize, span: Span) -> Self {
        CompileError { kind, line, span }
    }

    /// Render as a diagnostic pointing into `src`.
    pub fn report(&self, src: &str) -> Report {
        let report = match &self.kind {
            CompileErrorKind::ReservedWord(label) => miette!(
                severity = Severity::Error,
                code = "asm::reserved_word",
                help = "instruction mnemonics and the `dec`/`hex` directives cannot be labels",
                labels = vec![LabeledSpan::at(self.span, "reserved word")],
                "Label `{label}` is a reserved word at line {}",
                self.line
            ),
            CompileErrorKind::Redefinition(label) => miette!(
                severity = Severity::Error,
                code = "asm::redefinition",
                help = "labels are only allowed once per file",
                labels = vec![LabeledSpan::at(self.span, "duplicate label")],
                "Redefinition of label `{label}` at line {}",
                self.line
            ),
            CompileErrorKind::MissingNumber(dir) => miette!(
                severity = Severity::Error,
                code = "asm::missing_number",
                help = format!("`{dir}` requires exactly one numeric literal to follow"),
                labels = vec![LabeledSpan::at(self.span, "missing literal")],
                "Missing number after `{dir}` at line {}",
                self.line
            ),
            CompileErrorKind::InvalidNumber(lit) => miette!(
                severity = Severity::Error,
                code = "asm::invalid_number",
                help = "`dec` takes values from -32,768 to 65,535, `hex` from 0 to FFFF",
                labels = vec![LabeledSpan::at(self.span, "invalid literal")],
                "Invalid number `{lit}` at line {}",
                self.line
            ),
            CompileErrorKind::UnrecognizedSymbol(sym) => miette!(
                severity = Severity::Error,
                code = "asm::unrecognized_symbol",
                help = "check the spelling of the instruction or label",
                labels = vec![LabeledSpan::at(self.span, "unknown symbol")],
                "Unrecognized symbol `{sym}` at line {}",
                self.line
            ),
        };
        report.with_source_code(src.to_owned())
    }
}

impl fmt::Display for CompileErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReservedWord(label) => write!(f, "label `{label}` is a reserved word"),
            Self::Redefinition(label) => write!(f, "redefinition of label `{label}`"),
            Self::MissingNumber(dir) => write!(f, "missing number after `{dir}`"),
            Self::InvalidNumber(lit) => write!(f, "invalid number `{lit}`"),
            Self::UnrecognizedSymbol(sym) => write!(f, "unrecognized symbol `{sym}`"),
        }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at line {}", self.kind, self.line)
    }
}

impl std::error::Error for CompileError {}

/// Summary report once assembly has failed.
pub fn asm_failed(count: usize) -> Report {
    let plural = if count == 1 { "" } else { "s" };
    miette!(
        severity = Severity::Error,
        code = "asm::failed",
        "Could not assemble due to {count} previous error{plural}",
    )
}

// Runtime errors

/// Fatal condition that stops the interpreter.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Fault {
    /// Memory access outside of 0..512
    OutOfBounds { addr: i64 },
    /// Instruction register holds no valid opcode
    UnrecognizedOpcode { ir: i64 },
    /// Accumulator arithmetic left the register range
    Overflow { ac: i64 },
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfBounds { addr } => write!(f, "Address {addr} does not exist."),
            Self::UnrecognizedOpcode { ir } => write!(f, "Unrecognized opcode in instruction {ir}."),
            Self::Overflow { ac } => write!(f, "Arithmetic overflow with AC = {ac}."),
        }
    }
}

impl std::error::Error for Fault {}
