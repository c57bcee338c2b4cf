// Parsing
mod lexer;
mod parser;
pub use parser::AsmParser;
mod air;
pub use air::{Air, AirKind, AirStmt, Operand, RawWord};
pub mod encoding;
mod image;
pub use image::Image;
mod span;
pub use span::Span;
mod symbol;
pub use symbol::{Opcode, SymbolTable};

// Running
mod memory;
pub use memory::{Memory, MEMORY_MAX};
mod runtime;
pub use runtime::{Registers, RunState, Step, Termination};
mod output;
pub use output::{Console, Terminal};

mod error;
pub use error::{asm_failed, CompileError, CompileErrorKind, Fault};

/// Amount of lines to show as context, each side of focus line (line containing span).
pub const DIAGNOSTIC_CONTEXT_LINES: usize = 2;

/// Assemble source into a program image, running both passes. Every diagnostic from either
/// pass is returned, in the order found.
pub fn assemble(src: &str) -> Result<Image, Vec<CompileError>> {
    assemble_with_symbols(src).map(|(image, _)| image)
}

/// Same as [`assemble`], also returning the labels the program defines.
pub fn assemble_with_symbols(src: &str) -> Result<(Image, SymbolTable), Vec<CompileError>> {
    let (mut air, mut errors) = AsmParser::new(src).parse();
    errors.extend(air.backpatch());
    if !errors.is_empty() {
        return Err(errors);
    }
    let words = (&air)
        .into_iter()
        .map(AirStmt::emit)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| vec![err])?;
    Ok((Image::new(words), air.into_symbols()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_and_backward_references() {
        let src = "
        start, load later
               jump start
        later, dec 5
        ";
        let image = assemble(src).unwrap();
        assert_eq!(image.words(), [0x1003, 0x9001, 5]);
    }

    #[test]
    fn label_defined_once_only() {
        let src = "x, dec 1\nx, dec 2\nload x";
        let errors = assemble(src).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, CompileErrorKind::Redefinition("x".into()));
    }

    #[test]
    fn missing_number_gives_one_diagnostic() {
        let errors = assemble("load x\nhalt\nx, dec\n").unwrap_err();
        // `x` is still defined, so `load x` resolves
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].line, 3);
        assert_eq!(
            errors[0].kind,
            CompileErrorKind::MissingNumber("dec".into())
        );
    }

    #[test]
    fn errors_from_both_passes() {
        let src = "load nowhere\nfoo bar\nhalt";
        let errors = assemble(src).unwrap_err();
        let lines: Vec<_> = errors.iter().map(|err| err.line).collect();
        // Pass one errors come first
        assert_eq!(lines, [2, 1]);
    }

    #[test]
    fn skipcond_prefers_labels() {
        let src = "skipcond 400\nskipcond c\nhalt\nc, hex 800";
        let image = assemble(src).unwrap();
        assert_eq!(image.words(), [0x8400, 0x8004, 0x7000, 0x0800]);
    }

    #[test]
    fn symbols_in_definition_order() {
        let src = "jump start\nzeta, dec 1\nstart, load zeta\nAlpha, halt";
        let (_, symbols) = assemble_with_symbols(src).unwrap();
        let labels: Vec<_> = symbols.iter().collect();
        assert_eq!(labels, [("zeta", 2), ("start", 3), ("alpha", 4)]);
    }

    #[test]
    fn operand_too_wide_for_address_field() {
        let errors = assemble("load 5000\nhalt").unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].line, 1);
        assert_eq!(
            errors[0].kind,
            CompileErrorKind::InvalidNumber("5000".into())
        );
    }

    #[test]
    fn case_insensitive_source() {
        let image = assemble("LOOP, Load LOOP\n  JUMP loop").unwrap();
        assert_eq!(image.words(), [0x1001, 0x9001]);
    }
}
