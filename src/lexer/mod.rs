use crate::lexer::cursor::Cursor;
use crate::span::Span;

pub mod cursor;

/// A 'light' token that only carries basic and easily derivable info
#[derive(Debug)]
pub struct LToken {
    pub kind: LTokenKind,
    pub len: u32,
}

impl LToken {
    pub fn new(kind: LTokenKind, len: u32) -> Self {
        LToken { kind, len }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LTokenKind {
    /// Mnemonic, directive, label or literal; told apart by the parser
    Word,
    /// Separates a label from the instruction
    Comma,
    Comment,
    Whitespace,
    Eof,
}

/// Test if a character is considered to be whitespace.
pub(crate) fn is_whitespace(c: char) -> bool {
    c.is_whitespace()
}

/// Test if a character can continue a word.
pub(crate) fn is_word(c: char) -> bool {
    !is_whitespace(c) && c != ',' && c != '/'
}

impl Cursor<'_> {
    pub fn advance_token(&mut self) -> LToken {
        let first_char = match self.bump() {
            Some(c) => c,
            None => return LToken::new(LTokenKind::Eof, 0),
        };
        let token_kind = match first_char {
            // Comments run to the end of the line
            '/' => {
                self.take_while(|c| c != '\n');
                LTokenKind::Comment
            }
            ',' => LTokenKind::Comma,
            c if is_whitespace(c) => {
                self.take_while(is_whitespace);
                LTokenKind::Whitespace
            }
            _ => {
                self.take_while(is_word);
                LTokenKind::Word
            }
        };
        let res = LToken::new(token_kind, self.pos_in_token());
        self.reset_pos();
        res
    }
}

/// Word of source text and where it came from.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Token<'a> {
    pub text: &'a str,
    pub span: Span,
}

/// One line of source split into its optional label and instruction words.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct SourceLine<'a> {
    /// 1-based
    pub number: usize,
    pub label: Option<Token<'a>>,
    pub body: Vec<Token<'a>>,
}

/// Split source into lexed lines. Every line of input produces one item.
pub fn lex(src: &str) -> impl Iterator<Item = SourceLine<'_>> {
    let mut offset = 0;
    src.split('\n').enumerate().map(move |(i, raw)| {
        let start = offset;
        offset += raw.len() + 1;
        let line = raw.strip_suffix('\r').unwrap_or(raw);
        lex_line(line, start, i + 1)
    })
}

fn lex_line(line: &str, offset: usize, number: usize) -> SourceLine<'_> {
    let mut cursor = Cursor::new(line);
    let mut pos = 0;
    let mut words = Vec::new();
    let mut label_words = None;

    loop {
        let tok = cursor.advance_token();
        let start = pos;
        pos += tok.len as usize;
        match tok.kind {
            LTokenKind::Word => words.push(Token {
                text: &line[start..pos],
                span: Span::from_range(offset + start..offset + pos),
            }),
            // Only the first comma ends a label
            LTokenKind::Comma if label_words.is_none() => {
                label_words = Some(std::mem::take(&mut words));
            }
            LTokenKind::Comma | LTokenKind::Whitespace => {}
            LTokenKind::Comment | LTokenKind::Eof => break,
        }
    }

    SourceLine {
        number,
        label: label_words.and_then(|label| merge(line, offset, &label)),
        body: words,
    }
}

/// Join consecutive words into a single token spanning all of them.
fn merge<'a>(line: &'a str, offset: usize, toks: &[Token<'a>]) -> Option<Token<'a>> {
    let (first, last) = (toks.first()?, toks.last()?);
    let range = first.span.as_range().start..last.span.as_range().end;
    Some(Token {
        text: &line[range.start - offset..range.end - offset],
        span: Span::from_range(range),
    })
}
