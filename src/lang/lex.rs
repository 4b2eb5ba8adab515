use super::symbol::SymbolTable;
use super::token::Token;
use crate::mach::{Program, Word};

/// ## Lexical analysis
///
/// A single cursor over the source. `next` scans one token; identifiers
/// are interned into the symbol table and string literal bytes go straight
/// into the program's data segment as a side effect.

#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    src: &'a [u8],
    pos: usize,
    line: u32,
}

fn is_ident_start(ch: u8) -> bool {
    ch.is_ascii_alphabetic() || ch == b'_'
}

fn is_ident(ch: u8) -> bool {
    ch.is_ascii_alphanumeric() || ch == b'_'
}

impl<'a> Lexer<'a> {
    /// Scanning stops at the end of `src` or at the first NUL byte.
    pub fn new(src: &'a [u8]) -> Lexer<'a> {
        Lexer {
            src,
            pos: 0,
            line: 1,
        }
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    fn peek(&self) -> u8 {
        self.src.get(self.pos).copied().unwrap_or(0)
    }

    fn bump(&mut self) -> u8 {
        let ch = self.peek();
        if ch != 0 {
            self.pos += 1;
        }
        ch
    }

    fn follow(&mut self, ch: u8, yes: Token, no: Token) -> Token {
        if self.peek() == ch {
            self.pos += 1;
            yes
        } else {
            no
        }
    }

    fn skip_line(&mut self) {
        while self.peek() != 0 && self.peek() != b'\n' {
            self.pos += 1;
        }
    }

    pub fn next(&mut self, symbols: &mut SymbolTable, program: &mut Program) -> Token {
        use Token::*;
        loop {
            let ch = self.bump();
            let token = match ch {
                0 => return Eof,
                b'\n' => {
                    self.line += 1;
                    continue;
                }
                b'#' => {
                    self.skip_line();
                    continue;
                }
                ch if is_ident_start(ch) => return self.identifier(symbols),
                b'0'..=b'9' => return Number(self.number(ch)),
                b'\'' | b'"' => return self.literal(ch, program),
                b'/' => {
                    if self.peek() == b'/' {
                        self.skip_line();
                        continue;
                    }
                    Div
                }
                b'=' => self.follow(b'=', Eq, Assign),
                b'+' => self.follow(b'+', Inc, Add),
                b'-' => self.follow(b'-', Dec, Sub),
                b'!' => self.follow(b'=', Ne, Bang),
                b'<' => match self.follow(b'=', Le, Lt) {
                    Lt => self.follow(b'<', Shl, Lt),
                    t => t,
                },
                b'>' => match self.follow(b'=', Ge, Gt) {
                    Gt => self.follow(b'>', Shr, Gt),
                    t => t,
                },
                b'|' => self.follow(b'|', Lor, Or),
                b'&' => self.follow(b'&', Lan, And),
                b'^' => Xor,
                b'%' => Mod,
                b'*' => Mul,
                b'[' => Brak,
                b'?' => Cond,
                b'~' => Tilde,
                b';' => Semicolon,
                b'{' => LBrace,
                b'}' => RBrace,
                b'(' => LParen,
                b')' => RParen,
                b']' => RBracket,
                b',' => Comma,
                b':' => Colon,
                _ => continue,
            };
            return token;
        }
    }

    fn identifier(&mut self, symbols: &mut SymbolTable) -> Token {
        let start = self.pos - 1;
        while is_ident(self.peek()) {
            self.pos += 1;
        }
        let spelling = &self.src[start..self.pos];
        let id = symbols.resolve(SymbolTable::hash(spelling), spelling);
        symbols.get(id).token
    }

    fn number(&mut self, first: u8) -> Word {
        let mut val = (first - b'0') as Word;
        if val != 0 {
            while self.peek().is_ascii_digit() {
                val = val.wrapping_mul(10).wrapping_add((self.bump() - b'0') as Word);
            }
        } else if self.peek() == b'x' || self.peek() == b'X' {
            self.pos += 1;
            while let Some(digit) = (self.peek() as char).to_digit(16) {
                self.pos += 1;
                val = val.wrapping_mul(16).wrapping_add(digit as Word);
            }
        } else {
            while let b'0'..=b'7' = self.peek() {
                val = val.wrapping_mul(8).wrapping_add((self.bump() - b'0') as Word);
            }
        }
        val
    }

    /// `'c'` becomes a number, `"..."` is copied into the data segment.
    /// The caller terminates strings, since adjacent literals concatenate.
    fn literal(&mut self, quote: u8, program: &mut Program) -> Token {
        let addr = program.data_len();
        let mut val = 0;
        while self.peek() != 0 && self.peek() != quote {
            let mut ch = self.bump();
            if ch == b'\n' {
                self.line += 1;
            } else if ch == b'\\' {
                ch = match self.bump() {
                    b'n' => b'\n',
                    other => other,
                };
            }
            val = ch as Word;
            if quote == b'"' {
                program.push_data(ch);
            }
        }
        self.bump();
        if quote == b'"' {
            Token::Str(addr)
        } else {
            Token::Number(val)
        }
    }
}
