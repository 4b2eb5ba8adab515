use super::symbol::SymbolId;
use crate::mach::{Address, Word};

/// Operators are listed last and in precedence order.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Token {
    Eof,
    Number(Word),
    Str(Address),
    Ident(SymbolId),

    // *** Keywords
    Char,
    Else,
    Enum,
    If,
    Int,
    Return,
    While,

    // *** Punctuation
    Bang,
    Tilde,
    Semicolon,
    LBrace,
    RBrace,
    LParen,
    RParen,
    RBracket,
    Comma,
    Colon,

    // *** Operators
    Assign,
    Cond,
    Lor,
    Lan,
    Or,
    Xor,
    And,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    Shl,
    Shr,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Inc,
    Dec,
    Brak,
}

/// Binding strength of an operator when it appears after an operand.
/// Higher binds tighter.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
pub enum Precedence {
    Assign = 1,
    Cond,
    Lor,
    Lan,
    Or,
    Xor,
    And,
    Equality,
    Relational,
    Shift,
    Additive,
    Multiplicative,
    Unary,
    Postfix,
}

impl Precedence {
    /// The next level up, used for the right operand of a left
    /// associative operator.
    pub fn tighter(self) -> Precedence {
        use Precedence::*;
        match self {
            Assign => Cond,
            Cond => Lor,
            Lor => Lan,
            Lan => Or,
            Or => Xor,
            Xor => And,
            And => Equality,
            Equality => Relational,
            Relational => Shift,
            Shift => Additive,
            Additive => Multiplicative,
            Multiplicative => Unary,
            Unary | Postfix => Postfix,
        }
    }
}

impl Token {
    pub fn precedence(&self) -> Option<Precedence> {
        use Token::*;
        match self {
            Assign => Some(Precedence::Assign),
            Cond => Some(Precedence::Cond),
            Lor => Some(Precedence::Lor),
            Lan => Some(Precedence::Lan),
            Or => Some(Precedence::Or),
            Xor => Some(Precedence::Xor),
            And => Some(Precedence::And),
            Eq | Ne => Some(Precedence::Equality),
            Lt | Gt | Le | Ge => Some(Precedence::Relational),
            Shl | Shr => Some(Precedence::Shift),
            Add | Sub => Some(Precedence::Additive),
            Mul | Div | Mod => Some(Precedence::Multiplicative),
            Inc | Dec | Brak => Some(Precedence::Postfix),
            _ => None,
        }
    }

    pub fn is_type(&self) -> bool {
        matches!(self, Token::Int | Token::Char)
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use Token::*;
        match self {
            Eof => write!(f, "end of file"),
            Number(n) => write!(f, "{}", n),
            Str(a) => write!(f, "string at {}", a),
            Ident(id) => write!(f, "identifier #{}", id),
            Char => write!(f, "char"),
            Else => write!(f, "else"),
            Enum => write!(f, "enum"),
            If => write!(f, "if"),
            Int => write!(f, "int"),
            Return => write!(f, "return"),
            While => write!(f, "while"),
            Bang => write!(f, "!"),
            Tilde => write!(f, "~"),
            Semicolon => write!(f, ";"),
            LBrace => write!(f, "{{"),
            RBrace => write!(f, "}}"),
            LParen => write!(f, "("),
            RParen => write!(f, ")"),
            RBracket => write!(f, "]"),
            Comma => write!(f, ","),
            Colon => write!(f, ":"),
            Assign => write!(f, "="),
            Cond => write!(f, "?"),
            Lor => write!(f, "||"),
            Lan => write!(f, "&&"),
            Or => write!(f, "|"),
            Xor => write!(f, "^"),
            And => write!(f, "&"),
            Eq => write!(f, "=="),
            Ne => write!(f, "!="),
            Lt => write!(f, "<"),
            Gt => write!(f, ">"),
            Le => write!(f, "<="),
            Ge => write!(f, ">="),
            Shl => write!(f, "<<"),
            Shr => write!(f, ">>"),
            Add => write!(f, "+"),
            Sub => write!(f, "-"),
            Mul => write!(f, "*"),
            Div => write!(f, "/"),
            Mod => write!(f, "%"),
            Inc => write!(f, "++"),
            Dec => write!(f, "--"),
            Brak => write!(f, "["),
        }
    }
}
