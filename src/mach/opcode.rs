use super::Word;
use std::convert::TryFrom;
use std::ops::RangeInclusive;

/// ## Virtual machine instruction set
///
/// The machine has an accumulator `ax` beside the stack. Binary operations
/// pop their left operand off the stack and take the right operand from `ax`,
/// leaving the result in `ax`.
///
/// For example: `a = 3 * b` with `a`,`b` globals compiles to
/// `[IMM &a, PUSH, IMM 3, PUSH, IMM &b, LI, MUL, SI]`
///
/// Opcodes with an immediate operand take it from the following code word.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i64)]
pub enum Opcode {
    // *** Data movement
    /// Address of frame slot `bp + n * WORD`.
    Lea,
    /// Load immediate.
    Imm,

    // *** Branch control
    Jmp,
    /// Push return address then jump.
    Call,
    Jz,
    Jnz,

    // *** Frames
    /// Save `bp`, make a new frame and reserve `n` slots.
    Ent,
    /// Discard `n` stack slots.
    Adj,
    /// Restore the caller's frame and return.
    Lev,

    // *** Memory
    Li,
    Lc,
    Si,
    Sc,
    Push,

    // *** Expression operations
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

    // *** Host services
    Open,
    Read,
    Clos,
    Prtf,
    Malc,
    Free,
    Mset,
    Mcmp,
    Exit,
}

const OPCODES: [Opcode; 39] = {
    use Opcode::*;
    [
        Lea, Imm, Jmp, Call, Jz, Jnz, Ent, Adj, Lev, Li, Lc, Si, Sc, Push, Or, Xor, And, Eq, Ne,
        Lt, Gt, Le, Ge, Shl, Shr, Add, Sub, Mul, Div, Mod, Open, Read, Clos, Prtf, Malc, Free,
        Mset, Mcmp, Exit,
    ]
};

impl Opcode {
    pub const HOST_SERVICES: &'static [Opcode] = &[
        Opcode::Open,
        Opcode::Read,
        Opcode::Clos,
        Opcode::Prtf,
        Opcode::Malc,
        Opcode::Free,
        Opcode::Mset,
        Opcode::Mcmp,
        Opcode::Exit,
    ];

    /// True when the next code word is this opcode's operand.
    pub fn has_operand(self) -> bool {
        use Opcode::*;
        matches!(self, Lea | Imm | Jmp | Call | Jz | Jnz | Ent | Adj)
    }

    /// True when the operand is a code address.
    pub fn is_branch(self) -> bool {
        use Opcode::*;
        matches!(self, Jmp | Call | Jz | Jnz)
    }

    /// The C name a program uses to call a host service.
    pub fn host_name(self) -> Option<&'static str> {
        use Opcode::*;
        match self {
            Open => Some("open"),
            Read => Some("read"),
            Clos => Some("close"),
            Prtf => Some("printf"),
            Malc => Some("malloc"),
            Free => Some("free"),
            Mset => Some("memset"),
            Mcmp => Some("memcmp"),
            Exit => Some("exit"),
            _ => None,
        }
    }

    /// Number of stack arguments a host service accepts.
    pub fn arity(self) -> Option<RangeInclusive<usize>> {
        use Opcode::*;
        match self {
            Open => Some(2..=2),
            Read => Some(3..=3),
            Clos => Some(1..=1),
            Prtf => Some(1..=usize::max_value()),
            Malc => Some(1..=1),
            Free => Some(1..=1),
            Mset => Some(3..=3),
            Mcmp => Some(3..=3),
            Exit => Some(1..=1),
            _ => None,
        }
    }
}

impl TryFrom<Word> for Opcode {
    type Error = Word;
    fn try_from(word: Word) -> Result<Self, Self::Error> {
        usize::try_from(word)
            .ok()
            .and_then(|index| OPCODES.get(index))
            .copied()
            .ok_or(word)
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use Opcode::*;
        let s = match self {
            Lea => "LEA",
            Imm => "IMM",
            Jmp => "JMP",
            Call => "CALL",
            Jz => "JZ",
            Jnz => "JNZ",
            Ent => "ENT",
            Adj => "ADJ",
            Lev => "LEV",
            Li => "LI",
            Lc => "LC",
            Si => "SI",
            Sc => "SC",
            Push => "PUSH",
            Or => "OR",
            Xor => "XOR",
            And => "AND",
            Eq => "EQ",
            Ne => "NE",
            Lt => "LT",
            Gt => "GT",
            Le => "LE",
            Ge => "GE",
            Shl => "SHL",
            Shr => "SHR",
            Add => "ADD",
            Sub => "SUB",
            Mul => "MUL",
            Div => "DIV",
            Mod => "MOD",
            Open => "OPEN",
            Read => "READ",
            Clos => "CLOS",
            Prtf => "PRTF",
            Malc => "MALC",
            Free => "FREE",
            Mset => "MSET",
            Mcmp => "MCMP",
            Exit => "EXIT",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_round_trip() {
        for op in OPCODES.iter() {
            assert_eq!(Opcode::try_from(*op as Word), Ok(*op));
        }
        assert_eq!(Opcode::try_from(39), Err(39));
        assert_eq!(Opcode::try_from(-1), Err(-1));
    }

    #[test]
    fn test_host_table() {
        for op in Opcode::HOST_SERVICES {
            assert!(op.host_name().is_some());
            assert!(op.arity().is_some());
        }
        assert_eq!(Opcode::Add.host_name(), None);
        assert!(Opcode::Prtf.arity().unwrap().contains(&7));
        assert!(!Opcode::Prtf.arity().unwrap().contains(&0));
    }
}
