use super::token::Token;
use crate::mach::{Opcode, Word, WORD};

pub type SymbolId = usize;

/// Load/store width of a value in memory.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Width {
    Byte,
    Word,
}

impl Width {
    pub fn size(self) -> Word {
        match self {
            Width::Byte => 1,
            Width::Word => WORD as Word,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Scalar {
    Char,
    Int,
}

/// A scalar plus the number of pointer levels on top of it.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Type {
    pub scalar: Scalar,
    pub indirection: u8,
}

impl Type {
    pub const CHAR: Type = Type {
        scalar: Scalar::Char,
        indirection: 0,
    };
    pub const INT: Type = Type {
        scalar: Scalar::Int,
        indirection: 0,
    };

    pub fn pointer_to(self) -> Type {
        Type {
            indirection: self.indirection.saturating_add(1),
            ..self
        }
    }

    pub fn deref(self) -> Option<Type> {
        if self.indirection == 0 {
            None
        } else {
            Some(Type {
                indirection: self.indirection - 1,
                ..self
            })
        }
    }

    pub fn is_pointer(self) -> bool {
        self.indirection > 0
    }

    pub fn width(self) -> Width {
        if self.indirection == 0 && self.scalar == Scalar::Char {
            Width::Byte
        } else {
            Width::Word
        }
    }

    /// Scale factor for pointer arithmetic. Only pointers to word-sized
    /// values scale; `char *` and plain integers step by one.
    pub fn stride(self) -> Word {
        match self.deref() {
            Some(pointee) => pointee.width().size(),
            None => 1,
        }
    }
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self.scalar {
            Scalar::Char => write!(f, "char")?,
            Scalar::Int => write!(f, "int")?,
        }
        for _ in 0..self.indirection {
            write!(f, "*")?;
        }
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Class {
    Unbound,
    Global,
    Local,
    Function,
    Host,
    Enum,
}

/// What an identifier currently means.
///
/// `value` depends on `class`: data address for globals, frame slot for
/// locals, code address for functions, opcode for host services and the
/// constant itself for enum members.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Binding {
    pub class: Class,
    pub ty: Type,
    pub value: Word,
}

impl Binding {
    pub const UNBOUND: Binding = Binding {
        class: Class::Unbound,
        ty: Type::INT,
        value: 0,
    };
}

#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: Box<str>,
    pub hash: u64,
    pub token: Token,
    pub binding: Binding,
    pub backup: Binding,
}

/// ## Identifier table
///
/// Symbols are never removed and keep insertion order, which
/// `unwind_locals` depends on.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
}

const KEYWORDS: &[(&str, Token)] = &[
    ("char", Token::Char),
    ("else", Token::Else),
    ("enum", Token::Enum),
    ("if", Token::If),
    ("int", Token::Int),
    ("return", Token::Return),
    ("while", Token::While),
];

impl Default for SymbolTable {
    fn default() -> SymbolTable {
        SymbolTable::new()
    }
}

impl SymbolTable {
    /// A table seeded with keywords, host services, `void` and `main`.
    pub fn new() -> SymbolTable {
        let mut this = SymbolTable { symbols: vec![] };
        for (name, token) in KEYWORDS {
            let id = this.intern(name);
            this.symbols[id].token = *token;
        }
        for opcode in Opcode::HOST_SERVICES {
            let id = this.intern(opcode.host_name().unwrap_or_default());
            this.symbols[id].binding = Binding {
                class: Class::Host,
                ty: Type::INT,
                value: *opcode as Word,
            };
        }
        let id = this.intern("void");
        this.symbols[id].token = Token::Char;
        this.intern("main");
        this
    }

    pub fn hash(spelling: &[u8]) -> u64 {
        let hash = spelling
            .iter()
            .fold(0u64, |h, &b| h.wrapping_mul(147).wrapping_add(b as u64));
        (hash << 6).wrapping_add(spelling.len() as u64)
    }

    fn intern(&mut self, spelling: &str) -> SymbolId {
        self.resolve(SymbolTable::hash(spelling.as_bytes()), spelling.as_bytes())
    }

    /// Finds the symbol for `spelling`, appending an unbound one if needed.
    pub fn resolve(&mut self, hash: u64, spelling: &[u8]) -> SymbolId {
        if let Some(id) = self
            .symbols
            .iter()
            .position(|sym| sym.hash == hash && sym.name.as_bytes() == spelling)
        {
            return id;
        }
        let id = self.symbols.len();
        self.symbols.push(Symbol {
            name: String::from_utf8_lossy(spelling).into(),
            hash,
            token: Token::Ident(id),
            binding: Binding::UNBOUND,
            backup: Binding::UNBOUND,
        });
        id
    }

    pub fn lookup(&self, name: &str) -> Option<SymbolId> {
        let hash = SymbolTable::hash(name.as_bytes());
        self.symbols
            .iter()
            .position(|sym| sym.hash == hash && &*sym.name == name)
    }

    pub fn get(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id]
    }

    pub fn binding(&self, id: SymbolId) -> Binding {
        self.symbols[id].binding
    }

    pub fn name(&self, id: SymbolId) -> &str {
        &self.symbols[id].name
    }

    /// Binds a global meaning; globals have nothing to restore.
    pub fn bind(&mut self, id: SymbolId, class: Class, ty: Type, value: Word) {
        self.symbols[id].binding = Binding { class, ty, value };
    }

    /// Shadows the current meaning with a parameter or local.
    pub fn bind_local(&mut self, id: SymbolId, class: Class, ty: Type, value: Word) {
        let sym = &mut self.symbols[id];
        sym.backup = sym.binding;
        sym.binding = Binding { class, ty, value };
    }

    /// Restores every shadowed symbol at the end of a function body.
    pub fn unwind_locals(&mut self) {
        for sym in self.symbols.iter_mut() {
            if sym.binding.class == Class::Local {
                sym.binding = sym.backup;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Symbol> {
        self.symbols.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords_are_seeded() {
        let table = SymbolTable::new();
        let id = table.lookup("while").unwrap();
        assert_eq!(table.get(id).token, Token::While);
        let id = table.lookup("void").unwrap();
        assert_eq!(table.get(id).token, Token::Char);
        let id = table.lookup("printf").unwrap();
        assert_eq!(table.binding(id).class, Class::Host);
        assert_eq!(table.binding(id).value, Opcode::Prtf as Word);
        assert!(table.lookup("main").is_some());
    }

    #[test]
    fn test_resolve_is_stable() {
        let mut table = SymbolTable::new();
        let len = table.len();
        let a = table.resolve(SymbolTable::hash(b"foo"), b"foo");
        let b = table.resolve(SymbolTable::hash(b"foo"), b"foo");
        assert_eq!(a, b);
        assert_eq!(table.len(), len + 1);
        assert_eq!(table.get(a).token, Token::Ident(a));
        assert_eq!(table.binding(a).class, Class::Unbound);
    }

    #[test]
    fn test_shadow_and_unwind() {
        let mut table = SymbolTable::new();
        let x = table.resolve(SymbolTable::hash(b"x"), b"x");
        let y = table.resolve(SymbolTable::hash(b"y"), b"y");
        table.bind(x, Class::Global, Type::CHAR, 8);
        let before: Vec<Binding> = table.iter().map(|s| s.binding).collect();
        table.bind_local(x, Class::Local, Type::INT.pointer_to(), 1);
        table.bind_local(y, Class::Local, Type::INT, 2);
        assert_eq!(table.binding(x).class, Class::Local);
        table.unwind_locals();
        let after: Vec<Binding> = table.iter().map(|s| s.binding).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_type_stride() {
        assert_eq!(Type::CHAR.pointer_to().stride(), 1);
        assert_eq!(Type::INT.pointer_to().stride(), WORD as Word);
        assert_eq!(Type::CHAR.pointer_to().pointer_to().stride(), WORD as Word);
        assert_eq!(Type::INT.stride(), 1);
        assert_eq!(Type::CHAR.width(), Width::Byte);
        assert_eq!(Type::CHAR.pointer_to().width(), Width::Word);
        assert_eq!(Type::INT.pointer_to().pointer_to().to_string(), "int**");
    }
}
