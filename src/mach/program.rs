use super::{Address, Opcode, Word, WORD};
use crate::error;
use crate::lang::Error;
use std::collections::BTreeMap;

type Result<T> = std::result::Result<T, Error>;

/// ## Compiled program
///
/// Code is a flat vector of words: each opcode is followed by its operand
/// when it has one. Branch targets are code word indices.
///
/// Data is the initial image of memory from address 0: a zeroed null
/// guard word, then globals and string literals in declaration order.

#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    code: Vec<Word>,
    data: Vec<u8>,
    entry: Option<Address>,
    labels: BTreeMap<Address, String>,
}

impl Default for Program {
    fn default() -> Program {
        Program::new()
    }
}

impl Program {
    pub fn new() -> Program {
        Program {
            code: vec![],
            data: vec![0; WORD],
            entry: None,
            labels: BTreeMap::new(),
        }
    }

    pub fn code(&self) -> &[Word] {
        &self.code
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn entry(&self) -> Option<Address> {
        self.entry
    }

    pub fn set_entry(&mut self, addr: Address) {
        self.entry = Some(addr);
    }

    /// Names a code address for listings.
    pub fn label(&mut self, addr: Address, name: &str) {
        self.labels.insert(addr, name.to_string());
    }

    pub fn labels(&self) -> &BTreeMap<Address, String> {
        &self.labels
    }

    /// Address of the next emitted word.
    pub fn here(&self) -> Address {
        self.code.len()
    }

    pub fn emit(&mut self, op: Opcode) {
        debug_assert!(!op.has_operand());
        self.code.push(op as Word);
    }

    pub fn emit_with(&mut self, op: Opcode, operand: Word) {
        debug_assert!(op.has_operand());
        self.code.push(op as Word);
        self.code.push(operand);
    }

    /// Emits a branch whose target is not known yet and returns the
    /// address of the placeholder operand for `patch`.
    pub fn emit_forward(&mut self, op: Opcode) -> Address {
        debug_assert!(op.is_branch());
        self.code.push(op as Word);
        self.code.push(Word::min_value());
        self.code.len() - 1
    }

    /// Points a placeholder from `emit_forward` at `target`.
    pub fn patch(&mut self, slot: Address, target: Address) -> Result<()> {
        match self.code.get_mut(slot) {
            Some(word) if *word == Word::min_value() => {
                *word = target as Word;
                Ok(())
            }
            _ => Err(error!(InternalError; "BRANCH PATCHED TWICE")),
        }
    }

    /// True if any placeholder from `emit_forward` is still unpatched.
    pub fn has_unpatched(&self) -> bool {
        self.instructions()
            .any(|(_, op, operand)| op.map_or(false, Opcode::is_branch) && operand == Some(Word::min_value()))
    }

    /// Reserves one zeroed word of storage for a global.
    pub fn alloc_global(&mut self) -> Address {
        let addr = self.data.len();
        self.data.extend_from_slice(&[0; WORD]);
        addr
    }

    pub fn push_data(&mut self, byte: u8) {
        self.data.push(byte)
    }

    /// Terminates a string literal and realigns the data segment.
    pub fn end_string(&mut self) {
        self.data.push(0);
        while self.data.len() % WORD != 0 {
            self.data.push(0);
        }
    }

    pub fn data_len(&self) -> Address {
        self.data.len()
    }

    /// Iterates `(address, opcode, operand)` triples. Words that are not
    /// valid opcodes come back as `None`.
    pub fn instructions(&self) -> Instructions<'_> {
        Instructions {
            code: &self.code,
            pc: 0,
        }
    }

    #[cfg(test)]
    pub fn from_code(code: Vec<Word>) -> Program {
        Program {
            code,
            data: vec![0; WORD],
            entry: Some(0),
            labels: BTreeMap::new(),
        }
    }
}

pub struct Instructions<'a> {
    code: &'a [Word],
    pc: Address,
}

impl<'a> Iterator for Instructions<'a> {
    type Item = (Address, Option<Opcode>, Option<Word>);

    fn next(&mut self) -> Option<Self::Item> {
        use std::convert::TryFrom;
        let addr = self.pc;
        let word = *self.code.get(addr)?;
        self.pc += 1;
        match Opcode::try_from(word) {
            Ok(op) if op.has_operand() => {
                let operand = self.code.get(self.pc).copied();
                self.pc += 1;
                Some((addr, Some(op), operand))
            }
            Ok(op) => Some((addr, Some(op), None)),
            Err(_) => Some((addr, None, Some(word))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backpatch() {
        let mut p = Program::new();
        let slot = p.emit_forward(Opcode::Jz);
        assert!(p.has_unpatched());
        p.emit_with(Opcode::Imm, 1);
        let here = p.here();
        p.patch(slot, here).unwrap();
        assert!(!p.has_unpatched());
        assert_eq!(p.code(), &[Opcode::Jz as Word, 4, Opcode::Imm as Word, 1]);
        assert!(p.patch(slot, here).is_err());
    }

    #[test]
    fn test_data_alignment() {
        let mut p = Program::new();
        let g = p.alloc_global();
        assert_eq!(g, WORD);
        for b in b"hi" {
            p.push_data(*b);
        }
        p.end_string();
        assert_eq!(p.data_len() % WORD, 0);
        assert_eq!(&p.data()[WORD * 2..WORD * 2 + 3], b"hi\0");
        for b in b"12345678" {
            p.push_data(*b);
        }
        p.end_string();
        assert_eq!(p.data_len(), WORD * 5);
    }
}
