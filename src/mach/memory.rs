use super::{Address, Word, WORD};
use crate::error;
use crate::lang::Error;
use std::collections::BTreeMap;
use std::convert::TryFrom;

type Result<T> = std::result::Result<T, Error>;

/// ## Bounds checked machine memory
///
/// Layout, low to high: null guard word, data segment, heap, stack.
/// Every access is checked; touching the guard word or anything past the
/// end is a segmentation fault rather than undefined behavior.

#[derive(Debug, Clone)]
pub struct Memory {
    bytes: Vec<u8>,
    heap_start: Address,
    stack_start: Address,
    free: BTreeMap<Address, usize>,
    used: BTreeMap<Address, usize>,
}

impl Memory {
    pub fn new(data: &[u8], heap_size: usize, stack_size: usize) -> Memory {
        let heap_start = align(data.len().max(WORD));
        let heap_size = align(heap_size);
        let stack_start = heap_start + heap_size;
        let mut bytes = vec![0; stack_start + align(stack_size)];
        bytes[..data.len()].copy_from_slice(data);
        let mut free = BTreeMap::new();
        if heap_size > 0 {
            free.insert(heap_start, heap_size);
        }
        Memory {
            bytes,
            heap_start,
            stack_start,
            free,
            used: BTreeMap::new(),
        }
    }

    /// Lowest address the stack may grow down to.
    pub fn stack_limit(&self) -> Address {
        self.stack_start
    }

    pub fn top(&self) -> Address {
        self.bytes.len()
    }

    fn range(&self, addr: Word, len: usize) -> Result<std::ops::Range<usize>> {
        let start = match usize::try_from(addr) {
            Ok(start) if start >= WORD => start,
            _ => return Err(error!(SegmentationFault; format!("ADDRESS {}", addr))),
        };
        match start.checked_add(len) {
            Some(end) if end <= self.bytes.len() => Ok(start..end),
            _ => Err(error!(SegmentationFault; format!("ADDRESS {}", addr))),
        }
    }

    pub fn load_byte(&self, addr: Word) -> Result<Word> {
        let range = self.range(addr, 1)?;
        Ok(self.bytes[range.start] as Word)
    }

    pub fn store_byte(&mut self, addr: Word, val: Word) -> Result<()> {
        let range = self.range(addr, 1)?;
        self.bytes[range.start] = val as u8;
        Ok(())
    }

    pub fn load_word(&self, addr: Word) -> Result<Word> {
        let range = self.range(addr, WORD)?;
        let mut buf = [0; WORD];
        buf.copy_from_slice(&self.bytes[range]);
        Ok(Word::from_le_bytes(buf))
    }

    pub fn store_word(&mut self, addr: Word, val: Word) -> Result<()> {
        let range = self.range(addr, WORD)?;
        self.bytes[range].copy_from_slice(&val.to_le_bytes());
        Ok(())
    }

    pub fn slice(&self, addr: Word, len: usize) -> Result<&[u8]> {
        let range = self.range(addr, len)?;
        Ok(&self.bytes[range])
    }

    pub fn slice_mut(&mut self, addr: Word, len: usize) -> Result<&mut [u8]> {
        let range = self.range(addr, len)?;
        Ok(&mut self.bytes[range])
    }

    /// Reads a NUL terminated string.
    pub fn c_str(&self, addr: Word) -> Result<&[u8]> {
        let range = self.range(addr, 0)?;
        match self.bytes[range.start..].iter().position(|&b| b == 0) {
            Some(len) => Ok(&self.bytes[range.start..range.start + len]),
            None => Err(error!(SegmentationFault; "UNTERMINATED STRING")),
        }
    }

    /// First fit allocation from the heap. Returns `None` when exhausted.
    pub fn alloc(&mut self, size: usize) -> Option<Address> {
        if size > self.stack_start - self.heap_start {
            return None;
        }
        let size = align(size.max(1));
        let (&addr, &len) = self.free.iter().find(|(_, len)| **len >= size)?;
        self.free.remove(&addr);
        if len > size {
            self.free.insert(addr + size, len - size);
        }
        self.used.insert(addr, size);
        for b in &mut self.bytes[addr..addr + size] {
            *b = 0;
        }
        Some(addr)
    }

    /// Returns a block to the heap, merging it with free neighbours.
    /// Freeing null is a no-op; freeing anything else not from `alloc` is
    /// an error.
    pub fn free(&mut self, addr: Word) -> Result<()> {
        if addr == 0 {
            return Ok(());
        }
        let mut start = usize::try_from(addr).unwrap_or(0);
        let mut len = match self.used.remove(&start) {
            Some(len) => len,
            None => return Err(error!(SegmentationFault; format!("FREE OF {}", addr))),
        };
        if let Some(&next_len) = self.free.get(&(start + len)) {
            self.free.remove(&(start + len));
            len += next_len;
        }
        if let Some((&prev, &prev_len)) = self.free.range(..start).next_back() {
            if prev + prev_len == start {
                self.free.remove(&prev);
                start = prev;
                len += prev_len;
            }
        }
        self.free.insert(start, len);
        Ok(())
    }
}

fn align(n: usize) -> usize {
    (n + WORD - 1) / WORD * WORD
}
