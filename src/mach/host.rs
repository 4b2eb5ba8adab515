use super::{Memory, Word};
use crate::lang::Error;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::Read;

type Result<T> = std::result::Result<T, Error>;

/// ## Host services
///
/// File descriptors handed to the program. 0 is standard input,
/// descriptors from `open` start at 3.

#[derive(Debug)]
pub struct Files {
    next_fd: Word,
    open: HashMap<Word, File>,
}

impl Files {
    pub fn new() -> Files {
        Files {
            next_fd: 3,
            open: HashMap::new(),
        }
    }

    pub fn open(&mut self, path: &[u8], flags: Word) -> Word {
        let path = String::from_utf8_lossy(path).to_string();
        let file = if flags == 0 {
            File::open(path)
        } else {
            OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(path)
        };
        match file {
            Ok(file) => {
                let fd = self.next_fd;
                self.next_fd += 1;
                self.open.insert(fd, file);
                fd
            }
            Err(_) => -1,
        }
    }

    pub fn read(&mut self, fd: Word, buf: &mut [u8]) -> Word {
        let result = if fd == 0 {
            std::io::stdin().read(buf)
        } else {
            match self.open.get_mut(&fd) {
                Some(file) => file.read(buf),
                None => return -1,
            }
        };
        match result {
            Ok(n) => n as Word,
            Err(_) => -1,
        }
    }

    pub fn close(&mut self, fd: Word) -> Word {
        match self.open.remove(&fd) {
            Some(_) => 0,
            None => -1,
        }
    }
}

/// C `printf` over machine words. Supports `%d %i %u %x %X %o %c %s %p %%`
/// with `-`, `0`, a width and an ignored `l` modifier.
pub fn printf(mem: &Memory, format: &[u8], args: &[Word]) -> Result<Vec<u8>> {
    let mut out = vec![];
    let mut args = args.iter();
    let mut i = 0;
    while i < format.len() {
        let ch = format[i];
        i += 1;
        if ch != b'%' {
            out.push(ch);
            continue;
        }
        let mut left = false;
        let mut zero = false;
        while i < format.len() && (format[i] == b'-' || format[i] == b'0') {
            if format[i] == b'-' {
                left = true;
            } else {
                zero = true;
            }
            i += 1;
        }
        let mut width = 0;
        while i < format.len() && format[i].is_ascii_digit() {
            width = width * 10 + (format[i] - b'0') as usize;
            i += 1;
        }
        while i < format.len() && format[i] == b'l' {
            i += 1;
        }
        let conv = match format.get(i) {
            Some(c) => *c,
            None => {
                out.push(b'%');
                break;
            }
        };
        i += 1;
        let mut arg = || args.next().copied().unwrap_or(0);
        let (body, numeric): (Vec<u8>, bool) = match conv {
            b'%' => {
                out.push(b'%');
                continue;
            }
            b'd' | b'i' => (arg().to_string().into_bytes(), true),
            b'u' => ((arg() as u64).to_string().into_bytes(), true),
            b'x' => (format!("{:x}", arg()).into_bytes(), true),
            b'X' => (format!("{:X}", arg()).into_bytes(), true),
            b'o' => (format!("{:o}", arg()).into_bytes(), true),
            b'p' => (format!("0x{:x}", arg()).into_bytes(), false),
            b'c' => (vec![arg() as u8], false),
            b's' => (mem.c_str(arg())?.to_vec(), false),
            other => {
                out.push(b'%');
                out.push(other);
                continue;
            }
        };
        pad(&mut out, &body, width, left, zero && numeric && !left);
    }
    Ok(out)
}

fn pad(out: &mut Vec<u8>, body: &[u8], width: usize, left: bool, zero: bool) {
    let fill = width.saturating_sub(body.len());
    if left {
        out.extend_from_slice(body);
        out.extend(std::iter::repeat(b' ').take(fill));
    } else if zero {
        let (sign, digits) = match body.first() {
            Some(&b'-') => (&body[..1], &body[1..]),
            _ => (&body[..0], body),
        };
        out.extend_from_slice(sign);
        out.extend(std::iter::repeat(b'0').take(fill));
        out.extend_from_slice(digits);
    } else {
        out.extend(std::iter::repeat(b' ').take(fill));
        out.extend_from_slice(body);
    }
}
