use super::host::{self, Files};
use super::{Address, Config, Memory, Opcode, Program, Word, WORD};
use crate::error;
use crate::lang::Error;
use std::convert::TryFrom;
use std::io::Write;

type Result<T> = std::result::Result<T, Error>;

/// ## Virtual machine
///
/// Runs a compiled `Program` in slices of instructions. Each call to
/// `execute` returns an `Event` describing why it stopped.

pub struct Runtime {
    code: Vec<Word>,
    mem: Memory,
    files: Files,
    pc: Address,
    sp: Word,
    bp: Word,
    ax: Word,
    cycle: usize,
    state: State,
    interrupted: bool,
    trace: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// The cycle budget ran out; call `execute` again.
    Running,
    Print(String),
    Exit(Word),
    Error(Error),
}

#[derive(Debug, Clone, PartialEq)]
enum State {
    Running,
    Exited(Word),
    Failed(Error),
}

impl Runtime {
    /// Loads `program` and prepares a call to its entry point with `args`
    /// as `argc`/`argv`. Returning from the entry point exits with its
    /// return value.
    pub fn new(program: &Program, config: &Config, args: &[&str]) -> Result<Runtime> {
        let entry = match program.entry() {
            Some(entry) => entry,
            None => return Err(error!(MainNotDefined)),
        };
        let mut code = program.code().to_vec();
        let trampoline = code.len();
        code.push(Opcode::Push as Word);
        code.push(Opcode::Exit as Word);
        let mem = Memory::new(program.data(), config.pool_size, config.pool_size);
        let top = mem.top() as Word;
        let mut runtime = Runtime {
            code,
            mem,
            files: Files::new(),
            pc: entry,
            sp: top,
            bp: top,
            ax: 0,
            cycle: 0,
            state: State::Running,
            interrupted: false,
            trace: config.trace,
        };
        let argv = runtime.load_args(args)?;
        runtime.push(args.len() as Word)?;
        runtime.push(argv)?;
        runtime.push(trampoline as Word)?;
        Ok(runtime)
    }

    fn load_args(&mut self, args: &[&str]) -> Result<Word> {
        let oom = || error!(OutOfMemory; "PROGRAM ARGUMENTS");
        let argv = self.mem.alloc((args.len() + 1) * WORD).ok_or_else(oom)? as Word;
        for (i, arg) in args.iter().enumerate() {
            let addr = self.mem.alloc(arg.len() + 1).ok_or_else(oom)? as Word;
            self.mem
                .slice_mut(addr, arg.len())?
                .copy_from_slice(arg.as_bytes());
            self.mem.store_word(argv + (i * WORD) as Word, addr)?;
        }
        Ok(argv)
    }

    pub fn interrupt(&mut self) {
        self.interrupted = true;
    }

    /// The accumulator, mostly of interest to tests.
    pub fn ax(&self) -> Word {
        self.ax
    }

    /// Runs to completion, writing printed output to `out`.
    pub fn run<W: Write>(&mut self, out: &mut W, cycles: usize) -> Result<Word> {
        loop {
            match self.execute(cycles) {
                Event::Running => {}
                Event::Print(s) => out.write_all(s.as_bytes())?,
                Event::Exit(code) => {
                    out.flush()?;
                    return Ok(code);
                }
                Event::Error(error) => {
                    out.flush()?;
                    return Err(error);
                }
            }
        }
    }

    /// Executes at most `cycles` instructions.
    pub fn execute(&mut self, cycles: usize) -> Event {
        match &self.state {
            State::Exited(code) => return Event::Exit(*code),
            State::Failed(error) => return Event::Error(error.clone()),
            State::Running => {}
        }
        if self.interrupted {
            self.interrupted = false;
            return self.fail(error!(Break; format!("AT {}", self.pc)));
        }
        for _ in 0..cycles {
            match self.step() {
                Ok(None) => {}
                Ok(Some(Event::Exit(code))) => {
                    self.state = State::Exited(code);
                    return Event::Exit(code);
                }
                Ok(Some(event)) => return event,
                Err(error) => return self.fail(error),
            }
        }
        Event::Running
    }

    fn fail(&mut self, error: Error) -> Event {
        self.state = State::Failed(error.clone());
        Event::Error(error)
    }

    fn fetch(&mut self) -> Result<Word> {
        match self.code.get(self.pc) {
            Some(word) => {
                self.pc += 1;
                Ok(*word)
            }
            None => Err(error!(SegmentationFault; format!("PC {}", self.pc))),
        }
    }

    fn push(&mut self, val: Word) -> Result<()> {
        let sp = self.sp - WORD as Word;
        if sp < self.mem.stack_limit() as Word {
            return Err(error!(StackOverflow));
        }
        self.mem.store_word(sp, val)?;
        self.sp = sp;
        Ok(())
    }

    fn pop(&mut self) -> Result<Word> {
        let val = self.mem.load_word(self.sp)?;
        self.sp += WORD as Word;
        Ok(val)
    }

    /// Host service argument `index` of `count`, counting from the left.
    fn arg(&self, index: usize, count: usize) -> Result<Word> {
        self.mem
            .load_word(self.sp + ((count - 1 - index) * WORD) as Word)
    }

    fn jump(&mut self, target: Word) -> Result<()> {
        match usize::try_from(target) {
            Ok(pc) if pc < self.code.len() => {
                self.pc = pc;
                Ok(())
            }
            _ => Err(error!(SegmentationFault; format!("JUMP TO {}", target))),
        }
    }

    fn step(&mut self) -> Result<Option<Event>> {
        let word = self.fetch()?;
        let op = match Opcode::try_from(word) {
            Ok(op) => op,
            Err(word) => return Err(error!(UnknownOpcode; format!("{} AT {}", word, self.pc - 1))),
        };
        let operand = if op.has_operand() { self.fetch()? } else { 0 };
        self.cycle += 1;
        if self.trace {
            if op.has_operand() {
                eprintln!("{}> {:<5}{}", self.cycle, op.to_string(), operand);
            } else {
                eprintln!("{}> {}", self.cycle, op);
            }
        }
        use Opcode::*;
        match op {
            Lea => self.ax = self.bp + operand * WORD as Word,
            Imm => self.ax = operand,
            Jmp => self.jump(operand)?,
            Call => {
                self.push(self.pc as Word)?;
                self.jump(operand)?;
            }
            Jz => {
                if self.ax == 0 {
                    self.jump(operand)?;
                }
            }
            Jnz => {
                if self.ax != 0 {
                    self.jump(operand)?;
                }
            }
            Ent => {
                self.push(self.bp)?;
                self.bp = self.sp;
                let sp = self.sp - operand * WORD as Word;
                if sp < self.mem.stack_limit() as Word {
                    return Err(error!(StackOverflow));
                }
                self.sp = sp;
            }
            Adj => self.sp += operand * WORD as Word,
            Lev => {
                self.sp = self.bp;
                self.bp = self.pop()?;
                let pc = self.pop()?;
                self.jump(pc)?;
            }
            Li => self.ax = self.mem.load_word(self.ax)?,
            Lc => self.ax = self.mem.load_byte(self.ax)?,
            Si => {
                let addr = self.pop()?;
                self.mem.store_word(addr, self.ax)?;
            }
            Sc => {
                let addr = self.pop()?;
                self.mem.store_byte(addr, self.ax)?;
                self.ax = self.ax as u8 as Word;
            }
            Push => self.push(self.ax)?,
            Or | Xor | And | Eq | Ne | Lt | Gt | Le | Ge | Shl | Shr | Add | Sub | Mul | Div
            | Mod => {
                let lhs = self.pop()?;
                self.ax = binary(op, lhs, self.ax)?;
            }
            Open => {
                let path = self.mem.c_str(self.arg(0, 2)?)?.to_vec();
                let flags = self.arg(1, 2)?;
                self.ax = self.files.open(&path, flags);
            }
            Read => {
                let fd = self.arg(0, 3)?;
                let len = usize::try_from(self.arg(2, 3)?).unwrap_or(0);
                let buf = self.arg(1, 3)?;
                let files = &mut self.files;
                self.ax = files.read(fd, self.mem.slice_mut(buf, len)?);
            }
            Clos => {
                let fd = self.arg(0, 1)?;
                self.ax = self.files.close(fd);
            }
            Prtf => {
                let count = match (self.code.get(self.pc), self.code.get(self.pc + 1)) {
                    (Some(&adj), Some(&n)) if adj == Adj as Word && n > 0 => n as usize,
                    _ => return Err(error!(InternalError; "PRTF WITHOUT ADJ")),
                };
                let args = (1..count)
                    .map(|i| self.arg(i, count))
                    .collect::<Result<Vec<Word>>>()?;
                let format = self.mem.c_str(self.arg(0, count)?)?;
                let out = host::printf(&self.mem, format, &args)?;
                self.ax = out.len() as Word;
                return Ok(Some(Event::Print(String::from_utf8_lossy(&out).to_string())));
            }
            Malc => {
                let size = usize::try_from(self.arg(0, 1)?).unwrap_or(usize::max_value());
                self.ax = self.mem.alloc(size).map_or(0, |addr| addr as Word);
            }
            Free => {
                let addr = self.arg(0, 1)?;
                self.mem.free(addr)?;
                self.ax = 0;
            }
            Mset => {
                let dest = self.arg(0, 3)?;
                let val = self.arg(1, 3)?;
                let len = usize::try_from(self.arg(2, 3)?).unwrap_or(0);
                for b in self.mem.slice_mut(dest, len)? {
                    *b = val as u8;
                }
                self.ax = dest;
            }
            Mcmp => {
                let len = usize::try_from(self.arg(2, 3)?).unwrap_or(0);
                let lhs = self.mem.slice(self.arg(0, 3)?, len)?;
                let rhs = self.mem.slice(self.arg(1, 3)?, len)?;
                self.ax = lhs
                    .iter()
                    .zip(rhs)
                    .find(|(l, r)| l != r)
                    .map_or(0, |(l, r)| *l as Word - *r as Word);
            }
            Exit => return Ok(Some(Event::Exit(self.arg(0, 1)?))),
        }
        Ok(None)
    }
}

fn binary(op: Opcode, lhs: Word, rhs: Word) -> Result<Word> {
    use Opcode::*;
    Ok(match op {
        Or => lhs | rhs,
        Xor => lhs ^ rhs,
        And => lhs & rhs,
        Eq => (lhs == rhs) as Word,
        Ne => (lhs != rhs) as Word,
        Lt => (lhs < rhs) as Word,
        Gt => (lhs > rhs) as Word,
        Le => (lhs <= rhs) as Word,
        Ge => (lhs >= rhs) as Word,
        Shl => lhs.wrapping_shl(rhs as u32),
        Shr => lhs.wrapping_shr(rhs as u32),
        Add => lhs.wrapping_add(rhs),
        Sub => lhs.wrapping_sub(rhs),
        Mul => lhs.wrapping_mul(rhs),
        Div | Mod if rhs == 0 => return Err(error!(DivisionByZero)),
        Div => lhs.wrapping_div(rhs),
        Mod => lhs.wrapping_rem(rhs),
        _ => return Err(error!(InternalError; format!("{} IS NOT BINARY", op))),
    })
}
