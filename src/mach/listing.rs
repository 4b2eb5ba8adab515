use super::{Address, Program};

/// Disassembly of a compiled program, one instruction per line.
///
/// Labelled addresses, usually functions, get a heading line and are
/// named after branches that target them.
#[derive(Debug, Clone, Default)]
pub struct Listing {
    lines: Vec<String>,
}

impl Listing {
    pub fn new(program: &Program) -> Listing {
        let labels = program.labels();
        let mut lines = vec![];
        for (addr, op, operand) in program.instructions() {
            if let Some(label) = labels.get(&addr) {
                lines.push(format!("{}:", label));
            }
            let line = match (op, operand) {
                (Some(op), Some(operand)) => match labels.get(&(operand as Address)) {
                    Some(label) if op.is_branch() => {
                        format!("{:>6}  {:<5}{} <{}>", addr, op.to_string(), operand, label)
                    }
                    _ => format!("{:>6}  {:<5}{}", addr, op.to_string(), operand),
                },
                (Some(op), None) => format!("{:>6}  {}", addr, op),
                (None, Some(word)) => format!("{:>6}  ??? {}", addr, word),
                (None, None) => format!("{:>6}  ???", addr),
            };
            lines.push(line);
        }
        Listing { lines }
    }

    pub fn lines(&self) -> std::slice::Iter<'_, String> {
        self.lines.iter()
    }
}

impl std::fmt::Display for Listing {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        for line in &self.lines {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mach::{Opcode, Word};

    #[test]
    fn test_listing() {
        let mut program = Program::from_code(vec![
            Opcode::Imm as Word,
            10,
            Opcode::Push as Word,
            Opcode::Call as Word,
            0,
            99,
        ]);
        program.label(0, "main");
        let listing = Listing::new(&program);
        let lines: Vec<&String> = listing.lines().collect();
        assert_eq!(lines[0], "main:");
        assert_eq!(lines[1], "     0  IMM  10");
        assert_eq!(lines[2], "     2  PUSH");
        assert_eq!(lines[3], "     3  CALL 0 <main>");
        assert_eq!(lines[4], "     5  ??? 99");
    }
}
