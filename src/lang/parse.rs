use super::lex::Lexer;
use super::symbol::{Class, SymbolId, SymbolTable, Type, Width};
use super::token::{Precedence, Token};
use super::{Error, LineNumber};
use crate::error;
use crate::mach::{Opcode, Program, Word};
use std::convert::TryFrom;

type Result<T> = std::result::Result<T, Error>;

/// ## Single pass compiler
///
/// Tokens are pulled one at a time and code is emitted as soon as each
/// construct is recognized. There is no syntax tree. Forward branches are
/// emitted with placeholder targets and patched when the target is reached.
///
/// Function frames: parameter `i` of `n` is bound to slot `i`, the saved
/// frame pointer sits at slot `n + 1` and locals count up from there.
/// `LEA` takes the difference to the saved frame pointer slot, so
/// parameters land above it and locals below.

pub fn compile(src: &[u8]) -> Result<Program> {
    Compiler::new(src).compile().map(|(program, _)| program)
}

/// Result of compiling an expression. An `Address` is in the accumulator
/// but has not been loaded yet, so it can still be assigned or taken
/// the address of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operand {
    Value,
    Address(Width),
}

pub struct Compiler<'a> {
    lexer: Lexer<'a>,
    symbols: SymbolTable,
    program: Program,
    token: Token,
    ty: Type,
    index_of_bp: Word,
}

impl<'a> Compiler<'a> {
    pub fn new(src: &'a [u8]) -> Compiler<'a> {
        Compiler {
            lexer: Lexer::new(src),
            symbols: SymbolTable::new(),
            program: Program::new(),
            token: Token::Eof,
            ty: Type::INT,
            index_of_bp: 0,
        }
    }

    /// Compiles the whole source. The symbol table comes back with every
    /// global, function and enum member still bound.
    pub fn compile(mut self) -> Result<(Program, SymbolTable)> {
        self.next();
        while self.token != Token::Eof {
            self.declaration()?;
        }
        let main = self.symbols.lookup("main").map(|id| self.symbols.binding(id));
        match main {
            Some(binding) if binding.class == Class::Function => {
                self.program.set_entry(binding.value as usize)
            }
            _ => return Err(error!(MainNotDefined)),
        }
        debug_assert!(!self.program.has_unpatched());
        Ok((self.program, self.symbols))
    }

    fn next(&mut self) {
        self.token = self.lexer.next(&mut self.symbols, &mut self.program);
    }

    fn line(&self) -> LineNumber {
        Some(self.lexer.line())
    }

    fn expect(&mut self, token: Token, message: &'static str) -> Result<()> {
        if self.token != token {
            return Err(error!(SyntaxError, self.line(); message));
        }
        self.next();
        Ok(())
    }

    fn ident(&self, message: &'static str) -> Result<SymbolId> {
        match self.token {
            Token::Ident(id) => Ok(id),
            _ => Err(error!(SyntaxError, self.line(); message)),
        }
    }

    fn pointers(&mut self, mut ty: Type) -> Type {
        while self.token == Token::Mul {
            self.next();
            ty = ty.pointer_to();
        }
        ty
    }

    fn here(&self) -> Word {
        self.program.here() as Word
    }

    fn patch(&mut self, slot: usize) -> Result<()> {
        let here = self.program.here();
        self.program.patch(slot, here)
    }

    fn declaration(&mut self) -> Result<()> {
        debug_assert!(self.symbols.iter().all(|s| s.binding.class != Class::Local));
        let base = match self.token {
            Token::Int => Type::INT,
            Token::Char => Type::CHAR,
            Token::Enum => {
                self.next();
                self.enumeration()?;
                Type::INT
            }
            Token::Semicolon => Type::INT,
            _ => return Err(error!(SyntaxError, self.line(); "EXPECTED DECLARATION")),
        };
        if self.token.is_type() {
            self.next();
        }
        if self.token == Token::Semicolon {
            self.next();
            return Ok(());
        }
        loop {
            let ty = self.pointers(base);
            let id = self.ident("BAD GLOBAL DECLARATION")?;
            if self.symbols.binding(id).class != Class::Unbound {
                let name = self.symbols.name(id).to_string();
                return Err(error!(DuplicateDeclaration, self.line(); name));
            }
            self.next();
            if self.token == Token::LParen {
                let addr = self.program.here();
                let name = self.symbols.name(id).to_string();
                self.program.label(addr, &name);
                self.symbols.bind(id, Class::Function, ty, addr as Word);
                self.next();
                return self.function();
            }
            let addr = self.program.alloc_global();
            self.symbols.bind(id, Class::Global, ty, addr as Word);
            match self.token {
                Token::Comma => self.next(),
                Token::Semicolon => {
                    self.next();
                    return Ok(());
                }
                _ => return Err(error!(SyntaxError, self.line(); "EXPECTED ; OR ,")),
            }
        }
    }

    /// Follows `enum`: an optional tag, then an optional member list.
    fn enumeration(&mut self) -> Result<()> {
        if let Token::Ident(_) = self.token {
            self.next();
        }
        if self.token != Token::LBrace {
            return Ok(());
        }
        self.next();
        let mut value: Word = 0;
        while self.token != Token::RBrace {
            let id = self.ident("BAD ENUM IDENTIFIER")?;
            if self.symbols.binding(id).class != Class::Unbound {
                let name = self.symbols.name(id).to_string();
                return Err(error!(DuplicateDeclaration, self.line(); name));
            }
            self.next();
            if self.token == Token::Assign {
                self.next();
                let negative = self.token == Token::Sub;
                if negative {
                    self.next();
                }
                value = match self.token {
                    Token::Number(n) if negative => n.wrapping_neg(),
                    Token::Number(n) => n,
                    _ => return Err(error!(SyntaxError, self.line(); "BAD ENUM INITIALIZER")),
                };
                self.next();
            }
            self.symbols.bind(id, Class::Enum, Type::INT, value);
            value = value.wrapping_add(1);
            match self.token {
                Token::Comma => self.next(),
                Token::RBrace => {}
                _ => return Err(error!(SyntaxError, self.line(); "EXPECTED , OR }")),
            }
        }
        self.next();
        Ok(())
    }

    /// Follows the `(` of a function definition.
    fn function(&mut self) -> Result<()> {
        let mut params: Word = 0;
        while self.token != Token::RParen {
            let base = match self.token {
                Token::Int => Type::INT,
                Token::Char => Type::CHAR,
                _ => return Err(error!(BadParameter, self.line(); "EXPECTED PARAMETER TYPE")),
            };
            self.next();
            let ty = self.pointers(base);
            let id = match self.token {
                Token::Ident(id) => id,
                _ => return Err(error!(BadParameter, self.line(); "BAD PARAMETER NAME")),
            };
            if self.symbols.binding(id).class == Class::Local {
                let name = self.symbols.name(id).to_string();
                return Err(error!(DuplicateDeclaration, self.line(); name));
            }
            self.symbols.bind_local(id, Class::Local, ty, params);
            params += 1;
            self.next();
            match self.token {
                Token::Comma => {
                    self.next();
                    if self.token == Token::RParen {
                        return Err(error!(BadParameter, self.line(); "EXPECTED PARAMETER TYPE"));
                    }
                }
                Token::RParen => {}
                _ => return Err(error!(BadParameter, self.line(); "EXPECTED , OR )")),
            }
        }
        self.next();
        self.expect(Token::LBrace, "EXPECTED {")?;
        self.index_of_bp = params + 1;
        let mut slot = self.index_of_bp;
        while self.token.is_type() {
            let base = if self.token == Token::Char {
                Type::CHAR
            } else {
                Type::INT
            };
            self.next();
            while self.token != Token::Semicolon {
                let ty = self.pointers(base);
                let id = self.ident("BAD LOCAL DECLARATION")?;
                if self.symbols.binding(id).class == Class::Local {
                    let name = self.symbols.name(id).to_string();
                    return Err(error!(DuplicateDeclaration, self.line(); name));
                }
                slot += 1;
                self.symbols.bind_local(id, Class::Local, ty, slot);
                self.next();
                match self.token {
                    Token::Comma => self.next(),
                    Token::Semicolon => {}
                    _ => return Err(error!(SyntaxError, self.line(); "EXPECTED ; OR ,")),
                }
            }
            self.next();
        }
        self.program.emit_with(Opcode::Ent, slot - self.index_of_bp);
        while self.token != Token::RBrace {
            self.statement()?;
        }
        self.program.emit(Opcode::Lev);
        self.next();
        self.symbols.unwind_locals();
        Ok(())
    }

    fn statement(&mut self) -> Result<()> {
        match self.token {
            Token::If => {
                self.next();
                self.condition()?;
                let branch = self.program.emit_forward(Opcode::Jz);
                self.statement()?;
                if self.token == Token::Else {
                    self.next();
                    let skip = self.program.emit_forward(Opcode::Jmp);
                    self.patch(branch)?;
                    self.statement()?;
                    self.patch(skip)?;
                } else {
                    self.patch(branch)?;
                }
            }
            Token::While => {
                self.next();
                let top = self.here();
                self.condition()?;
                let exit = self.program.emit_forward(Opcode::Jz);
                self.statement()?;
                self.program.emit_with(Opcode::Jmp, top);
                self.patch(exit)?;
            }
            Token::Return => {
                self.next();
                if self.token != Token::Semicolon {
                    self.value(Precedence::Assign)?;
                }
                self.program.emit(Opcode::Lev);
                self.expect(Token::Semicolon, "EXPECTED ;")?;
            }
            Token::LBrace => {
                self.next();
                while self.token != Token::RBrace {
                    self.statement()?;
                }
                self.next();
            }
            Token::Semicolon => self.next(),
            Token::Eof => return Err(error!(SyntaxError, self.line(); "UNEXPECTED END OF FILE")),
            _ => {
                self.expression(Precedence::Assign)?;
                self.expect(Token::Semicolon, "EXPECTED ;")?;
            }
        }
        Ok(())
    }

    fn condition(&mut self) -> Result<()> {
        self.expect(Token::LParen, "EXPECTED (")?;
        self.value(Precedence::Assign)?;
        self.expect(Token::RParen, "EXPECTED )")
    }

    fn load(&mut self, operand: Operand) {
        match operand {
            Operand::Address(Width::Byte) => self.program.emit(Opcode::Lc),
            Operand::Address(Width::Word) => self.program.emit(Opcode::Li),
            Operand::Value => {}
        }
    }

    fn store(&mut self, width: Width) {
        match width {
            Width::Byte => self.program.emit(Opcode::Sc),
            Width::Word => self.program.emit(Opcode::Si),
        }
    }

    fn lvalue(&self, operand: Operand) -> Result<Width> {
        match operand {
            Operand::Address(width) => Ok(width),
            Operand::Value => Err(error!(BadLvalue, self.line())),
        }
    }

    /// Compiles an expression and leaves its value in the accumulator.
    fn value(&mut self, min: Precedence) -> Result<()> {
        let operand = self.expression(min)?;
        self.load(operand);
        Ok(())
    }

    /// Pushes the accumulator, then evaluates the right hand side.
    fn operand(&mut self, min: Precedence) -> Result<()> {
        self.program.emit(Opcode::Push);
        self.value(min)
    }

    fn scale(&mut self, stride: Word) {
        if stride > 1 {
            self.program.emit(Opcode::Push);
            self.program.emit_with(Opcode::Imm, stride);
            self.program.emit(Opcode::Mul);
        }
    }

    /// Precedence climbing. Binary operators bind while their precedence
    /// is at least `min`. Assignment and `?:` are right associative.
    fn expression(&mut self, min: Precedence) -> Result<Operand> {
        let mut operand = self.unary()?;
        while let Some(precedence) = self.token.precedence() {
            if precedence < min {
                break;
            }
            let ty = self.ty;
            let token = self.token;
            self.next();
            operand = match token {
                Token::Assign => {
                    let width = self.lvalue(operand)?;
                    self.operand(Precedence::Assign)?;
                    self.store(width);
                    self.ty = ty;
                    Operand::Value
                }
                Token::Cond => {
                    self.load(operand);
                    let branch = self.program.emit_forward(Opcode::Jz);
                    self.value(Precedence::Assign)?;
                    self.expect(Token::Colon, "EXPECTED :")?;
                    let skip = self.program.emit_forward(Opcode::Jmp);
                    self.patch(branch)?;
                    self.value(Precedence::Cond)?;
                    self.patch(skip)?;
                    Operand::Value
                }
                Token::Lor | Token::Lan => {
                    self.load(operand);
                    let (op, rhs) = if token == Token::Lor {
                        (Opcode::Jnz, Precedence::Lan)
                    } else {
                        (Opcode::Jz, Precedence::Or)
                    };
                    let skip = self.program.emit_forward(op);
                    self.value(rhs)?;
                    self.patch(skip)?;
                    self.program.emit(Opcode::Push);
                    self.program.emit_with(Opcode::Imm, 0);
                    self.program.emit(Opcode::Ne);
                    self.ty = Type::INT;
                    Operand::Value
                }
                Token::Add => {
                    self.load(operand);
                    self.operand(Precedence::Multiplicative)?;
                    if ty.is_pointer() && self.ty.is_pointer() {
                        return Err(error!(TypeMismatch, self.line(); "POINTER + POINTER"));
                    }
                    self.scale(ty.stride());
                    self.program.emit(Opcode::Add);
                    self.ty = ty;
                    Operand::Value
                }
                Token::Sub => {
                    self.load(operand);
                    self.operand(Precedence::Multiplicative)?;
                    if ty.is_pointer() && self.ty.is_pointer() && ty != self.ty {
                        let message = format!("{} - {}", ty, self.ty);
                        return Err(error!(TypeMismatch, self.line(); message));
                    }
                    if ty.is_pointer() && ty == self.ty {
                        self.program.emit(Opcode::Sub);
                        if ty.stride() > 1 {
                            self.program.emit(Opcode::Push);
                            self.program.emit_with(Opcode::Imm, ty.stride());
                            self.program.emit(Opcode::Div);
                        }
                        self.ty = Type::INT;
                    } else {
                        self.scale(ty.stride());
                        self.program.emit(Opcode::Sub);
                        self.ty = ty;
                    }
                    Operand::Value
                }
                Token::Inc | Token::Dec => {
                    // Compute and store the new value, then undo the step
                    // so the expression yields the old one.
                    let width = self.lvalue(operand)?;
                    let (step, undo) = if token == Token::Inc {
                        (Opcode::Add, Opcode::Sub)
                    } else {
                        (Opcode::Sub, Opcode::Add)
                    };
                    self.program.emit(Opcode::Push);
                    self.load(operand);
                    self.program.emit(Opcode::Push);
                    self.program.emit_with(Opcode::Imm, ty.stride());
                    self.program.emit(step);
                    self.store(width);
                    self.program.emit(Opcode::Push);
                    self.program.emit_with(Opcode::Imm, ty.stride());
                    self.program.emit(undo);
                    if width == Width::Byte {
                        // SC leaves the truncated byte in ax.
                        self.program.emit(Opcode::Push);
                        self.program.emit_with(Opcode::Imm, 0xff);
                        self.program.emit(Opcode::And);
                    }
                    Operand::Value
                }
                Token::Brak => {
                    let element = match ty.deref() {
                        Some(element) => element,
                        None => return Err(error!(BadDereference, self.line(); "POINTER TYPE EXPECTED")),
                    };
                    self.load(operand);
                    self.operand(Precedence::Assign)?;
                    self.expect(Token::RBracket, "EXPECTED ]")?;
                    self.scale(ty.stride());
                    self.program.emit(Opcode::Add);
                    self.ty = element;
                    Operand::Address(element.width())
                }
                _ => {
                    let (op, rhs) = binary(token, precedence);
                    self.load(operand);
                    self.operand(rhs)?;
                    self.program.emit(op);
                    self.ty = Type::INT;
                    Operand::Value
                }
            };
        }
        Ok(operand)
    }

    fn unary(&mut self) -> Result<Operand> {
        let token = self.token;
        match token {
            Token::Number(n) => {
                self.next();
                self.program.emit_with(Opcode::Imm, n);
                self.ty = Type::INT;
                Ok(Operand::Value)
            }
            Token::Str(addr) => {
                self.next();
                while let Token::Str(_) = self.token {
                    self.next();
                }
                self.program.end_string();
                self.program.emit_with(Opcode::Imm, addr as Word);
                self.ty = Type::CHAR.pointer_to();
                Ok(Operand::Value)
            }
            Token::Ident(id) => {
                self.next();
                if self.token == Token::LParen {
                    self.next();
                    return self.call(id);
                }
                let binding = self.symbols.binding(id);
                self.ty = binding.ty;
                match binding.class {
                    Class::Enum => {
                        self.program.emit_with(Opcode::Imm, binding.value);
                        Ok(Operand::Value)
                    }
                    Class::Local => {
                        self.program
                            .emit_with(Opcode::Lea, self.index_of_bp - binding.value);
                        Ok(Operand::Address(binding.ty.width()))
                    }
                    Class::Global => {
                        self.program.emit_with(Opcode::Imm, binding.value);
                        Ok(Operand::Address(binding.ty.width()))
                    }
                    Class::Unbound => {
                        let name = self.symbols.name(id).to_string();
                        Err(error!(UndeclaredIdentifier, self.line(); name))
                    }
                    Class::Function | Class::Host => {
                        let name = self.symbols.name(id).to_string();
                        Err(error!(SyntaxError, self.line(); format!("BAD USE OF {}", name)))
                    }
                }
            }
            Token::LParen => {
                self.next();
                if self.token.is_type() {
                    let base = if self.token == Token::Char {
                        Type::CHAR
                    } else {
                        Type::INT
                    };
                    self.next();
                    let ty = self.pointers(base);
                    self.expect(Token::RParen, "BAD CAST")?;
                    self.value(Precedence::Unary)?;
                    self.ty = ty;
                    Ok(Operand::Value)
                } else {
                    let operand = self.expression(Precedence::Assign)?;
                    self.expect(Token::RParen, "EXPECTED )")?;
                    Ok(operand)
                }
            }
            Token::Mul => {
                self.next();
                self.value(Precedence::Unary)?;
                match self.ty.deref() {
                    Some(ty) => {
                        self.ty = ty;
                        Ok(Operand::Address(ty.width()))
                    }
                    None => Err(error!(BadDereference, self.line())),
                }
            }
            Token::And => {
                self.next();
                let operand = self.expression(Precedence::Unary)?;
                self.lvalue(operand)?;
                self.ty = self.ty.pointer_to();
                Ok(Operand::Value)
            }
            Token::Bang | Token::Tilde => {
                self.next();
                self.value(Precedence::Unary)?;
                self.program.emit(Opcode::Push);
                if token == Token::Bang {
                    self.program.emit_with(Opcode::Imm, 0);
                    self.program.emit(Opcode::Eq);
                } else {
                    self.program.emit_with(Opcode::Imm, -1);
                    self.program.emit(Opcode::Xor);
                }
                self.ty = Type::INT;
                Ok(Operand::Value)
            }
            Token::Add => {
                self.next();
                self.value(Precedence::Unary)?;
                self.ty = Type::INT;
                Ok(Operand::Value)
            }
            Token::Sub => {
                self.next();
                if let Token::Number(n) = self.token {
                    self.next();
                    self.program.emit_with(Opcode::Imm, n.wrapping_neg());
                } else {
                    self.program.emit_with(Opcode::Imm, -1);
                    self.program.emit(Opcode::Push);
                    self.value(Precedence::Unary)?;
                    self.program.emit(Opcode::Mul);
                }
                self.ty = Type::INT;
                Ok(Operand::Value)
            }
            Token::Inc | Token::Dec => {
                self.next();
                let operand = self.expression(Precedence::Unary)?;
                let width = self.lvalue(operand)?;
                self.program.emit(Opcode::Push);
                self.load(operand);
                self.program.emit(Opcode::Push);
                self.program.emit_with(Opcode::Imm, self.ty.stride());
                self.program.emit(if token == Token::Inc {
                    Opcode::Add
                } else {
                    Opcode::Sub
                });
                self.store(width);
                Ok(Operand::Value)
            }
            Token::Eof => Err(error!(SyntaxError, self.line(); "UNEXPECTED END OF FILE")),
            _ => Err(error!(SyntaxError, self.line(); "BAD EXPRESSION")),
        }
    }

    /// Follows the `(` of a call. Arguments are pushed left to right.
    fn call(&mut self, id: SymbolId) -> Result<Operand> {
        let mut args: usize = 0;
        while self.token != Token::RParen {
            self.value(Precedence::Assign)?;
            self.program.emit(Opcode::Push);
            args += 1;
            match self.token {
                Token::Comma => self.next(),
                Token::RParen => {}
                _ => return Err(error!(SyntaxError, self.line(); "EXPECTED , OR )")),
            }
        }
        self.next();
        let binding = self.symbols.binding(id);
        let name = self.symbols.name(id).to_string();
        match binding.class {
            Class::Host => {
                let op = match Opcode::try_from(binding.value) {
                    Ok(op) => op,
                    Err(_) => return Err(error!(InternalError, self.line(); name)),
                };
                if !op.arity().map_or(false, |arity| arity.contains(&args)) {
                    return Err(error!(WrongNumberOfArguments, self.line(); name));
                }
                self.program.emit(op);
            }
            Class::Function => self.program.emit_with(Opcode::Call, binding.value),
            Class::Unbound => return Err(error!(UndeclaredIdentifier, self.line(); name)),
            _ => return Err(error!(NotAFunction, self.line(); name)),
        }
        if args > 0 {
            self.program.emit_with(Opcode::Adj, args as Word);
        }
        self.ty = binding.ty;
        Ok(Operand::Value)
    }
}

/// Opcode and right hand side precedence of a plain binary operator.
fn binary(token: Token, precedence: Precedence) -> (Opcode, Precedence) {
    let op = match token {
        Token::Or => Opcode::Or,
        Token::Xor => Opcode::Xor,
        Token::And => Opcode::And,
        Token::Eq => Opcode::Eq,
        Token::Ne => Opcode::Ne,
        Token::Lt => Opcode::Lt,
        Token::Gt => Opcode::Gt,
        Token::Le => Opcode::Le,
        Token::Ge => Opcode::Ge,
        Token::Shl => Opcode::Shl,
        Token::Shr => Opcode::Shr,
        Token::Mul => Opcode::Mul,
        Token::Div => Opcode::Div,
        _ => Opcode::Mod,
    };
    (op, precedence.tighter())
}
