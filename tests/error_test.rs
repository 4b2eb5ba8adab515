mod common;
use common::*;
use minic::lang::{compile, ErrorCode};
use minic::mach::{Config, Event, Runtime};

#[test]
fn test_duplicate_global() {
    let src = "int x;\nint x;\nint main() { printf(\"never\"); return 0; }";
    let error = compile_error(src);
    assert!(error.is(ErrorCode::DuplicateDeclaration));
    assert_eq!(error.line_number(), Some(2));
    assert_eq!(error.to_string(), "DUPLICATE DECLARATION IN LINE 2; x");
    assert_eq!(
        exec(src),
        ("DUPLICATE DECLARATION IN LINE 2; x\n".to_string(), -1)
    );
}

#[test]
fn test_duplicate_function_and_enum() {
    let error = compile_error("int f() { }\nchar *f;\nint main() { }");
    assert!(error.is(ErrorCode::DuplicateDeclaration));
    let error = compile_error("enum { A, A };\nint main() { }");
    assert!(error.is(ErrorCode::DuplicateDeclaration));
}

#[test]
fn test_duplicate_local() {
    let error = compile_error("int f(int a, int a) { }\nint main() { }");
    assert!(error.is(ErrorCode::DuplicateDeclaration));
    let error = compile_error("int main() {\n int b;\n char b;\n}");
    assert!(error.is(ErrorCode::DuplicateDeclaration));
    assert_eq!(error.line_number(), Some(3));
}

#[test]
fn test_undeclared() {
    let error = compile_error("int main() {\n return y; }");
    assert!(error.is(ErrorCode::UndeclaredIdentifier));
    assert_eq!(error.to_string(), "UNDECLARED IDENTIFIER IN LINE 2; y");
}

#[test]
fn test_forward_call_unsupported() {
    let error = compile_error("int main() { return g(); }\nint g() { return 1; }");
    assert!(error.is(ErrorCode::UndeclaredIdentifier));
}

#[test]
fn test_main_not_defined() {
    assert!(compile_error("int x;").is(ErrorCode::MainNotDefined));
    assert!(compile_error("int main;").is(ErrorCode::MainNotDefined));
}

#[test]
fn test_host_arity() {
    let error = compile_error("int main() { exit(); }");
    assert!(error.is(ErrorCode::WrongNumberOfArguments));
    let error = compile_error("int main() { memset(1, 2); }");
    assert!(error.is(ErrorCode::WrongNumberOfArguments));
    let error = compile_error("int main() { printf(); }");
    assert!(error.is(ErrorCode::WrongNumberOfArguments));
}

#[test]
fn test_not_a_function() {
    let error = compile_error("int x;\nint main() { return x(); }");
    assert!(error.is(ErrorCode::NotAFunction));
    let error = compile_error("enum { K };\nint main() { return K(1); }");
    assert!(error.is(ErrorCode::NotAFunction));
}

#[test]
fn test_lvalues() {
    assert!(compile_error("int main() { 3 = 4; }").is(ErrorCode::BadLvalue));
    assert!(compile_error("int main() { int a; a + 1 = 4; }").is(ErrorCode::BadLvalue));
    assert!(compile_error("int main() { return &3; }").is(ErrorCode::BadLvalue));
    assert!(compile_error("int main() { 3++; }").is(ErrorCode::BadLvalue));
}

#[test]
fn test_bad_dereference() {
    assert!(compile_error("int main() { int x; return *x; }").is(ErrorCode::BadDereference));
    assert!(compile_error("int main() { int x; return x[1]; }").is(ErrorCode::BadDereference));
}

#[test]
fn test_pointer_type_mismatch() {
    let error = compile_error("int *a; char *b;\nint main() { return a - b; }");
    assert!(error.is(ErrorCode::TypeMismatch));
    assert_eq!(error.to_string(), "TYPE MISMATCH IN LINE 2; int* - char*");
    let error = compile_error("int *a, *c;\nint main() { return a + c; }");
    assert!(error.is(ErrorCode::TypeMismatch));
    assert_eq!(status("int *a, *c;\nint main() { return a - c + (a + 1 - a); }"), 1);
}

#[test]
fn test_trailing_parameter_comma() {
    let error = compile_error("int f(int a,) { }\nint main() { }");
    assert!(error.is(ErrorCode::BadParameter));
}

#[test]
fn test_syntax_errors() {
    let cases = [
        "int main() { return 1 }",
        "int main() { return 1 ? 2; }",
        "int main() { return 1;",
        "int main() { if 1 return 2; }",
        "int main() { return (1; }",
        "int 3;",
        "main() { }",
        "int a b;\nint main() { }",
        "int main() { return ); }",
        "int f(int a b) { }",
        "int f(x) { }",
    ];
    for src in cases.iter() {
        let error = compile_error(src);
        assert!(
            error.is(ErrorCode::SyntaxError) || error.is(ErrorCode::BadParameter),
            "{}: {}",
            src,
            error
        );
    }
}

#[test]
fn test_division_by_zero() {
    let src = "int main() { int z; z = 0; printf(\"before\\n\"); return 1 / z; }";
    assert_eq!(exec(src), ("before\nDIVISION BY ZERO\n".to_string(), -1));
    let (out, code) = exec("int main() { int z; z = 0; return 1 % z; }");
    assert_eq!((out.as_str(), code), ("DIVISION BY ZERO\n", -1));
}

#[test]
fn test_null_dereference() {
    let (out, code) = exec("int main() { int *p; p = 0; return *p; }");
    assert!(out.starts_with("SEGMENTATION FAULT"), "{}", out);
    assert_eq!(code, -1);
}

#[test]
fn test_out_of_bounds() {
    let (out, code) = exec("int main() { char *p; p = 1; p = p << 40; return *p; }");
    assert!(out.starts_with("SEGMENTATION FAULT"), "{}", out);
    assert_eq!(code, -1);
}

#[test]
fn test_bad_free() {
    let (out, code) = exec("int main() { int *p; p = malloc(16); free(p + 1); return 0; }");
    assert!(out.starts_with("SEGMENTATION FAULT"), "{}", out);
    assert_eq!(code, -1);
}

#[test]
fn test_stack_overflow() {
    let src = "int f(int n) { return f(n + 1); }\nint main() { return f(0); }";
    let config = Config {
        pool_size: 4096,
        ..Config::default()
    };
    let (out, code) = exec_config(src, &["test.c"], &config);
    assert_eq!((out.as_str(), code), ("STACK OVERFLOW\n", -1));
}

#[test]
fn test_interrupt() {
    let program = compile(b"int main() { while (1) ; }").unwrap();
    let mut runtime = Runtime::new(&program, &Config::default(), &["test.c"]).unwrap();
    assert_eq!(runtime.execute(100), Event::Running);
    assert_eq!(runtime.execute(100), Event::Running);
    runtime.interrupt();
    match runtime.execute(100) {
        Event::Error(error) => assert!(error.is(ErrorCode::Break)),
        event => panic!("{:?}", event),
    }
    assert!(matches!(runtime.execute(100), Event::Error(_)));
}
