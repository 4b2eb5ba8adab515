use minic::lang::compile;
use minic::mach::Listing;

#[test]
fn test_listing_labels_functions() {
    let src = "int one() { return 1; }\nint main() { return one() + 2; }";
    let program = compile(src.as_bytes()).unwrap();
    let listing = Listing::new(&program).to_string();
    let expected = "\
one:
     0  ENT  0
     2  IMM  1
     4  LEV
     5  LEV
main:
     6  ENT  0
     8  CALL 0 <one>
    10  PUSH
    11  IMM  2
    13  ADD
    14  LEV
    15  LEV
";
    assert_eq!(listing, expected);
}

#[test]
fn test_listing_branches() {
    let src = "int main() { int i; while (i < 3) i++; return i; }";
    let program = compile(src.as_bytes()).unwrap();
    let listing = Listing::new(&program);
    let lines: Vec<&String> = listing.lines().collect();
    assert_eq!(lines[0], "main:");
    assert!(lines.iter().any(|l| l.starts_with("     9  JZ   ")));
    assert!(lines.iter().any(|l| l.ends_with("JMP  2")));
}
