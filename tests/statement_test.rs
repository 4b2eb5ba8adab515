mod common;
use common::*;

#[test]
fn test_exit_status() {
    assert_eq!(status("int main() { exit(10 + 20); }"), 30);
    assert_eq!(status("int main() { return 10 + 20; }"), 30);
}

#[test]
fn test_if_else_while() {
    let src = r#"
        int main() {
            int i, sum;
            i = 0;
            sum = 0;
            while (i < 10) {
                if (i % 2) sum = sum + i;
                else sum = sum - 1;
                i++;
            }
            return sum;
        }
    "#;
    assert_eq!(status(src), 20);
}

#[test]
fn test_nested_blocks_and_empty_statements() {
    let src = r#"
        int main() {
            int i;
            i = 3;
            ;;
            { { if (i == 3) { i = 4; } } }
            if (i != 4) return 1; else if (i > 3) return 2;
            return 3;
        }
    "#;
    assert_eq!(status(src), 2);
}

#[test]
fn test_arithmetic_matches_rust() {
    let cases: &[(&str, i64)] = &[
        ("7 / 2", 7 / 2),
        ("-7 / 2", -7 / 2),
        ("7 % 3", 7 % 3),
        ("-7 % 3", -7 % 3),
        ("1 << 4", 1 << 4),
        ("-16 >> 2", -16 >> 2),
        ("6 & 3", 6 & 3),
        ("6 | 3", 6 | 3),
        ("6 ^ 3", 6 ^ 3),
        ("3 != 4", 1),
        ("3 == 4", 0),
        ("2 <= 2", 1),
        ("2 >= 3", 0),
        ("2 * 3 + 4", 2 * 3 + 4),
        ("2 + 3 * 4", 2 + 3 * 4),
        ("(2 + 3) * 4", (2 + 3) * 4),
        ("10 - 3 - 2", 10 - 3 - 2),
        ("100 / 10 / 5", 100 / 10 / 5),
        ("1 + 2 == 3", 1),
        ("1 | 2 ^ 3 & 4", 1 | 2 ^ 3 & 4),
        ("~5", !5),
        ("!5", 0),
        ("!0", 1),
        ("-(3)", -3),
        ("+7", 7),
        ("0x1f + 010", 0x1f + 8),
        ("'a'", 97),
    ];
    for (expr, expected) in cases {
        let src = format!("int main() {{ return {}; }}", expr);
        assert_eq!(status(&src), *expected, "{}", expr);
    }
}

#[test]
fn test_logical_and_conditional() {
    let src = r#"
        int calls;
        int touch() { calls = calls + 1; return 1; }
        int main() {
            int r;
            r = 0;
            if (0 || 2) r = r + 1;
            if (1 && 0) r = r + 100;
            if (0 && touch()) r = r + 100;
            if (1 || touch()) r = r + 10;
            r = r + (3 > 2 ? 5 : 6);
            r = r + (0 ? 1000 : 0 ? 2000 : 20);
            return r * 10 + calls;
        }
    "#;
    assert_eq!(status(src), 360);
}

#[test]
fn test_assignment_is_an_expression() {
    let src = r#"
        int a, b;
        int main() { a = b = 4; return a + b; }
    "#;
    assert_eq!(status(src), 8);
}

#[test]
fn test_increment_decrement() {
    let src = r#"
        int main() {
            int i, j;
            i = 5;
            j = i++;
            j = j * 10 + i;
            j = j * 10 + ++i;
            j = j * 10 + i--;
            j = j * 10 + --i;
            return j;
        }
    "#;
    assert_eq!(status(src), 56775);
}

#[test]
fn test_printf() {
    let src = r#"
        int main() {
            printf("%d %s %c|%5d|%-3d|%03d|%x|%%\n", 42, "hi", 'A', 7, 7, 7, 255);
            return printf("abc");
        }
    "#;
    assert_eq!(exec(src), ("42 hi A|    7|7  |007|ff|%\nabc".to_string(), 3));
}

#[test]
fn test_globals_start_zeroed() {
    let src = r#"
        int a; char c; int *p;
        int main() { return a + c + p; }
    "#;
    assert_eq!(status(src), 0);
}

#[test]
fn test_enum_members() {
    let src = r#"
        enum color { RED, GREEN = 10, BLUE };
        enum { ONE = 1 };
        int main() { return RED + GREEN + BLUE + ONE; }
    "#;
    assert_eq!(status(src), 22);
}

#[test]
fn test_logical_results_are_zero_or_one() {
    let src = r#"
        int main() {
            int r;
            r = 7 && -3;
            printf("%d %d %d %d %d\n", 0 || 2, 2 && 3, 0 && 5, 0 || 0, r);
            return 0;
        }
    "#;
    assert_eq!(output(src), "1 1 0 0 1\n");
}

#[test]
fn test_negative_enum_initializer() {
    let src = r#"
        enum { M = -1, N, P = -10 };
        int main() { return M * 100 + N * 10 + P; }
    "#;
    assert_eq!(status(src), -110);
}
