mod common;
use common::*;
use minic::mach::Config;

#[test]
fn test_memset_memcmp() {
    let src = r#"
        int main() {
            char *a, *b;
            a = malloc(16);
            b = malloc(16);
            memset(a, 'x', 16);
            memset(b, 'x', 16);
            if (memcmp(a, b, 16)) return 100;
            b[5] = 'y';
            return memcmp(b, a, 16);
        }
    "#;
    assert_eq!(status(src), 1);
}

#[test]
fn test_free_reuses_block() {
    let src = r#"
        int main() {
            int *a, *b;
            a = malloc(64);
            free(a);
            b = malloc(64);
            free(0);
            return a == b;
        }
    "#;
    assert_eq!(status(src), 1);
}

#[test]
fn test_malloc_exhausted() {
    let src = "int main() { return malloc(1000000) == 0; }";
    let config = Config {
        pool_size: 4096,
        ..Config::default()
    };
    assert_eq!(exec_config(src, &["test.c"], &config), ("".to_string(), 1));
}

#[test]
fn test_open_missing_file() {
    let src = r#"
        int main() {
            if (open("/nonexistent/minic/file.txt", 0) < 0) return 3;
            return 4;
        }
    "#;
    assert_eq!(status(src), 3);
}

#[test]
fn test_read_file() {
    let path = std::env::temp_dir().join(format!("minic-read-{}.txt", std::process::id()));
    std::fs::write(&path, "hello file\n").unwrap();
    let src = format!(
        r#"
        int main() {{
            int fd, n;
            char *buf;
            fd = open("{}", 0);
            if (fd < 3) return 1;
            buf = malloc(64);
            memset(buf, 0, 64);
            n = read(fd, buf, 63);
            close(fd);
            printf("%s", buf);
            return n;
        }}
        "#,
        path.display()
    );
    let result = exec(&src);
    std::fs::remove_file(&path).unwrap();
    assert_eq!(result, ("hello file\n".to_string(), 11));
}

#[test]
fn test_close_unknown_descriptor() {
    assert_eq!(status("int main() { return close(42); }"), -1);
}

#[test]
fn test_open_for_writing_creates_file() {
    let path = std::env::temp_dir().join(format!("minic-write-{}.txt", std::process::id()));
    let src = format!(
        r#"int main() {{ int fd; fd = open("{}", 1); close(fd); return fd; }}"#,
        path.display()
    );
    let result = exec(&src);
    let created = path.exists();
    let _ = std::fs::remove_file(&path);
    assert_eq!(result, ("".to_string(), 3));
    assert!(created);
}

#[test]
fn test_malloc_impossible_size() {
    assert_eq!(status("int main() { return malloc(-1) == 0; }"), 1);
    assert_eq!(status("int main() { return malloc(0x7fffffffffffffff) == 0; }"), 1);
}
