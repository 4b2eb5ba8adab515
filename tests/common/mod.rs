#![allow(dead_code)]
use minic::lang::{compile, Error};
use minic::mach::{Config, Event, Runtime, Word};

/// Compiles and runs `src`, returning everything printed followed by any
/// error, and the exit status. Failures exit with -1.
pub fn exec(src: &str) -> (String, Word) {
    exec_args(src, &["test.c"])
}

pub fn exec_args(src: &str, args: &[&str]) -> (String, Word) {
    exec_config(src, args, &Config::default())
}

pub fn exec_config(src: &str, args: &[&str], config: &Config) -> (String, Word) {
    let mut s = String::new();
    let mut runtime = match compile(src.as_bytes()).and_then(|p| Runtime::new(&p, config, args)) {
        Ok(runtime) => runtime,
        Err(error) => return (format!("{}\n", error), -1),
    };
    loop {
        match runtime.execute(config.cycles) {
            Event::Running => {}
            Event::Print(ps) => s.push_str(&ps),
            Event::Exit(code) => return (s, code),
            Event::Error(error) => {
                s.push_str(&format!("{}\n", error));
                return (s, -1);
            }
        }
    }
}

/// Output of a program that is expected to exit normally.
pub fn output(src: &str) -> String {
    let (s, _) = exec(src);
    s
}

/// Exit status of a program.
pub fn status(src: &str) -> Word {
    let (_, code) = exec(src);
    code
}

pub fn compile_error(src: &str) -> Error {
    compile(src.as_bytes()).unwrap_err()
}
