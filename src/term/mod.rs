extern crate ansi_term;
extern crate ctrlc;
use crate::lang::{compile, Error};
use crate::mach::{Config, Event, Listing, Runtime, Word, CYCLES, POOL_SIZE};
use crate::error;
use ansi_term::Style;
use clap::Parser;
use std::io::{ErrorKind, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Compile and run a C subset program.
#[derive(Parser, Debug)]
#[command(name = "minic", version)]
struct Cli {
    /// Print the compiled code instead of running it
    #[arg(short = 's', long = "source")]
    source: bool,

    /// Trace every executed instruction to stderr
    #[arg(short = 'd', long = "debug")]
    debug: bool,

    /// Bytes reserved for each of the heap and the stack
    #[arg(long, default_value_t = POOL_SIZE)]
    pool_size: usize,

    /// Instructions executed between interrupt checks
    #[arg(long, default_value_t = CYCLES)]
    cycles: usize,

    /// Source file
    file: PathBuf,

    /// Arguments passed to main
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

pub fn main() {
    let cli = Cli::parse();
    let interrupted = Arc::new(AtomicBool::new(false));
    let int_moved = interrupted.clone();
    if let Err(error) = ctrlc::set_handler(move || {
        int_moved.store(true, Ordering::SeqCst);
    }) {
        eprintln!("{}", error);
    }
    let status = match main_loop(&cli, interrupted) {
        Ok(status) => status,
        Err(error) => {
            eprintln!("{}", Style::new().bold().paint(error.to_string()));
            -1
        }
    };
    std::process::exit(status as i32);
}

fn main_loop(cli: &Cli, interrupted: Arc<AtomicBool>) -> Result<Word, Error> {
    let src = load(&cli.file)?;
    let program = compile(&src)?;
    if cli.source {
        print!("{}", Listing::new(&program));
        return Ok(0);
    }
    let config = Config {
        pool_size: cli.pool_size,
        trace: cli.debug,
        cycles: cli.cycles,
    };
    let file = cli.file.to_string_lossy().into_owned();
    let mut args: Vec<&str> = vec![file.as_str()];
    args.extend(cli.args.iter().map(String::as_str));
    let mut runtime = Runtime::new(&program, &config, &args)?;
    let stdout = std::io::stdout();
    loop {
        if interrupted.load(Ordering::SeqCst) {
            runtime.interrupt();
            interrupted.store(false, Ordering::SeqCst);
        }
        match runtime.execute(config.cycles) {
            Event::Running => {}
            Event::Print(s) => {
                let mut out = stdout.lock();
                out.write_all(s.as_bytes())?;
                out.flush()?;
            }
            Event::Exit(code) => return Ok(code),
            Event::Error(error) => return Err(error),
        }
    }
}

fn load(path: &std::path::Path) -> Result<Vec<u8>, Error> {
    match std::fs::read(path) {
        Ok(src) => Ok(src),
        Err(error) => {
            let msg = format!("{}: {}", path.display(), error);
            match error.kind() {
                ErrorKind::NotFound => Err(error!(FileNotFound; msg)),
                _ => Err(error!(DiskIoError; msg)),
            }
        }
    }
}
