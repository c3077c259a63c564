//! CLI command implementations.

use bfcc_vm::{CellFormat, Machine, MachineConfig, RuntimeError, Stepper, TapeView};
use std::fs;
use std::io::{self, BufRead, Write};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

const REPL_HELP: &str = "help, exit, ptr, mem, format, clear, open <file>, \
pause, step [N], resume, speed [+N|-N], cancel and instructions '+-<>[].,'";

/// Execute a program file against stdin/stdout.
pub fn run(args: &[String]) -> Result<(), i32> {
    let Some(input) = args.first() else {
        eprintln!("error: run requires an input file");
        eprintln!("Usage: bfcc run <input.bf> [--tape-size N] [--delay-ms N]");
        return Err(1);
    };

    let mut config = MachineConfig::default();
    if let Some(size) = parse_flag(&args[1..], "--tape-size")? {
        config = config.with_tape_size(size);
    }
    let delay_ms = parse_flag(&args[1..], "--delay-ms")?;
    if let Some(ms) = delay_ms {
        config = config.with_step_delay(Duration::from_millis(ms as u64));
    }

    let source = read_source(input)?;
    info!(path = %input, bytes = source.len(), tape_size = config.tape_size, "program loaded");

    let mut machine = Machine::new(config.tape_size)
        .with_input(io::stdin())
        .with_output(io::stdout());
    if delay_ms.is_some() {
        machine.set_step_hook(Stepper::new(config.step_delay).hook());
    }

    let result = machine.run_source(&source);
    let _ = io::stdout().flush();
    result.map_err(|e| {
        eprintln!("runtime error: {e}");
        3
    })
}

/// Print the collapsed token list of a program file, one token per line.
pub fn tokens(args: &[String]) -> Result<(), i32> {
    let Some(input) = args.first() else {
        eprintln!("error: tokens requires an input file");
        eprintln!("Usage: bfcc tokens <input.bf>");
        return Err(1);
    };

    let source = read_source(input)?;
    let mut out = io::stdout().lock();
    for token in bfcc_lexer::tokenize(&source) {
        writeln!(out, "{} [{}]", token.kind, token.repeat).map_err(|e| {
            eprintln!("error: {e}");
            1
        })?;
    }
    Ok(())
}

/// Read instructions line by line and evaluate them on one session.
pub fn repl(args: &[String]) -> Result<(), i32> {
    let mut config = MachineConfig::repl();
    if let Some(size) = parse_flag(args, "--tape-size")? {
        config = config.with_tape_size(size);
    }

    let stepper = Stepper::new(Duration::ZERO);
    let session = Machine::repl(config.tape_size)
        .with_input(io::stdin())
        .with_output(io::stdout())
        .with_step_hook(stepper.hook());
    let mut repl = Repl::new(session, stepper);
    let mut format = CellFormat::default();
    let stdin = io::stdin();
    let mut buffer = String::new();

    loop {
        print!("~$ ");
        let _ = io::stdout().flush();

        buffer.clear();
        match stdin.lock().read_line(&mut buffer) {
            Ok(0) => return repl.shutdown(),
            Ok(_) => {}
            Err(e) => {
                eprintln!("error: cannot read input: {e}");
                return Err(1);
            }
        }

        let line = buffer.trim_end_matches(['\n', '\r']);
        let mut fields = line.split_whitespace();
        match fields.next() {
            None => {}
            Some("exit" | "quit") => return repl.shutdown(),
            Some("help") => println!("{REPL_HELP}"),
            Some("ptr" | "pointer") => println!("ptr value: {}", repl.view.pointer()),
            Some("mem") => println!("{}", repl.view.render(format, 0)),
            Some("format") => {
                format = format.cycle();
                println!("cell format: {format:?}");
            }
            Some("clear") => print!("\x1b[2J\x1b[H"),
            Some("pause") => {
                repl.stepper.pause();
                println!("paused");
            }
            Some("resume") => repl.stepper.resume(),
            Some("step") => match fields.next().map_or(Ok(1), str::parse::<usize>) {
                Ok(count) => {
                    for _ in 0..count {
                        if !repl.stepper.step() {
                            println!("not paused");
                            break;
                        }
                    }
                }
                Err(_) => println!("invalid step count"),
            },
            Some("speed") => {
                if let Some(delta) = fields.next() {
                    match delta.parse::<i64>() {
                        Ok(delta) => repl.stepper.change_speed(delta),
                        Err(_) => println!("invalid speed change '{delta}'"),
                    }
                }
                println!("delay: {}ms", repl.stepper.delay().as_millis());
            }
            Some("cancel") => repl.stepper.cancel(),
            Some("open") => match fields.next() {
                None => println!("no file provided"),
                Some(path) => {
                    if let Ok(source) = read_source(path) {
                        repl.submit(source);
                    }
                }
            },
            Some(_) => {
                if let Err(e) = bfcc_lexer::validate(line) {
                    warn!(error = %e, "non-instruction characters are ignored");
                }
                repl.submit(line.to_owned());
            }
        }

        repl.settle()?;
    }
}

type Evaluation = JoinHandle<(Machine, Result<(), RuntimeError>)>;

/// A session that evaluates each submission on a worker thread, so the
/// prompt keeps accepting stepping commands while execution is paused.
struct Repl {
    /// The idle session. `None` while a submission is running.
    session: Option<Machine>,
    running: Option<Evaluation>,
    stepper: Stepper,
    view: TapeView,
}

impl Repl {
    fn new(session: Machine, stepper: Stepper) -> Self {
        Self {
            view: session.view(),
            session: Some(session),
            running: None,
            stepper,
        }
    }

    /// Start evaluating `text`, unless a submission is still running.
    fn submit(&mut self, text: String) {
        let Some(mut session) = self.session.take() else {
            println!("busy: use step, resume or cancel");
            return;
        };
        if self.stepper.is_cancelled() {
            self.stepper.reset();
        }
        debug!(bytes = text.len(), "submission started");
        self.running = Some(thread::spawn(move || {
            let result = session.evaluate(&text);
            let _ = io::stdout().flush();
            (session, result)
        }));
    }

    /// Collect the running submission if it is done or about to be.
    ///
    /// Blocks unless execution is paused.
    fn settle(&mut self) -> Result<(), i32> {
        let Some(job) = self.running.as_ref() else {
            return Ok(());
        };
        if self.stepper.is_running() || self.stepper.is_cancelled() || job.is_finished() {
            self.join()?;
        }
        Ok(())
    }

    fn join(&mut self) -> Result<(), i32> {
        let Some(job) = self.running.take() else {
            return Ok(());
        };
        match job.join() {
            Ok((session, result)) => {
                self.session = Some(session);
                if let Err(e) = result {
                    eprintln!("runtime error: {e}");
                }
                Ok(())
            }
            Err(_) => {
                eprintln!("error: evaluation thread panicked");
                Err(1)
            }
        }
    }

    /// Cancel a paused submission and wait for it before leaving.
    fn shutdown(mut self) -> Result<(), i32> {
        if self.running.is_some() && !self.stepper.is_running() {
            self.stepper.cancel();
        }
        self.join()
    }
}

fn read_source(path: &str) -> Result<String, i32> {
    fs::read_to_string(path).map_err(|e| {
        eprintln!("error: cannot read '{path}': {e}");
        1
    })
}

/// Parse a numeric `--flag N` from arguments.
fn parse_flag(args: &[String], flag: &str) -> Result<Option<usize>, i32> {
    let Some(i) = args.iter().position(|a| a == flag) else {
        return Ok(None);
    };
    let Some(value) = args.get(i + 1) else {
        eprintln!("error: {flag} requires a value");
        return Err(1);
    };
    value.parse().map(Some).map_err(|_| {
        eprintln!("error: invalid value '{value}' for {flag}");
        1
    })
}
