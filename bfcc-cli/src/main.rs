//! bfcc CLI — run programs, list tokens, or start an interactive session.
//!
//! Exit codes:
//! - 0: Success
//! - 1: Usage or input error
//! - 3: Runtime error

mod commands;
mod logging;

use std::process;

fn main() {
    logging::init_logging();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let result = match args[1].as_str() {
        "run" => commands::run(&args[2..]),
        "tokens" => commands::tokens(&args[2..]),
        "repl" => commands::repl(&args[2..]),
        "--help" | "-h" | "help" => {
            print_usage();
            process::exit(0);
        }
        other => {
            eprintln!("error: unknown command '{other}'");
            eprintln!();
            print_usage();
            process::exit(1);
        }
    };

    if let Err(code) = result {
        process::exit(code);
    }
}

fn print_usage() {
    eprintln!("Usage: bfcc <command> [args]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  run <input.bf> [--tape-size N] [--delay-ms N]   Execute a program");
    eprintln!("  tokens <input.bf>                               List collapsed tokens");
    eprintln!("  repl [--tape-size N]                            Interactive session");
    eprintln!();
    eprintln!("Set RUST_LOG (e.g. RUST_LOG=bfcc_vm=debug) for execution logs.");
}
