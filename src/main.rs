// lemur - A small expression language with a bytecode VM, written in Rust
// Copyright (c) 2025 Tom Waddington. MIT licensed.

use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::process;

use lemur_embed::Engine;

struct Options {
    /// Use the tree-walking evaluator instead of the VM.
    eval_mode: bool,
    /// Print the disassembly of each input before running it.
    dis: bool,
    files: Vec<String>,
}

fn main() {
    let mut options = Options {
        eval_mode: false,
        dis: false,
        files: Vec::new(),
    };

    for arg in env::args().skip(1) {
        match arg.as_str() {
            "--version" | "-v" => {
                println!("Lemur v0.1.0");
                return;
            }
            "--eval" => options.eval_mode = true,
            "--dis" => options.dis = true,
            "--help" | "-h" => {
                help();
                return;
            }
            other if other.starts_with('-') => {
                eprintln!("Unknown option: {}", other);
                help();
                process::exit(1);
            }
            file => options.files.push(file.to_string()),
        }
    }

    let mut engine = Engine::new();
    if options.files.is_empty() {
        run_repl(&mut engine, &options);
    } else {
        run_files(&mut engine, &options);
    }
}

fn help() {
    println!(
        r#"lemur - The Lemur programming language

USAGE:
    lemur [OPTIONS] [FILES...]

With no files, starts an interactive REPL.

OPTIONS:
    --eval          Run on the tree-walking evaluator instead of the VM
    --dis           Print the disassembly of each input before running it
    -v, --version   Print the version
    -h, --help      Show this message
"#
    );
}

/// Run a sequence of source files, stopping at the first error.
fn run_files(engine: &mut Engine, options: &Options) {
    for file in &options.files {
        if let Err(e) = run_file(engine, options, file) {
            eprintln!("{}", e);
            process::exit(1);
        }
    }
}

fn run_file(engine: &mut Engine, options: &Options, file: &str) -> Result<(), String> {
    let path = Path::new(file);
    match path.extension().and_then(|e| e.to_str()) {
        Some("lmr") => {}
        Some(ext) => {
            return Err(format!(
                "Error: unsupported file extension '.{}' for '{}'",
                ext, file
            ));
        }
        None => {
            return Err(format!(
                "Error: file '{}' has no extension (expected .lmr)",
                file
            ));
        }
    }

    let source =
        fs::read_to_string(path).map_err(|e| format!("Error reading '{}': {}", file, e))?;

    if options.dis {
        let text = engine
            .disassemble(&source)
            .map_err(|e| format!("Error in '{}': {}", file, e))?;
        print!("{}", text);
    }

    let result = if options.eval_mode {
        engine.eval(&source)
    } else {
        engine.run(&source)
    };
    result.map_err(|e| format!("Error in '{}': {}", file, e))?;

    Ok(())
}

/// Run the interactive REPL. Bindings persist across lines.
fn run_repl(engine: &mut Engine, options: &Options) {
    println!("Lemur v0.1.0");

    loop {
        print!("lemur> ");
        io::stdout().flush().unwrap();

        let mut input = String::new();
        match io::stdin().read_line(&mut input) {
            Ok(0) => {
                println!();
                break;
            }
            Ok(_) => {
                let input = input.trim();
                if input.is_empty() {
                    continue;
                }

                if options.dis {
                    match engine.disassemble(input) {
                        Ok(text) => print!("{}", text),
                        Err(e) => {
                            eprintln!("{}", e);
                            continue;
                        }
                    }
                }

                let result = if options.eval_mode {
                    engine.eval(input)
                } else {
                    engine.run(input)
                };
                match result {
                    Ok(value) => println!("{}", value),
                    Err(e) => eprintln!("{}", e),
                }
            }
            Err(e) => {
                eprintln!("Read error: {}", e);
                break;
            }
        }
    }
}
