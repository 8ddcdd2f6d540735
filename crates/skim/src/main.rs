use clap::Parser;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use skim::{Cell, Intern, Interpreter, SkimError};

#[derive(Parser)]
#[command(name = "skim", about = "Skim: an embeddable Scheme interpreter", version)]
struct Cli {
    /// File to execute
    file: Option<String>,

    /// Evaluate an expression and print the result
    #[arg(short, long)]
    eval: Option<String>,

    /// Load file(s) before executing
    #[arg(short, long = "load", action = clap::ArgAction::Append)]
    load: Vec<String>,

    /// Suppress the REPL banner
    #[arg(short, long)]
    quiet: bool,

    /// Enter the REPL after running a file or expression
    #[arg(short, long)]
    interactive: bool,
}

fn main() {
    let cli = Cli::parse();
    let interp = Interpreter::new();

    for path in &cli.load {
        if let Err(e) = run_file(&interp, path) {
            print_error(&e);
            std::process::exit(1);
        }
    }

    let mut ran = false;
    if let Some(expr) = &cli.eval {
        ran = true;
        match interp.eval_str(expr) {
            Ok(value) => {
                if !value.is_none() {
                    println!("{value}");
                }
            }
            Err(e) => {
                print_error(&e);
                std::process::exit(1);
            }
        }
    }

    if let Some(file) = &cli.file {
        ran = true;
        if let Err(e) = run_file(&interp, file) {
            print_error(&e);
            std::process::exit(1);
        }
    }

    if !ran || cli.interactive {
        repl(&interp, cli.quiet);
    }
}

fn run_file(interp: &Interpreter, path: &str) -> Result<(), SkimError> {
    let source =
        std::fs::read_to_string(path).map_err(|e| SkimError::Io(format!("{path}: {e}")))?;
    interp.eval_str(&source)?;
    Ok(())
}

fn print_error(e: &SkimError) {
    eprintln!("error: {e}");
}

/// The read→eval→write loop over the standard port pair.
fn repl(interp: &Interpreter, quiet: bool) {
    if !quiet {
        println!("skim {}", env!("CARGO_PKG_VERSION"));
        println!("enter (exit) to quit");
    }
    let mut editor = match DefaultEditor::new() {
        Ok(ed) => ed,
        Err(e) => {
            eprintln!("error: {e}");
            return;
        }
    };
    let mut buffer = String::new();
    loop {
        let prompt = if buffer.is_empty() { "> " } else { ".. " };
        match editor.readline(prompt) {
            Ok(line) => {
                buffer.push_str(&line);
                buffer.push('\n');
                if !balanced(&buffer) {
                    // keep collecting lines until the brackets close
                    continue;
                }
                let input = std::mem::take(&mut buffer);
                if input.trim().is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(input.trim());
                match interp.eval_str(&input) {
                    Ok(value) => {
                        if matches!(value, Cell::Intern(Intern::OpExit)) {
                            break;
                        }
                        if !value.is_none() {
                            println!("{value}");
                        }
                    }
                    Err(e) => print_error(&e),
                }
            }
            Err(ReadlineError::Interrupted) => {
                buffer.clear();
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("error: {e}");
                break;
            }
        }
    }
}

/// Are all brackets closed? Strings, comments and character literals are
/// skipped so their parentheses do not count.
fn balanced(src: &str) -> bool {
    let mut depth = 0i32;
    let mut chars = src.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            ';' => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        break;
                    }
                }
            }
            '"' => {
                while let Some(c) = chars.next() {
                    match c {
                        '\\' => {
                            chars.next();
                        }
                        '"' => break,
                        _ => {}
                    }
                }
            }
            '#' => {
                // #\( names a character, not a bracket
                if chars.peek() == Some(&'\\') {
                    chars.next();
                    if chars.next().is_some() {
                        while let Some(&c) = chars.peek() {
                            if c.is_alphanumeric() {
                                chars.next();
                            } else {
                                break;
                            }
                        }
                    }
                }
            }
            '(' => depth += 1,
            ')' => depth -= 1,
            _ => {}
        }
    }
    depth <= 0
}
