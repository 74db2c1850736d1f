// Reference host: runs expressions and files, or an interactive prompt.

mod config;

use std::fs;
use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use rill::internals::debug::{render_chunk, render_stack, render_value};
use rill::{Cell, Error, Interp, CHUNK_CELLS};

use config::Options;

fn main() -> ExitCode {
    let opts = Options::from_env();
    let mut interp = Interp::new();
    if let Err(e) = install_host_words(&mut interp) {
        eprintln!("error: {e}");
        return ExitCode::FAILURE;
    }
    let mut chunk = vec![Cell::default(); CHUNK_CELLS];

    let mut sources: Vec<(String, Vec<u8>)> = Vec::new();
    for (i, expr) in opts.eval.iter().enumerate() {
        sources.push((format!("eval:{}", i + 1), expr.clone().into_bytes()));
    }
    for path in &opts.files {
        match fs::read(path) {
            Ok(bytes) => sources.push((path.clone(), bytes)),
            Err(e) => {
                eprintln!("{path}: {e}");
                return ExitCode::FAILURE;
            }
        }
    }

    for (slot, (label, source)) in sources.iter().enumerate() {
        let r = if opts.dump {
            dump_source(&mut interp, source, &mut chunk)
        } else {
            run_source(&mut interp, slot, source, &mut chunk)
        };
        if let Err(e) = r {
            eprintln!("{label}: {e}");
            return ExitCode::FAILURE;
        }
    }

    if opts.interactive() {
        repl(&mut interp, &mut chunk);
    }
    ExitCode::SUCCESS
}

fn install_host_words(interp: &mut Interp) -> Result<(), Error> {
    interp.register("print", w_print)?;
    interp.register(".s", w_show_stack)
}

/// print ( v -- ) pop and print the top of the stack
fn w_print(interp: &mut Interp) -> Result<(), Error> {
    interp.stack().need(1)?;
    let v = interp.stack().get(-1)?;
    interp.stack_mut().pop(1)?;
    println!("{}", render_value(interp, v));
    Ok(())
}

/// .s ( -- ) print the whole stack without disturbing it
fn w_show_stack(interp: &mut Interp) -> Result<(), Error> {
    println!("{}", render_stack(interp));
    Ok(())
}

fn run_source(
    interp: &mut Interp,
    slot: usize,
    source: &[u8],
    chunk: &mut [Cell],
) -> Result<(), Error> {
    let n = interp.load(source, chunk)?;
    interp.run(slot, Some(&chunk[..n]))
}

fn dump_source(interp: &mut Interp, source: &[u8], chunk: &mut [Cell]) -> Result<(), Error> {
    let n = interp.load(source, chunk)?;
    print!("{}", render_chunk(interp, &chunk[..n]));
    Ok(())
}

/// Read-eval loop. Every line becomes its own program slot, so the slot
/// table caps the session length; errors reset the stack but keep
/// definitions, and the prompt carries on.
fn repl(interp: &mut Interp, chunk: &mut [Cell]) {
    let stdin = io::stdin();
    let mut slot = 0;
    prompt();
    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        if !line.trim().is_empty() {
            match run_source(interp, slot, line.as_bytes(), chunk) {
                Ok(()) => println!("{}", render_stack(interp)),
                Err(e) => println!("error: {e}"),
            }
            slot += 1;
        }
        prompt();
    }
}

fn prompt() {
    print!("> ");
    let _ = io::stdout().flush();
}
