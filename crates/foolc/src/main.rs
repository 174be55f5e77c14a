// Copyright 2025 Diivanand Ramalingam
// Licensed under the Apache License, Version 2.0

use foolc::{compile_source, run_compiled, CompileConfig, CompileError};
use fool_runtime::{VmConfig, DEFAULT_MEMSIZE};
use std::{env, fs, io, path::PathBuf};
use tracing_subscriber::EnvFilter;

const USAGE: &str =
    "Usage: foolc <file.fool> [--emit-asm <path>] [--run] [--memsize <words>] [--max-steps <n>]";

fn main() {
    init_tracing();
    if let Err(e) = run() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("FOOLC_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

struct Args {
    input: PathBuf,
    emit_asm: Option<PathBuf>,
    run: bool,
    memsize: usize,
    max_steps: Option<u64>,
}

fn parse_args(mut it: impl Iterator<Item = String>) -> Result<Args, String> {
    let mut input = None;
    let mut emit_asm = None;
    let mut run = false;
    let mut memsize = DEFAULT_MEMSIZE;
    let mut max_steps = None;

    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--run" => run = true,
            "--emit-asm" => {
                let p = it.next().ok_or_else(|| format!("--emit-asm needs a path\n{USAGE}"))?;
                emit_asm = Some(PathBuf::from(p));
            }
            "--memsize" => {
                let n = it.next().ok_or_else(|| format!("--memsize needs a value\n{USAGE}"))?;
                memsize = n.parse().map_err(|e| format!("bad --memsize {n}: {e}"))?;
            }
            "--max-steps" => {
                let n = it.next().ok_or_else(|| format!("--max-steps needs a value\n{USAGE}"))?;
                max_steps = Some(n.parse().map_err(|e| format!("bad --max-steps {n}: {e}"))?);
            }
            flag if flag.starts_with("--") => return Err(format!("unknown option {flag}\n{USAGE}")),
            path => {
                if input.replace(PathBuf::from(path)).is_some() {
                    return Err(format!("only one input file is accepted\n{USAGE}"));
                }
            }
        }
    }

    Ok(Args {
        input: input.ok_or_else(|| USAGE.to_string())?,
        emit_asm,
        run,
        memsize,
        max_steps,
    })
}

fn run() -> Result<(), String> {
    let args = parse_args(env::args().skip(1))?;

    let src = fs::read_to_string(&args.input)
        .map_err(|e| format!("failed to read {}: {e}", args.input.display()))?;

    let config = CompileConfig {
        memsize: args.memsize,
    };
    let compiled = match compile_source(&src, &config) {
        Ok(c) => c,
        Err(CompileError::Diagnostics(diags)) => {
            for d in &diags {
                eprintln!("{d}");
            }
            return Err(format!("{} error(s) found", diags.len()));
        }
        Err(e) => return Err(format!("compilation failed: {e}")),
    };

    let asm_path = args
        .emit_asm
        .unwrap_or_else(|| args.input.with_extension("asm"));
    fs::write(&asm_path, compiled.code.asm())
        .map_err(|e| format!("failed to write {}: {e}", asm_path.display()))?;

    if !args.run {
        println!("Wrote {}", asm_path.display());
        return Ok(());
    }

    let vm = VmConfig {
        memsize: args.memsize,
        max_steps: args.max_steps,
    };
    let stdout = io::stdout();
    let outcome = run_compiled(&compiled, &vm, &mut stdout.lock())
        .map_err(|e| format!("runtime error: {e}"))?;
    tracing::debug!(top = ?outcome.top, steps = outcome.steps, "program finished");
    Ok(())
}
