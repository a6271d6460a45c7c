use std::{path::PathBuf, process::ExitCode, time::Instant};

use clap::Parser;
use frontend::{
    compilation::{Compilation, CompilerOptions},
    display_error,
    errors::errors::Error,
    loader::FileLoader,
};
use tracing_subscriber::{fmt, EnvFilter};

/// Checks a program and reports its diagnostics.
#[derive(Parser, Debug)]
#[command(name = "frontend", about = "Front end for .lang programs", long_about = None)]
struct Cli {
    /// Root module of the program
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Function execution starts at
    #[arg(long, value_name = "NAME", default_value = "main")]
    entry: String,

    /// Log every phase with its timing
    #[arg(long)]
    trace: bool,

    /// Print the analyzed tree of every module
    #[arg(long)]
    dump_ast: bool,
}

fn init_logging(trace: bool) {
    let directive = if trace { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));
    let _ = fmt::fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init();
}

fn print_error(compilation: &Compilation, error: &Error) {
    let path = error.get_position().1.as_str();
    let source = compilation.context.source_of(path).unwrap_or("");
    eprint!("{}", display_error(error, source));
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.trace);

    let directory = match cli.file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let root = match cli.file.file_stem() {
        Some(stem) => stem.to_string_lossy().to_string(),
        None => {
            eprintln!("Error: `{}` does not name a file", cli.file.display());
            return ExitCode::FAILURE;
        }
    };

    let options = CompilerOptions {
        entry_symbol: cli.entry,
        trace: cli.trace,
        dump_ast: cli.dump_ast,
    };
    let mut compilation = Compilation::new(options, Box::new(FileLoader::new(directory)));

    let start = Instant::now();
    let result = compilation.compile(&root);
    tracing::info!(target: "pipeline", stage = "total", elapsed_ms = start.elapsed().as_millis() as u64);

    for error in compilation.diagnostics().iter() {
        print_error(&compilation, error);
    }

    if compilation.context.options.dump_ast {
        for index in 0..compilation.context.modules.len() {
            let module = frontend::context::ModuleId(index as u32);
            println!("{}", compilation.dump(module));
        }
    }

    match result {
        Err(fatal) => {
            print_error(&compilation, &fatal);
            ExitCode::FAILURE
        }
        Ok(_) if compilation.diagnostics().has_errors() => {
            eprintln!("{} error(s) reported", compilation.diagnostics().error_count());
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
    }
}
