//! `tlc` CLI: compile a single `.c` source file to a `.s` gas-assembly file.

use std::fs;
use std::path::PathBuf;
use std::process;

use clap::Parser as ClapParser;

use tlc::config::CompilerConfig;
use tlc::target::Platform;

#[derive(ClapParser)]
#[command(name = "tlc")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Whole-program compiler emitting gas-syntax x86-64/ARM64 assembly", long_about = None)]
struct Cli {
    /// Input source file
    input: PathBuf,

    /// Target platform: linux, cygwin, mac, raspi, amac
    #[arg(long, default_value = "linux")]
    target: String,

    /// Verbose diagnostics
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let Some(target) = Platform::parse(&cli.target) else {
        eprintln!(
            "tlc: unknown target `{}` (expected linux, cygwin, mac, raspi, or amac)",
            cli.target
        );
        process::exit(1);
    };

    let src = match fs::read_to_string(&cli.input) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("tlc: cannot read {}: {e}", cli.input.display());
            process::exit(1);
        }
    };

    // The output file is derived from the input's basename, written to the
    // current directory, not alongside the input: `tlc sub/foo.c` emits
    // `./foo.s`, not `sub/foo.s`.
    let output = match tlc::output_path(&cli.input) {
        Some(p) => p,
        None => {
            eprintln!("tlc: illegal suffix");
            process::exit(1);
        }
    };

    let config = CompilerConfig::new(target).with_verbose(cli.verbose);
    let asm = match tlc::compile(&src, &config) {
        Ok(asm) => asm,
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    };

    if let Err(e) = fs::write(&output, asm) {
        eprintln!("tlc: cannot write {}: {e}", output.display());
        process::exit(1);
    }
    if cli.verbose {
        tracing::info!(path = %output.display(), "wrote assembly");
    }
}
