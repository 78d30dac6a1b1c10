use clap::Parser;
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use pagesim::{
    DEFAULT_OFFSET_BITS, DEFAULT_PHYSICAL_BITS, DEFAULT_VIRTUAL_BITS, MemoryConfig, SimError,
    Simulator,
};
use pagesim_cli::logger::StderrLogger;

#[derive(Parser)]
#[command(name = "vm-sim")]
#[command(about = "Demand-paging virtual memory simulator")]
struct Args {
    /// Reads the trace from the specified path
    #[arg(short, long, required_unless_present = "stdin", conflicts_with = "stdin")]
    input: Option<PathBuf>,

    /// Reads the trace from standard input
    #[arg(short, long)]
    stdin: bool,

    /// Only print the final statistics
    #[arg(short, long)]
    quiet: bool,

    /// Log to standard error; repeat for more detail
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Page offset width in bits
    #[arg(long, default_value_t = DEFAULT_OFFSET_BITS)]
    offset_bits: u32,

    /// Virtual address width in bits
    #[arg(long, default_value_t = DEFAULT_VIRTUAL_BITS)]
    virtual_bits: u32,

    /// Physical address width in bits
    #[arg(long, default_value_t = DEFAULT_PHYSICAL_BITS)]
    physical_bits: u32,

    /// Number of physical frames, overriding --physical-bits
    #[arg(long)]
    frames: Option<usize>,
}

impl Args {
    fn memory_config(&self) -> MemoryConfig {
        let config = MemoryConfig::new(self.offset_bits, self.virtual_bits, self.physical_bits);
        match self.frames {
            Some(frames) => config.with_frame_count(frames),
            None => config,
        }
    }
}

fn run(args: &Args) -> anyhow::Result<()> {
    let mut sim = Simulator::new(args.memory_config()).context("Invalid memory configuration")?;

    let stdout = io::stdout();
    let mut out = stdout.lock();

    let report = match &args.input {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Unable to open trace file {}", path.display()))?;
            pagesim_cli::run_trace(&mut sim, BufReader::new(file), &mut out, args.quiet)?
        }
        None => pagesim_cli::run_trace(&mut sim, io::stdin().lock(), &mut out, args.quiet)?,
    };

    writeln!(out, "{}", report)?;
    out.flush()?;
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(err) = StderrLogger::install(args.verbose) {
        eprintln!("warning: {}", err);
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) if err.downcast_ref::<SimError>() == Some(&SimError::OutOfMemory) => {
            println!("System ran out of memory");
            ExitCode::FAILURE
        }
        Err(err) => {
            eprintln!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}
