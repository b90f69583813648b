use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{error::ErrorKind, Parser};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use ls8::{Error, Processor, ProgramLoader};

/// Run an LS-8 program written as one binary instruction word per line.
#[derive(Parser)]
#[command(version)]
struct Args {
    /// `.ls8` program file to run
    path: PathBuf,
    /// Produce minimal output, suited for blackbox tests
    #[arg(short, long)]
    minimal: bool,
    /// Log machine state before every instruction
    #[arg(short, long)]
    trace: bool,
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => {
            let reason = e.kind().as_str().unwrap_or("invalid arguments").to_string();
            return report(Error::Invocation { reason }, false);
        }
    };
    ls8::env::init();
    init_logging(args.trace || ls8::env::is_trace_enabled(), args.minimal);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => report(e, args.minimal),
    }
}

fn run(args: &Args) -> Result<(), Error> {
    let status = Status {
        minimal: args.minimal,
    };

    status.file_message(MsgColor::Green, "Loading", &args.path);
    let program = ProgramLoader::from_path(&args.path)?;
    let mut cpu = Processor::new();
    cpu.load(&program)?;

    status.message(MsgColor::Green, "Running", &format!("{} words", program.len()));
    cpu.run()?;

    status.file_message(MsgColor::Cyan, "Halted", &args.path);
    Ok(())
}

/// Print a diagnostic for `err` and turn it into the process exit status.
fn report(err: Error, minimal: bool) -> ExitCode {
    let code = err.exit_code();
    // A hook may already be installed if this is a second report
    let _ = miette::set_hook(Box::new(move |_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .context_lines(ls8::DIAGNOSTIC_CONTEXT_LINES)
                .color(!minimal)
                .build(),
        )
    }));
    eprintln!("{:?}", miette::Report::new(err));
    ExitCode::from(code)
}

/// Logs go to stderr so that stdout only carries program output.
fn init_logging(trace: bool, minimal: bool) {
    let mut directives = ls8::env::log_filter().unwrap_or_else(|| "warn".to_string());
    if trace {
        directives.push_str(",ls8=trace");
    }
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(directives))
        .with_writer(std::io::stderr)
        .with_ansi(!minimal)
        .without_time()
        .init();
}

enum MsgColor {
    Green,
    Cyan,
}

/// Human-facing progress lines, silenced by `--minimal`.
struct Status {
    minimal: bool,
}

impl Status {
    fn file_message(&self, color: MsgColor, left: &str, right: &Path) {
        let right = format!("target {}", right.display());
        self.message(color, left, &right);
    }

    fn message(&self, color: MsgColor, left: &str, right: &str) {
        if self.minimal {
            return;
        }
        let left = match color {
            MsgColor::Green => left.green(),
            MsgColor::Cyan => left.cyan(),
        };
        eprintln!("{left:>12} {right}");
    }
}
