use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::process;

use functest::{load_cases, run_all, RunOptions};

#[derive(Parser)]
#[command(name = "functest")]
#[command(about = "Functional test runner for command-line tools", long_about = None)]
struct Cli {
    /// One or more YAML files containing test definitions
    #[arg(long = "tests", required = true, num_args = 1.., value_name = "FILE")]
    tests: Vec<PathBuf>,

    /// Executable substituted for the {command} placeholder in test commands
    #[arg(long, value_name = "EXE")]
    command: Option<String>,

    /// Directory the command's executable must reside under (arms the gate)
    #[arg(long, value_name = "DIR")]
    check_on_path: Option<PathBuf>,

    /// Suppress output for passing tests
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let entries = load_cases(&cli.tests)?;

    let options = RunOptions {
        command: cli.command,
        check_path: cli.check_on_path,
        quiet: cli.quiet,
    };

    let summary = run_all(&entries, &options);
    process::exit(summary.exit_code());
}
