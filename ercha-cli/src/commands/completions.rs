//! Completions command implementation.

use clap::CommandFactory;
use clap_complete::{Shell, generate};

pub fn cmd_completions(shell: Shell) {
    let mut cmd = crate::Cli::command();
    generate(shell, &mut cmd, "ercha", &mut std::io::stdout());
}
