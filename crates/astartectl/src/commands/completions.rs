use std::io;

use anyhow::Result;
use clap::CommandFactory;
use clap_complete::{
    generate,
    shells::{Bash, Fish, Zsh},
};

use super::Cli;

pub fn handle(shell: String) -> Result<()> {
    let mut cmd = Cli::command();
    match shell.as_str() {
        "bash" => generate(Bash, &mut cmd, "astartectl", &mut io::stdout()),
        "zsh" => generate(Zsh, &mut cmd, "astartectl", &mut io::stdout()),
        "fish" => generate(Fish, &mut cmd, "astartectl", &mut io::stdout()),
        other => eprintln!("Unsupported shell: {other}"),
    }
    Ok(())
}
