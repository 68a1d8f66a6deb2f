//! `gcmseal completions <shell>` prints a completion script to stdout.
//!
//! The shell name is parsed by clap (`clap_complete::Shell`), so an
//! unsupported shell is a usage error before anything runs.

use std::io::{self, Write};

use clap::CommandFactory;
use clap_complete::Shell;

use crate::cli::Cli;
use crate::errors::Result;

const BIN_NAME: &str = "gcmseal";

/// Execute the `completions` command.
pub fn execute(shell: Shell) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_completions(shell, &mut out);
    out.flush()?;
    Ok(())
}

/// Render the completion script for `shell` into `out`.
pub fn write_completions(shell: Shell, out: &mut dyn Write) {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, BIN_NAME, out);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script(shell: Shell) -> String {
        let mut buf = Vec::new();
        write_completions(shell, &mut buf);
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn bash_script_covers_top_level_commands() {
        let bash = script(Shell::Bash);
        for name in ["seal", "open", "derive", "hex", "key", "version", "completions"] {
            assert!(bash.contains(name), "bash completions missing `{name}`");
        }
    }

    #[test]
    fn nested_key_and_hex_actions_are_completed() {
        let zsh = script(Shell::Zsh);
        for name in ["create", "exists", "delete", "list", "encode", "decode"] {
            assert!(zsh.contains(name), "zsh completions missing `{name}`");
        }
    }

    #[test]
    fn secret_flags_are_completed() {
        let fish = script(Shell::Fish);
        assert!(fish.contains("passphrase"));
        assert!(fish.contains("salt"));
    }

    #[test]
    fn shell_argument_rejects_unknown_shell() {
        use clap::Parser;

        assert!(Cli::try_parse_from([BIN_NAME, "completions", "csh"]).is_err());
        let parsed = Cli::try_parse_from([BIN_NAME, "completions", "powershell"]).unwrap();
        assert!(matches!(
            parsed.command,
            crate::cli::Commands::Completions {
                shell: Shell::PowerShell
            }
        ));
    }
}
