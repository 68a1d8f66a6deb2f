use clap::Parser;
use gcmseal::cli::{commands, Cli, Commands};

fn main() {
    gcmseal::logging::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Seal {
            ref input,
            ref secret,
        } => commands::seal::execute(input.as_deref(), secret),
        Commands::Open {
            ref envelope,
            ref secret,
            hex,
        } => commands::open::execute(envelope.as_deref(), secret, hex),
        Commands::Derive {
            ref salt,
            iterations,
        } => commands::derive::execute(salt.as_deref(), iterations),
        Commands::Hex { ref action } => commands::hex::execute(action),
        Commands::Key { ref action } => commands::key::execute(&cli, action),
        Commands::Version => commands::version::execute(),
        Commands::Completions { shell } => commands::completions::execute(shell),
    };

    if let Err(e) = result {
        gcmseal::cli::output::error(&e.to_string());
        std::process::exit(1);
    }
}
