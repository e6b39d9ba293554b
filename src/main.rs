use anyhow::Result;

use skillcheck::cli::Command;
use skillcheck::{handle_analyze, handle_leaderboard, handle_serve, interpret};

fn main() {
    setup_logging();
    parse_and_execute().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(1);
    });
}

fn setup_logging() {
    sensible_env_logger::init!();
}

fn parse_and_execute() -> Result<()> {
    let command = interpret();
    execute_command(&command)
}

fn execute_command(command: &Command) -> Result<()> {
    match command {
        Command::Analyze { username, force } => handle_analyze(username, *force),
        Command::Serve { port } => handle_serve(*port),
        Command::Leaderboard { limit, verdict, search } => {
            handle_leaderboard(*limit, verdict.as_deref(), search.as_deref())
        }
    }
}
