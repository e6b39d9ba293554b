use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about = "osu! skill check: current form against peak form")]
pub struct Cli {
    /// Command
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
#[clap(rename_all = "lower_case")]
pub enum Command {
    /// Analyse a player and print the result as JSON
    Analyze {
        /// osu! username
        username: String,
        /// Ignore a recently stored analysis and recompute
        #[arg(short, long)]
        force: bool,
    },
    /// Start the JSON API server
    Serve {
        /// Port number (optional, defaults to 3000)
        #[arg(short, long, default_value_t = 3000)]
        port: u16,
    },
    /// Print the stored leaderboard
    Leaderboard {
        /// Maximum number of rows
        #[arg(short, long, default_value_t = 50)]
        limit: usize,
        /// Only show one verdict (e.g. rusty, slightly_rusty)
        #[arg(short, long)]
        verdict: Option<String>,
        /// Only show players whose name contains this text
        #[arg(short, long)]
        search: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_analyze_with_force() {
        let cli = Cli::try_parse_from(["skillcheck", "analyze", "mrekk", "--force"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Analyze {
                username: "mrekk".to_string(),
                force: true
            }
        );
    }

    #[test]
    fn test_parse_leaderboard_defaults() {
        let cli = Cli::try_parse_from(["skillcheck", "leaderboard"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Leaderboard {
                limit: 50,
                verdict: None,
                search: None
            }
        );
    }

    #[test]
    fn test_parse_leaderboard_search() {
        let cli = Cli::try_parse_from(["skillcheck", "leaderboard", "-s", "cat", "-l", "5"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Leaderboard {
                limit: 5,
                verdict: None,
                search: Some("cat".to_string())
            }
        );
    }
}
