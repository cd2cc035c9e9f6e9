use std::path::PathBuf;

use clap::Parser;

use crate::fields::{Filter, Priority, Status};

/// Terminal client for a TaskFlow task service.
/// Settings come from the config file, then TASKFLOW_API_URL, then these flags.
#[derive(Parser, Debug, Default)]
#[command(name = "taskflow", version, about = "Terminal task board for a TaskFlow service")]
pub struct Cli {
    /// Config file to read instead of the default location.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Base URL of the TaskFlow service.
    #[arg(long, value_name = "URL")]
    pub api_url: Option<String>,

    /// Tasks requested per list load (1-500).
    #[arg(long, value_name = "N")]
    pub page_size: Option<u64>,

    /// Where to write the log file.
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Status filter to start with.
    #[arg(long, value_enum)]
    pub status: Option<Status>,

    /// Priority filter to start with.
    #[arg(long, value_enum)]
    pub priority: Option<Priority>,

    /// Raise log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn status_filter(&self) -> Filter<Status> {
        self.status.into()
    }

    pub fn priority_filter(&self) -> Filter<Priority> {
        self.priority.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_launch_options() {
        let cli = Cli::try_parse_from([
            "taskflow",
            "--api-url",
            "http://tasks.local:9000",
            "--status",
            "in-progress",
            "--priority",
            "high",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.api_url.as_deref(), Some("http://tasks.local:9000"));
        assert_eq!(cli.status_filter(), Filter::Only(Status::InProgress));
        assert_eq!(cli.priority_filter(), Filter::Only(Priority::High));
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn unknown_is_not_a_valid_filter() {
        assert!(Cli::try_parse_from(["taskflow", "--status", "unknown"]).is_err());
    }

    #[test]
    fn no_flags_means_no_filters() {
        let cli = Cli::try_parse_from(["taskflow"]).unwrap();
        assert_eq!(cli.status_filter(), Filter::All);
        assert_eq!(cli.priority_filter(), Filter::All);
    }
}
