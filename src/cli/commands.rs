//! CLI argument definitions using clap.
//!
//! dmdrip is a single-purpose tool, so there are no subcommands - just
//! the pacing knobs, the target, and the usual config/verbosity flags.
//! The bot token is deliberately not a flag; it comes from the
//! DISCORD_TOKEN environment variable or the config file.

use clap::Parser;
use std::path::PathBuf;

/// dmdrip - paced Discord DM delivery with exponential backoff
#[derive(Parser, Debug)]
#[command(name = "dmdrip")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Target user snowflake to DM
    #[arg(short, long)]
    pub user_id: Option<String>,

    /// Base delay between sends in milliseconds (minimum 50)
    #[arg(short, long)]
    pub base_delay_ms: Option<u64>,

    /// Stop after this many successful sends (0 = unlimited)
    #[arg(short = 'n', long)]
    pub max_count: Option<u64>,

    /// Message text; a " (#N)" sequence marker is appended per attempt
    #[arg(short, long)]
    pub message: Option<String>,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parse_no_args() {
        let cli = Cli::try_parse_from(["dmdrip"]).unwrap();
        assert!(!cli.verbose);
        assert!(cli.config.is_none());
        assert!(cli.user_id.is_none());
        assert!(cli.base_delay_ms.is_none());
        assert!(cli.max_count.is_none());
        assert!(cli.message.is_none());
    }

    #[test]
    fn test_cli_verbose_flag() {
        let cli = Cli::try_parse_from(["dmdrip", "-v"]).unwrap();
        assert!(cli.is_verbose());
    }

    #[test]
    fn test_cli_config_option() {
        let cli = Cli::try_parse_from(["dmdrip", "-c", "/path/to/dmdrip.yml"]).unwrap();
        assert_eq!(cli.config.as_ref(), Some(&PathBuf::from("/path/to/dmdrip.yml")));
    }

    #[test]
    fn test_user_id_flag() {
        let cli = Cli::try_parse_from(["dmdrip", "--user-id", "123456789012345678"]).unwrap();
        assert_eq!(cli.user_id.as_deref(), Some("123456789012345678"));
    }

    #[test]
    fn test_pacing_flags() {
        let cli =
            Cli::try_parse_from(["dmdrip", "-b", "500", "-n", "10", "-m", "hello there"]).unwrap();
        assert_eq!(cli.base_delay_ms, Some(500));
        assert_eq!(cli.max_count, Some(10));
        assert_eq!(cli.message.as_deref(), Some("hello there"));
    }

    #[test]
    fn test_max_count_zero_accepted() {
        let cli = Cli::try_parse_from(["dmdrip", "--max-count", "0"]).unwrap();
        assert_eq!(cli.max_count, Some(0));
    }

    #[test]
    fn test_help_works() {
        // Verify help doesn't panic
        Cli::command().debug_assert();
    }

    #[test]
    fn test_version_flag() {
        let result = Cli::try_parse_from(["dmdrip", "--version"]);
        // Version flag causes early exit with error (expected)
        assert!(result.is_err());
    }
}
