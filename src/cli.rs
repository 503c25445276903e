use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "emailenrich")]
#[command(about = "Best-guess person, organization and sector for email addresses from public web signals")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Create default configuration file at ./config/emailenrich.toml
    #[arg(long, global = true)]
    pub init: bool,

    /// Single email address to enrich
    #[arg(short, long)]
    pub email: Option<String>,

    /// Batch input: CSV with an "Email" column, or a JSON array of addresses
    #[arg(short, long, value_name = "FILE")]
    pub input_file: Option<PathBuf>,

    /// Output file for batch results (printed to stdout when omitted)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format: 'json' (default) or 'csv'
    #[arg(short = 'f', long, default_value = "json")]
    pub output_format: String,

    /// Show how the person name was derived instead of enriching
    #[arg(long, requires = "email")]
    pub explain_name: bool,

    /// Configuration file (defaults to ./config/emailenrich.toml, then the built-in template)
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Verbose logging (use -v for INFO, -vv for DEBUG)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Also append logs to this file
    #[arg(long, value_name = "FILE", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage the persistent domain-type and university caches
    Cache {
        #[command(subcommand)]
        action: CacheCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum CacheCommands {
    /// List all cached domains
    List,

    /// Show cached verdicts for a specific domain
    Show {
        /// Domain to show cache details for
        domain: String,
    },

    /// Clear cache for a specific domain or all domains
    Clear {
        /// Domain to clear cache for (omit to use --all)
        domain: Option<String>,

        /// Clear cache for all domains
        #[arg(long)]
        all: bool,
    },
}

impl Cli {
    pub fn validate(&self) -> Result<(), String> {
        if !self.init && self.command.is_none() {
            match (&self.email, &self.input_file) {
                (None, None) => return Err("An address is required (use --email or --input-file for batch mode)".to_string()),
                (Some(_), Some(_)) => return Err("Use either --email or --input-file, not both".to_string()),
                (Some(e), None) if e.trim().is_empty() => return Err("Email cannot be empty".to_string()),
                _ => {}
            }
        }

        if !["json", "csv"].contains(&self.output_format.as_str()) {
            return Err("Output format must be 'json' or 'csv'".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("emailenrich").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_single_email() {
        let cli = parse(&["--email", "john.doe@berkeley.edu", "-vv"]);
        assert_eq!(cli.email.as_deref(), Some("john.doe@berkeley.edu"));
        assert_eq!(cli.verbose, 2);
        assert!(cli.input_file.is_none());
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_batch_options() {
        let cli = parse(&["--input-file", "emails.csv", "--output", "out.csv", "--output-format", "csv"]);
        assert_eq!(cli.input_file, Some(PathBuf::from("emails.csv")));
        assert_eq!(cli.output, Some(PathBuf::from("out.csv")));
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_validation_errors() {
        assert!(parse(&[]).validate().is_err());
        assert!(parse(&["--email", "a@b.com", "--input-file", "x.csv"]).validate().is_err());
        assert!(parse(&["--email", "a@b.com", "-f", "xml"]).validate().is_err());
        assert!(parse(&["--init"]).validate().is_ok());
    }

    #[test]
    fn test_cache_subcommands() {
        let cli = parse(&["cache", "clear", "--all"]);
        assert!(cli.validate().is_ok());
        match cli.command {
            Some(Commands::Cache { action: CacheCommands::Clear { domain, all } }) => {
                assert!(domain.is_none());
                assert!(all);
            }
            other => panic!("unexpected command: {:?}", other),
        }

        let cli = parse(&["cache", "show", "mit.edu"]);
        assert!(matches!(cli.command, Some(Commands::Cache { action: CacheCommands::Show { .. } })));
    }

    #[test]
    fn test_explain_name_requires_email() {
        let result = Cli::try_parse_from(["emailenrich", "--explain-name"]);
        assert!(result.is_err());
    }
}
