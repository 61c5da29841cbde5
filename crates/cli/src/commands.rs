use clap::{Args, Subcommand};

#[derive(Subcommand)]
pub enum Commands {
    /// Replace collections in the target database with copies from the source
    Copy(CopyArgs),

    /// Test a MongoDB connection string
    Ping {
        #[arg(long, help = "MongoDB connection string")]
        uri: String,

        #[arg(long, default_value_t = 1, help = "Connection attempts before giving up")]
        connect_attempts: u32,
    },
}

#[derive(Args, Debug, Clone)]
pub struct CopyArgs {
    #[arg(long, help = "Source MongoDB connection string")]
    pub source: String,

    #[arg(long, help = "Target MongoDB connection string")]
    pub target: String,

    #[arg(long, help = "Source database name")]
    pub source_db: String,

    #[arg(long, help = "Target database name (defaults to --source-db)")]
    pub target_db: Option<String>,

    #[arg(
        long,
        value_delimiter = ',',
        help = "Comma-separated collections to copy (defaults to all)"
    )]
    pub collections: Vec<String>,

    #[arg(long, short = 'y', help = "Skip the confirmation prompt")]
    pub yes: bool,

    #[arg(long, help = "Fixed page size; disables memory-based sizing")]
    pub page_size: Option<usize>,

    #[arg(long, help = "Load DOCCOPY_* settings from this .env file")]
    pub env_file: Option<String>,

    #[arg(long, help = "Write the run summary as JSON to this file")]
    pub report: Option<String>,

    #[arg(long, default_value_t = 3, help = "Connection attempts per store")]
    pub connect_attempts: u32,
}

impl CopyArgs {
    pub fn target_db(&self) -> &str {
        self.target_db.as_deref().unwrap_or(&self.source_db)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(subcommand)]
        command: Commands,
    }

    #[test]
    fn parses_copy_arguments() {
        let cli = TestCli::try_parse_from([
            "doccopy",
            "copy",
            "--source",
            "mongodb://a",
            "--target",
            "mongodb://b",
            "--source-db",
            "shop",
            "--collections",
            "users,orders",
            "--yes",
        ])
        .unwrap();

        let Commands::Copy(args) = cli.command else {
            panic!("expected copy");
        };
        assert_eq!(args.collections, vec!["users", "orders"]);
        assert_eq!(args.target_db(), "shop");
        assert!(args.yes);
        assert_eq!(args.connect_attempts, 3);
        assert_eq!(args.page_size, None);
    }

    #[test]
    fn requires_source_database() {
        let result = TestCli::try_parse_from([
            "doccopy",
            "copy",
            "--source",
            "mongodb://a",
            "--target",
            "mongodb://b",
        ]);
        assert!(result.is_err());
    }
}
