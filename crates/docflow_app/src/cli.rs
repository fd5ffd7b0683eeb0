use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about = "Submit documents for processing and follow the job", long_about = None)]
pub struct Cli {
    /// RON config file (defaults to ./docflow.ron when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Base URL of the processing service
    #[arg(long, global = true)]
    pub server: Option<String>,
    #[arg(long, global = true)]
    pub poll_interval_ms: Option<u64>,
    /// Where downloaded archives are saved
    #[arg(long, global = true)]
    pub output_dir: Option<PathBuf>,
    /// Raise log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Upload a file and follow the job until it finishes
    Submit {
        file: PathBuf,
        #[arg(long)]
        strategy: Option<String>,
        #[arg(long)]
        model: Option<String>,
        #[arg(long)]
        infer_tables: Option<bool>,
        #[arg(long)]
        extract_images: Option<bool>,
        /// Save the result archive once the job completes
        #[arg(long)]
        download: bool,
    },
    /// List previously processed documents
    History,
    /// Save an archive from the server by name
    Download { name: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submit_flags_parse() {
        let cli = Cli::try_parse_from([
            "docflow",
            "-v",
            "--server",
            "http://10.0.0.2:5000",
            "submit",
            "report.pdf",
            "--strategy",
            "fast",
            "--infer-tables",
            "false",
            "--download",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 1);
        assert_eq!(cli.server.as_deref(), Some("http://10.0.0.2:5000"));
        match cli.command {
            Command::Submit {
                file,
                strategy,
                infer_tables,
                extract_images,
                download,
                ..
            } => {
                assert_eq!(file, PathBuf::from("report.pdf"));
                assert_eq!(strategy.as_deref(), Some("fast"));
                assert_eq!(infer_tables, Some(false));
                assert_eq!(extract_images, None);
                assert!(download);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
