//! Sharpier CLI - resolve and run the CSharpier version each project pins.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use sharpier_core::ProviderConfig;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "sharpier")]
#[command(about = "Format C# with the CSharpier version each project pins")]
struct Args {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Directory holding per-version tool installs
    #[arg(long, env = "SHARPIER_INSTALL_ROOT", global = true)]
    install_root: Option<PathBuf>,

    /// dotnet executable used to query and install the tool
    #[arg(long, env = "SHARPIER_DOTNET", global = true)]
    dotnet: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the csharpier version that applies to a directory
    Resolve {
        /// Directory to resolve from
        #[arg(default_value = ".")]
        dir: PathBuf,
    },
    /// Format C# files in place
    Format {
        /// Files to format
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Report files that would change instead of writing them
        #[arg(long)]
        check: bool,
    },
}

impl Args {
    fn provider_config(&self) -> ProviderConfig {
        let install_root = self
            .install_root
            .clone()
            .unwrap_or_else(ProviderConfig::default_install_root);
        let config = ProviderConfig::new(install_root);
        match &self.dotnet {
            Some(dotnet) => config.with_dotnet_executable(dotnet),
            None => config,
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    // Logs go to stderr; stdout carries command output.
    let log_level = if args.debug { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let config = args.provider_config();
    debug!("Install root: {}", config.install_root.display());

    match args.command {
        Command::Resolve { dir } => {
            let version = commands::resolve(&config, &dir).await?;
            println!("{}", version);
            Ok(ExitCode::SUCCESS)
        }
        Command::Format { files, check } => {
            let summary = commands::format(config, &files, check).await;
            for path in &summary.changed {
                if check {
                    println!("Would reformat {}", path.display());
                } else {
                    println!("Formatted {}", path.display());
                }
            }
            Ok(summary.exit_code(check))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_format_check() {
        let args =
            Args::try_parse_from(["sharpier", "format", "--check", "A.cs", "B.cs"]).unwrap();
        match args.command {
            Command::Format { files, check } => {
                assert!(check);
                assert_eq!(files, vec![PathBuf::from("A.cs"), PathBuf::from("B.cs")]);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_format_requires_files() {
        assert!(Args::try_parse_from(["sharpier", "format"]).is_err());
    }

    #[test]
    fn test_resolve_defaults_to_current_dir() {
        let args = Args::try_parse_from(["sharpier", "resolve"]).unwrap();
        match args.command {
            Command::Resolve { dir } => assert_eq!(dir, PathBuf::from(".")),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = Args::try_parse_from([
            "sharpier",
            "resolve",
            "--debug",
            "--install-root",
            "/opt/tools",
            "--dotnet",
            "/usr/bin/dotnet",
        ])
        .unwrap();
        assert!(args.debug);

        let config = args.provider_config();
        assert_eq!(config.install_root, PathBuf::from("/opt/tools"));
        assert_eq!(config.dotnet_executable, PathBuf::from("/usr/bin/dotnet"));
    }
}
