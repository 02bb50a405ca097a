//! CLI arguments and command execution
//!
//! The command line is parsed once with clap and folded together with the
//! loaded [`Config`] into immutable [`ScanOptions`] and [`RenderOptions`].

use crate::auth::CredentialSource;
use crate::config::{Config, MetadataReset, ScanOptions};
use crate::error::Result;
use crate::explorer::Explorer;
use crate::filter::{parse_filters, NameFilter};
use crate::report::{render, ContentDump, RenderOptions, Rendered, StorageAccount};
use crate::storage::azure::AzureStorageClient;
use crate::storage::StorageClient;
use crate::utils::datetime::parse_iso_datetime;
use crate::utils::format::{DisplayUtils, OutputFormat};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "blobscout")]
#[command(about = "Shows containers and blobs of an Azure storage account")]
#[command(version, author)]
pub struct Cli {
    /// Name of the storage account
    #[arg(short = 'n', long = "accountName", env = "AZURE_STORAGE_ACCOUNT")]
    pub account_name: String,

    /// Shared access key for the storage account
    #[arg(
        short = 'k',
        long = "accessKey",
        env = "AZURE_STORAGE_KEY",
        hide_env_values = true
    )]
    pub access_key: Option<String>,

    /// Client id of a user-assigned managed identity (system-assigned when omitted)
    #[arg(short = 'i', long = "msi")]
    pub msi: Option<String>,

    /// Filter for container name (substring, case-sensitive)
    #[arg(short = 'c', long)]
    pub container: Option<String>,

    /// Filter for blob name (substring, case-sensitive)
    #[arg(short = 'b', long)]
    pub blob: Option<String>,

    /// Metadata filter in key:value format; repeat to match any of several
    #[arg(short = 'm', long = "metadata-filter")]
    pub metadata_filter: Vec<String>,

    /// Include blob content in the output
    #[arg(long)]
    pub show_content: bool,

    /// Write blob content to a file, one line per blob
    #[arg(long)]
    pub store_content: bool,

    /// Output file for --store-content
    #[arg(short = 'f', long)]
    pub filename: Option<PathBuf>,

    /// Print only blob content, suppressing everything else
    #[arg(long)]
    pub content_only: bool,

    /// Output format
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Maximum number of storage calls in flight
    #[arg(short = 'w', long)]
    pub workers: Option<usize>,

    /// Keep results in arrival order instead of sorting by name
    #[arg(long)]
    pub unsorted: bool,

    /// Metadata key to remove from blobs created after --reset-after
    #[arg(long, requires = "reset_after")]
    pub reset_key: Option<String>,

    /// Creation-time cut-off for --reset-key (RFC 3339 or YYYY-MM-DD)
    #[arg(long, requires = "reset_key")]
    pub reset_after: Option<String>,

    /// Disable coloured informational output
    #[arg(long)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

/// Report and its rendering for one run
#[derive(Debug)]
pub struct ScanOutcome {
    pub account: StorageAccount,
    pub rendered: Rendered,
}

impl Cli {
    /// Fold the command line and configuration into scan options
    pub fn scan_options(&self, config: &Config) -> Result<ScanOptions> {
        let mut options = ScanOptions {
            container_filter: NameFilter::new(self.container.clone()),
            blob_filter: NameFilter::new(self.blob.clone()),
            metadata_filters: parse_filters(&self.metadata_filter),
            download_content: self.show_content || self.store_content || self.content_only,
            max_concurrency: self.workers.unwrap_or(config.max_concurrency).max(1),
            sort_output: config.sort_output && !self.unsorted,
            reset: None,
        };

        if let (Some(key), Some(after)) = (&self.reset_key, &self.reset_after) {
            options.reset = Some(MetadataReset {
                key: key.clone(),
                created_after: parse_iso_datetime(after)?,
            });
        }

        Ok(options)
    }

    pub fn render_options(&self, config: &Config) -> RenderOptions {
        RenderOptions {
            show_content: self.show_content && !self.content_only,
            content_only: self.content_only,
            no_color: self.no_color || config.no_color,
        }
    }

    pub fn output_format(&self, config: &Config) -> OutputFormat {
        self.format.clone().unwrap_or_else(|| config.output_format.clone())
    }

    pub fn content_file(&self, config: &Config) -> PathBuf {
        self.filename
            .clone()
            .unwrap_or_else(|| config.content_file.clone())
    }

    /// Authenticate, explore the account and print the result
    pub async fn execute(self, config: Config) -> Result<()> {
        let display = DisplayUtils::new(self.no_color || config.no_color);
        if self.content_only && self.show_content {
            display.print_warning("--content-only overrides --show-content");
        }

        let credentials = CredentialSource::from_args(self.access_key.clone(), self.msi.clone())?
            .storage_credentials(&self.account_name)
            .await?;
        let client: Arc<dyn StorageClient> = Arc::new(AzureStorageClient::new(
            self.account_name.clone(),
            credentials,
        ));

        let outcome = self.run_scan(client, &config).await?;

        if !outcome.rendered.body.is_empty() {
            println!("{}", outcome.rendered.body);
        }
        for notice in &outcome.rendered.notices {
            display.print_notice(notice);
        }

        Ok(())
    }

    /// Explore the account behind `client` and render the report
    pub async fn run_scan(
        &self,
        client: Arc<dyn StorageClient>,
        config: &Config,
    ) -> Result<ScanOutcome> {
        let options = self.scan_options(config)?;
        let format = self.output_format(config);

        let dump = if self.store_content {
            Some(ContentDump::create(self.content_file(config)).await?)
        } else {
            None
        };

        let explorer = Explorer::new(client, options);
        let account = explorer.run().await?;

        if let Some(dump) = dump {
            let lines = dump.write_report(&account).await?;
            info!("Stored content of {} blobs", lines);
        }

        if account.containers.is_empty() {
            warn!("No container matched the container filter");
        }

        let rendered = render(
            &account,
            &format,
            self.render_options(config),
            explorer.options().container_filter.pattern(),
        )?;

        Ok(ScanOutcome { account, rendered })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Filter;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["blobscout", "-n", "acct"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_flags_map_to_scan_options() {
        let cli = parse(&["-c", "prod", "-b", ".log", "-m", "team:inf", "-m", "bogus", "-w", "4"]);
        let options = cli.scan_options(&Config::default()).unwrap();

        assert_eq!(options.container_filter.pattern(), Some("prod"));
        assert_eq!(options.blob_filter.pattern(), Some(".log"));
        assert_eq!(options.metadata_filters, vec![Filter::new("team", "inf")]);
        assert_eq!(options.max_concurrency, 4);
        assert!(!options.download_content);
        assert!(options.sort_output);
    }

    #[test]
    fn test_content_flags_imply_download() {
        for flag in ["--show-content", "--store-content", "--content-only"] {
            let options = parse(&[flag]).scan_options(&Config::default()).unwrap();
            assert!(options.download_content, "{flag} should download content");
        }
    }

    #[test]
    fn test_content_only_overrides_show_content() {
        let cli = parse(&["--show-content", "--content-only"]);
        let render = cli.render_options(&Config::default());
        assert!(render.content_only);
        assert!(!render.show_content);
    }

    #[test]
    fn test_defaults_come_from_config() {
        let config = Config {
            max_concurrency: 3,
            output_format: OutputFormat::Yaml,
            content_file: PathBuf::from("dump.txt"),
            sort_output: false,
            ..Config::default()
        };
        let cli = parse(&[]);
        let options = cli.scan_options(&config).unwrap();

        assert_eq!(options.max_concurrency, 3);
        assert!(!options.sort_output);
        assert_eq!(cli.output_format(&config), OutputFormat::Yaml);
        assert_eq!(cli.content_file(&config), PathBuf::from("dump.txt"));
        assert_eq!(parse(&["-f", "x.txt"]).content_file(&config), PathBuf::from("x.txt"));
    }

    #[test]
    fn test_reset_flags_require_each_other() {
        assert!(Cli::try_parse_from(["blobscout", "-n", "a", "--reset-key", "processed"]).is_err());

        let cli = parse(&["--reset-key", "processed", "--reset-after", "2021-03-09"]);
        let reset = cli.scan_options(&Config::default()).unwrap().reset.unwrap();
        assert_eq!(reset.key, "processed");
    }

    #[test]
    fn test_invalid_reset_date_is_rejected() {
        let cli = parse(&["--reset-key", "processed", "--reset-after", "soon"]);
        assert!(cli.scan_options(&Config::default()).is_err());
    }
}
