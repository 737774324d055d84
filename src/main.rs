use chrono::{Datelike, Local, Utc};
use clap::{Parser, Subcommand};
use newsstand::clicks::ClickTable;
use newsstand::config::{self, SiteConfig};
use newsstand::notify::{self, OutboxMailer};
use newsstand::reconcile::{self, LocalSources};
use newsstand::subscribers::SubscriberTable;
use newsstand::types::Catalog;
use newsstand::{generate, output};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

const CATALOG_FILENAME: &str = "issues.json";

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "newsstand")]
#[command(about = "Static archive generator for school newspapers")]
#[command(long_about = "\
Static archive generator for school newspapers

Issues are PDFs, covers are images, and a metadata sheet ties them together.
Files are matched to sheet rows by name: the row titled newspaper-issue-4
picks up newspaper-issue-4.pdf and newspaper-issue-4.jpg.

Content structure:

  content/
  ├── config.toml                  # Site config (optional)
  ├── issues.toml                  # Metadata sheet
  ├── pdfs/
  │   ├── newspaper-issue-1.pdf
  │   └── newspaper-issue-2.pdf
  └── images/
      ├── newspaper-issue-1.jpg    # Cover (optional, any image extension)
      └── newspaper-issue-2.png

Sheet columns (first row is the header):
  title | description | date | category | featured

Rows without a matching PDF are left out. An empty category becomes the
default category; featured is set only by the exact text TRUE.

Run 'newsstand gen-config' to generate a documented config.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Content directory
    #[arg(long, default_value = "content", global = true)]
    source: PathBuf,

    /// Output directory
    #[arg(long, default_value = "dist", global = true)]
    output: PathBuf,

    /// Directory for the catalog and side tables (subscribers, clicks)
    #[arg(long, default_value = ".newsstand-temp", global = true)]
    temp_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Reconcile the sheet with the PDF and image folders into issues.json
    Catalog,
    /// Produce the static site from issues.json
    Generate,
    /// Run the full pipeline: catalog → generate
    Build,
    /// Validate the content directory without building
    Check,
    /// Print a stock config.toml with all options documented
    GenConfig,
    /// Add an email address to the mailing list
    Subscribe { email: String },
    /// Remove an email address from the mailing list
    Unsubscribe { email: String },
    /// List mailing-list subscribers
    Subscribers,
    /// Record a click on an issue, by title
    Click { title: String },
    /// Show click counts per issue
    Clicks,
    /// Email subscribers about the latest issue if it has not been announced
    Notify {
        /// Send even if the latest issue was already announced
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "newsstand=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let catalog_path = cli.temp_dir.join(CATALOG_FILENAME);

    match cli.command {
        Command::Catalog => {
            let config = config::load_config(&cli.source)?;
            let catalog = run_catalog(&cli.source, &cli.temp_dir, &config)?;
            output::print_catalog_output(&catalog);
        }
        Command::Generate => {
            let config = config::load_config(&cli.source)?;
            let report = generate::generate(
                &catalog_path,
                &cli.source,
                &cli.output,
                &config,
                Local::now().naive_local(),
            )?;
            output::print_generate_output(&report);
        }
        Command::Build => {
            let config = config::load_config(&cli.source)?;

            println!("==> Stage 1: Cataloguing {}", cli.source.display());
            let catalog = run_catalog(&cli.source, &cli.temp_dir, &config)?;
            output::print_catalog_output(&catalog);

            println!("==> Stage 2: Generating HTML \u{2192} {}", cli.output.display());
            let report = generate::generate(
                &catalog_path,
                &cli.source,
                &cli.output,
                &config,
                Local::now().naive_local(),
            )?;
            output::print_generate_output(&report);

            println!("==> Build complete: {}", cli.output.display());
        }
        Command::Check => {
            println!("==> Checking {}", cli.source.display());
            let config = config::load_config(&cli.source)?;
            let sources = LocalSources::new(&cli.source, &config.sources);
            let catalog = reconcile::try_build_catalog(sources.as_sources(), &config)?;
            output::print_catalog_output(&catalog);
            output::print_check_warnings(&catalog);
            println!("==> Content is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
        Command::Subscribe { email } => {
            let outcome = SubscriberTable::in_dir(&cli.temp_dir).subscribe(&email, Utc::now());
            println!("{}", output::format_outcome(&outcome));
            if !outcome.success {
                std::process::exit(1);
            }
        }
        Command::Unsubscribe { email } => {
            let outcome = SubscriberTable::in_dir(&cli.temp_dir).unsubscribe(&email);
            println!("{}", output::format_outcome(&outcome));
            if !outcome.success {
                std::process::exit(1);
            }
        }
        Command::Subscribers => {
            let list = SubscriberTable::in_dir(&cli.temp_dir).list()?;
            output::print_subscribers(&list);
        }
        Command::Click { title } => {
            if !ClickTable::in_dir(&cli.temp_dir).record_click_for_title(&title) {
                eprintln!("Click not recorded for {title}");
                std::process::exit(1);
            }
        }
        Command::Clicks => {
            output::print_analytics(&ClickTable::in_dir(&cli.temp_dir).analytics());
        }
        Command::Notify { force } => {
            let config = config::load_config(&cli.source)?;
            let catalog: Catalog = serde_json::from_str(&std::fs::read_to_string(&catalog_path)?)?;
            let recipients = SubscriberTable::in_dir(&cli.temp_dir).list()?;
            let mut mailer = OutboxMailer::new(cli.temp_dir.join(&config.notify.outbox));
            let outcome = notify::notify(
                &catalog,
                &config,
                &recipients,
                &mut mailer,
                &cli.temp_dir,
                Local::now().year(),
                force,
            )?;
            output::print_notify_outcome(&outcome);
        }
    }

    Ok(())
}

/// Build the catalog from local sources and write it to the temp dir.
fn run_catalog(
    source: &Path,
    temp_dir: &Path,
    config: &SiteConfig,
) -> Result<Catalog, Box<dyn std::error::Error>> {
    let sources = LocalSources::new(source, &config.sources);
    let catalog = reconcile::build_catalog(sources.as_sources(), config);
    std::fs::create_dir_all(temp_dir)?;
    let json = serde_json::to_string_pretty(&catalog)?;
    std::fs::write(temp_dir.join(CATALOG_FILENAME), json)?;
    Ok(catalog)
}
