mod actions;
mod browser;
mod config;
mod constants;
mod extract;
mod history;
mod markup;
mod matching;
mod models;
mod pagination;
mod report;
mod scrape;
mod urls;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Result, anyhow};
use browser::WebDriverBrowser;
use clap::{Parser, Subcommand};
use models::Config;
use scrape::{Scraper, SessionOutcome, run_session};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const EXIT_INTERRUPTED: u8 = 130;

#[derive(Parser)]
#[command(name = "jobscout")]
#[command(about = "Scrape company job boards and report postings matching your keywords")]
struct Cli {
    /// Path to the JSON config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape every configured company and write the report
    Run {
        /// HTML report path (also read as the previous run's history)
        #[arg(short, long, default_value = "job_matches.html")]
        output: PathBuf,

        /// Only scrape this company (case-insensitive)
        #[arg(long)]
        company: Option<String>,

        /// WebDriver endpoint
        #[arg(long, env = "JOBSCOUT_WEBDRIVER", default_value = "http://localhost:9515")]
        webdriver: String,

        /// Show the browser window
        #[arg(long)]
        headed: bool,
    },

    /// Manage universal keywords
    Keywords {
        #[command(subcommand)]
        command: KeywordCommands,
    },

    /// Manage companies
    Company {
        #[command(subcommand)]
        command: CompanyCommands,
    },

    /// Show the current configuration
    Show,
}

#[derive(Subcommand)]
enum KeywordCommands {
    /// Add keywords matched for every company
    Add {
        /// Comma-separated keywords
        keywords: String,
    },
}

#[derive(Subcommand)]
enum CompanyCommands {
    /// Add a company job board
    Add {
        /// Company name
        name: String,

        /// Job board URL
        url: String,

        /// Comma-separated company-specific keywords
        #[arg(short, long, default_value = "")]
        keywords: String,
    },

    /// List configured companies
    List,
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "jobscout=debug" } else { "jobscout=info" };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match execute(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn execute(cli: Cli) -> Result<ExitCode> {
    let config_path = cli.config.unwrap_or_else(config::default_path);
    let mut cfg = config::load(&config_path)?;

    match cli.command {
        Commands::Run {
            output,
            company,
            webdriver,
            headed,
        } => {
            if cfg.companies.is_empty() {
                return Err(anyhow!(
                    "No companies configured in {}. Use `jobscout company add` first.",
                    config_path.display()
                ));
            }
            if let Some(name) = company {
                config::select_company(&mut cfg, &name)?;
            }
            return run(&cfg, &output, &webdriver, !headed).await;
        }

        Commands::Keywords { command } => match command {
            KeywordCommands::Add { keywords } => {
                let parsed = config::parse_keywords(&keywords);
                if parsed.is_empty() {
                    return Err(anyhow!("No keywords given"));
                }
                let added = config::add_universal_keywords(&mut cfg, &parsed);
                config::save(&config_path, &cfg)?;
                if added.is_empty() {
                    println!("All keywords were already configured.");
                } else {
                    println!("Added universal keywords: {}", added.join(", "));
                }
            }
        },

        Commands::Company { command } => match command {
            CompanyCommands::Add { name, url, keywords } => {
                config::add_company(&mut cfg, &name, &url, config::parse_keywords(&keywords))?;
                config::save(&config_path, &cfg)?;
                println!("Added company '{}'.", name.trim());
            }

            CompanyCommands::List => {
                if cfg.companies.is_empty() {
                    println!("No companies configured.");
                } else {
                    println!("{:<25} {:<50}", "NAME", "JOB BOARD");
                    println!("{}", "-".repeat(76));
                    for company in &cfg.companies {
                        println!(
                            "{:<25} {:<50}",
                            truncate(&company.name, 23),
                            company.job_board_url.as_deref().unwrap_or("-")
                        );
                    }
                }
            }
        },

        Commands::Show => show_config(&cfg, &config_path),
    }

    Ok(ExitCode::SUCCESS)
}

async fn run(cfg: &Config, output: &std::path::Path, webdriver: &str, headless: bool) -> Result<ExitCode> {
    let scraper = Scraper::new(cfg);
    let browser = WebDriverBrowser::launch(webdriver, headless).await?;

    let interrupt = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    match run_session(&scraper, Box::new(browser), interrupt).await {
        SessionOutcome::Completed(matches) => {
            report::output_results(&matches, output)?;
            Ok(ExitCode::SUCCESS)
        }
        SessionOutcome::Interrupted => {
            println!("\nScraping interrupted by user.");
            Ok(ExitCode::from(EXIT_INTERRUPTED))
        }
    }
}

fn show_config(cfg: &Config, path: &std::path::Path) {
    println!("Config: {}", path.display());
    if cfg.universal_keywords.is_empty() {
        println!("Universal keywords: None");
    } else {
        println!("Universal keywords: {}", cfg.universal_keywords.join(", "));
    }

    if cfg.companies.is_empty() {
        println!("\nNo companies configured.");
        return;
    }
    println!("\nCompanies ({}):", cfg.companies.len());
    for company in &cfg.companies {
        println!("\n  {}", company.name);
        println!("    URL: {}", company.job_board_url.as_deref().unwrap_or("-"));
        if !company.keywords.is_empty() {
            println!("    Keywords: {}", company.keywords.join(", "));
        }
        if let Some(filters) = &company.location_filters {
            if !filters.include.is_empty() {
                println!("    Location include: {}", filters.include.join(", "));
            }
            if !filters.exclude.is_empty() {
                println!("    Location exclude: {}", filters.exclude.join(", "));
            }
        }
        if !company.pre_scrape_actions.is_empty() {
            println!("    Pre-scrape actions: {}", company.pre_scrape_actions.len());
        }
        if company.scraping_config.is_some() {
            println!("    Custom scraping config: yes");
        }
        if company.use_iframe {
            println!("    Iframe extraction: yes");
        }
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
