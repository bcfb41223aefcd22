mod output;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use goodshelf_lib::listing::DEFAULT_BASE_URL;
use goodshelf_lib::{
    paginate, validation, HarvestConfig, HarvestOutcome, Harvester, HttpRenderer, PageEstimate,
    ShelfListing, StopReason,
};
use indicatif::{ProgressBar, ProgressStyle};

#[derive(Parser)]
#[command(name = "goodshelf")]
#[command(about = "Harvest a user's \"read\" shelf into JSON and CSV exports")]
struct Cli {
    /// Profile id of the shelf owner (e.g. 171519754-trevor-redmond)
    user_id: String,

    /// Base listing URL (falls back to GOODSHELF_BASE_URL, then production)
    #[arg(long)]
    base_url: Option<String>,

    /// Cookie header value for the authenticated session
    /// (falls back to GOODSHELF_COOKIE)
    #[arg(long)]
    cookie: Option<String>,

    /// JSON export path
    #[arg(long, default_value = "goodreads_books.json")]
    json_out: PathBuf,

    /// CSV export path
    #[arg(long, default_value = "goodreads_books.csv")]
    csv_out: PathBuf,

    /// Pause between page fetches, in milliseconds
    #[arg(long, default_value = "1500")]
    delay_ms: u64,

    /// Page ceiling for this run (1-50)
    #[arg(long, default_value = "50")]
    max_pages: u32,

    /// Wait for Enter before scraping (log in through your browser first)
    #[arg(long)]
    wait_for_login: bool,

    /// Print a summary table of the harvested records
    #[arg(long)]
    preview: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("goodshelf=info".parse().unwrap()),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let user_id = validation::validate_user_id(&cli.user_id)?;
    let max_pages = validation::validate_max_pages(cli.max_pages)?;

    let base_url = cli
        .base_url
        .or_else(|| std::env::var("GOODSHELF_BASE_URL").ok())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    let cookie = cli.cookie.or_else(|| std::env::var("GOODSHELF_COOKIE").ok());
    if cookie.is_none() {
        tracing::warn!("no session cookie configured; a private shelf will come back empty");
    }

    let listing = ShelfListing::with_base_url(&base_url, &user_id)?;
    let renderer = HttpRenderer::new(cookie)?;

    if cli.wait_for_login {
        wait_for_login()?;
    }

    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("\nInterrupt received; stopping after the current page...");
                cancel.store(true, Ordering::SeqCst);
            }
        });
    }

    let estimate = paginate::estimate(&renderer, &listing).await;
    match estimate {
        PageEstimate::Known(pages) => tracing::info!("estimated {pages} page(s)"),
        PageEstimate::Unknown => tracing::info!("page count unknown; discovering dynamically"),
    }

    let config = HarvestConfig {
        max_pages,
        page_delay: Duration::from_millis(cli.delay_ms),
    };
    let mut harvester = Harvester::new(&renderer, &listing, estimate, config);

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}").context("progress style")?);
    spinner.enable_steady_tick(Duration::from_millis(120));

    while !harvester.is_done() {
        if cancel.load(Ordering::SeqCst) {
            harvester.cancel();
            break;
        }
        if let Some(report) = harvester.step().await {
            spinner.set_message(format!(
                "page {}: {} records ({} total)",
                report.page, report.records_found, report.total_records
            ));
        }
    }
    let outcome = harvester.into_outcome();
    spinner.finish_and_clear();

    report_stop(&outcome);

    if outcome.records.is_empty() {
        eprintln!("No records harvested; check the user id and session cookie.");
    }

    // Writers are isolated: one failing must not stop the other.
    let mut write_failed = false;
    match output::write_json_export(&cli.json_out, &outcome.records) {
        Ok(()) => eprintln!("Wrote {}", cli.json_out.display()),
        Err(err) => {
            tracing::error!("JSON export failed: {err:#}");
            write_failed = true;
        }
    }
    match output::write_csv_export(&cli.csv_out, &outcome.records) {
        Ok(()) => eprintln!("Wrote {}", cli.csv_out.display()),
        Err(err) => {
            tracing::error!("CSV export failed: {err:#}");
            write_failed = true;
        }
    }

    if cli.preview && !outcome.records.is_empty() {
        output::print_records_table(&outcome.records);
    }

    eprintln!(
        "Harvest finished: {} records across {} page(s)",
        outcome.records.len(),
        outcome.pages_fetched
    );

    let interrupted = matches!(outcome.stop, StopReason::Cancelled | StopReason::Fetch(_));
    Ok(if interrupted || write_failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn report_stop(outcome: &HarvestOutcome) {
    match &outcome.stop {
        StopReason::ConsecutiveEmptyPages | StopReason::EstimateExceeded => {}
        StopReason::SafetyCeiling => {
            tracing::warn!("page ceiling reached; the listing may have more pages")
        }
        StopReason::Cancelled => {
            tracing::warn!("harvest cancelled; keeping partial results")
        }
        StopReason::Fetch(err) => {
            tracing::error!("harvest interrupted by fetch failure: {err}")
        }
    }
}

fn wait_for_login() -> Result<()> {
    eprintln!("Log in to the site in your browser, copy your session cookie,");
    eprintln!("then press Enter to start scraping...");
    let mut line = String::new();
    std::io::stdin()
        .read_line(&mut line)
        .context("read stdin")?;
    Ok(())
}
