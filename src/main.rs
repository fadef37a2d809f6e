use requisition_scout::filters::{Filter, FilterSet};
use requisition_scout::listings_client::{self, ListingsClient};
use requisition_scout::report::{self, Reporter};
use requisition_scout::settings::Settings;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_file(true)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize logging first
    init_logging();

    let settings = Settings::new().map_err(|e| {
        error!("Failed to load settings: {}", e);
        e
    })?;

    if settings.api.cookie.is_empty() {
        warn!("API_COOKIE is empty; the listings endpoint will most likely reject the request");
    }

    let filters = match &settings.filters_path {
        Some(path) => {
            let set = FilterSet::<Filter>::from_path(path).map_err(|e| {
                error!("{}", e);
                e
            })?;
            if set.is_empty() {
                warn!("{} defines no filters; no requisition will be reported", path.display());
            } else {
                info!("Loaded {} filter(s) from {}", set.len(), path.display());
            }
            Some(set)
        }
        None => None,
    };

    let client = ListingsClient::new(&settings.api)?;
    let mut reporter = Reporter::new(filters);

    let Some(interval_secs) = settings.poll_interval_secs else {
        let response = listings_client::fetch_listings(&client, &settings.api, &settings.retry).await?;
        for line in reporter.lines(&response)? {
            println!("{}", line);
        }
        return Ok(());
    };

    info!(
        "Polling {} every {}s",
        settings.api.listings_url(),
        interval_secs
    );

    report::poll_listings(
        &client,
        &settings.api,
        &settings.retry,
        Duration::from_secs(interval_secs),
        &mut reporter,
        signal::ctrl_c(),
        |line| println!("{}", line),
    )
    .await?;
    Ok(())
}
