use chrono::Utc;
use log::{error, info};
use std::time::Duration;

use voting_dashboard::api::JsonRpcLedger;
use voting_dashboard::app::AppContext;
use voting_dashboard::config::Config;
use voting_dashboard::sync::WsFeed;
use voting_dashboard::view::render_summary;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::load()?;
    let client = reqwest::Client::new();
    let ledger = JsonRpcLedger::new(client, &config);
    let feed = WsFeed {
        ws_url: config.ws_url.clone(),
        contract: config.contract_address.clone(),
    };

    let mut ctx = AppContext::open(config)?;
    if let Err(e) = ctx.start_sync(&ledger, &feed).await {
        // the cached session stays on screen, just stale
        error!("Event sync failed to start: {}", e);
    }

    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    let mut last = None;
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let now = Utc::now();
                let session = ctx.current_session();
                let seen = Some((session.clone(), session.status_at(now)));
                if seen != last {
                    println!("{}", render_summary(&session, now));
                    last = seen;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                break;
            }
        }
    }

    ctx.stop_sync();
    Ok(())
}
