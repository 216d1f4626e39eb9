use anyhow::{anyhow, bail, Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use reqwest::Client;
use serde_json::{Map, Value};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};
use url::Url;
use workshop_feed::{
    config::FeedConfig,
    fetch::HttpSource,
    lead::{AttributionStore, Lead, LeadSubmitter},
    schedule::{GroupLinkLoader, ScheduleLoader},
    tracking::{self, Availability, HttpTransport, Tracker},
    urgency::{Countdown, DayLabel},
};

#[derive(Parser)]
#[command(name = "workshop_feed", about = "Landing page data feed")]
struct Cli {
    /// YAML config file (otherwise $FEED_CONFIG or ./workshop_feed.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the workshop date and time from the published sheet
    Schedule,
    /// Print the thank-you page group link
    GroupLink,
    /// Register a lead and print the payment redirect
    Lead {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        profession: String,
        /// Landing URL the visitor arrived on (carries utm_* / fclid)
        #[arg(long)]
        page_url: String,
    },
    /// Send a pixel event
    Track {
        event: String,
        /// key=value custom data, repeatable
        #[arg(long = "param", value_name = "KEY=VALUE")]
        params: Vec<String>,
    },
    /// Run the enrol-bar countdown
    Countdown {
        #[arg(long, default_value_t = Countdown::ENROL_WINDOW_SECS)]
        seconds: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,workshop_feed=info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();

    // ─── 2) config + shared client ───────────────────────────────────
    let cli = Cli::parse();
    let cfg = FeedConfig::load(cli.config.as_deref())?;
    let client = Client::new();

    // ─── 3) dispatch ─────────────────────────────────────────────────
    match cli.command {
        Command::Schedule => {
            let sheet = cfg.published_sheet()?;
            let loader = ScheduleLoader::new(
                HttpSource::new(client),
                &sheet,
                cfg.fetch.per_url_timeout(),
            );
            let mut session = loader.spawn();
            let (date, time) = session.settled().await.labels();
            println!("Date: {}", date);
            println!("Time: {}", time);
        }

        Command::GroupLink => {
            let sheet = cfg.published_sheet()?;
            let loader = GroupLinkLoader::new(
                HttpSource::new(client),
                &sheet,
                cfg.sheet.group_link_fallback.clone(),
                cfg.fetch.per_url_timeout(),
            );
            println!("{}", loader.load().await);
        }

        Command::Lead {
            name,
            email,
            phone,
            profession,
            page_url,
        } => {
            let page_url = Url::parse(&page_url).with_context(|| format!("parsing page url {}", page_url))?;
            let store = AttributionStore::in_dir(&cfg.lead.state_dir);
            let attribution = store.capture(&page_url)?;
            let lead = Lead {
                name,
                email,
                phone,
                profession,
            };
            let submitter = LeadSubmitter::new(client, cfg.lead.webhook_url()?, cfg.lead.payment_url()?)
                .with_webhook_timeout(std::time::Duration::from_secs(cfg.lead.webhook_timeout_secs));
            let redirect = submitter.submit(&lead, &attribution, &page_url).await?;
            println!("{}", redirect);
        }

        Command::Track { event, params } => {
            let transport = HttpTransport::new(client, cfg.pixel.endpoint()?, cfg.pixel.access_token.clone());
            let tracker = tracking::install(Tracker::new(cfg.pixel.pixel_id.clone(), transport));

            let params = parse_params(&params)?;

            let init = tokio::spawn(tracker.initialize());
            if tracker.wait_ready(cfg.pixel.ready_timeout()).await == Availability::NotAvailable {
                init.abort();
                if let Ok(Err(e)) = init.await {
                    return Err(e.context("initializing pixel"));
                }
                bail!(
                    "pixel {} not available within {:?}",
                    tracker.pixel_id(),
                    cfg.pixel.ready_timeout()
                );
            }

            tracker.track(&event, params).await?;
            info!(event = %event, "event sent");
            tracker.close();
        }

        Command::Countdown { seconds } => {
            let mut today = DayLabel::today();
            println!("{}", today.label());
            let (mut rx, handle) = Countdown::new(seconds).spawn_ticker(std::time::Duration::from_secs(1));
            println!("{}", rx.borrow_and_update().label());
            while rx.changed().await.is_ok() {
                let countdown = *rx.borrow_and_update();
                if countdown.on_minute() && today.refresh(Local::now().date_naive()) {
                    println!("{}", today.label());
                }
                println!("{}", countdown.label());
            }
            handle.await?;
        }
    }

    Ok(())
}

fn parse_params(raw: &[String]) -> Result<Map<String, Value>> {
    raw.iter()
        .map(|kv| {
            let (k, v) = kv
                .split_once('=')
                .ok_or_else(|| anyhow!("expected KEY=VALUE, got {:?}", kv))?;
            // numbers go out as numbers (value=99), everything else as text
            let value = v
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number)
                .unwrap_or_else(|| Value::String(v.to_string()));
            Ok((k.to_string(), value))
        })
        .collect()
}
