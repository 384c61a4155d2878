use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use job_beacon::bot::{Bot, BotCommand};
use job_beacon::channels::ChatTransport;
use job_beacon::channels::telegram::TelegramChannel;
use job_beacon::clock::{Clock, SystemClock};
use job_beacon::config::{Config, SourcesConfig};
use job_beacon::navigation::{EngineDeps, NavigationEngine};
use job_beacon::observability::{Observer, create_observer};
use job_beacon::sources::{DemoSource, SourceRegistry, UpworkSource};

/// Pause before polling again after a failed poll.
const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("job_beacon=info")))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let config = Config::from_env()?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let registry = build_registry(&config.sources, Arc::clone(&clock))?;
    tracing::info!(sources = ?registry.ids(), "Job sources ready");

    let channel = Arc::new(TelegramChannel::new(&config.telegram)?);
    let username = channel.verify().await?;
    channel.register_commands(&BotCommand::menu()).await?;
    tracing::info!(%username, "Connected to Telegram");

    let observer: Arc<dyn Observer> = Arc::from(create_observer(&config.observability));
    let transport: Arc<dyn ChatTransport> = channel.clone();
    let engine = NavigationEngine::new(
        EngineDeps {
            registry: Arc::new(registry),
            transport: Arc::clone(&transport),
            clock,
            observer: Arc::clone(&observer),
        },
        config.display.clone(),
        config.session.busy_policy,
    );
    let bot = Arc::new(Bot::new(Arc::new(engine), transport));

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down");
                observer.flush();
                return Ok(());
            }
            polled = channel.poll_updates() => match polled {
                Ok(events) => {
                    for event in events {
                        let bot = Arc::clone(&bot);
                        tokio::spawn(async move {
                            let user = event.sender().user;
                            if let Err(e) = bot.handle_event(event).await {
                                tracing::warn!(%user, error = %e, "Failed to handle update");
                            }
                        });
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "Polling for updates failed");
                    tokio::time::sleep(POLL_RETRY_DELAY).await;
                }
            }
        }
    }
}

fn build_registry(config: &SourcesConfig, clock: Arc<dyn Clock>) -> anyhow::Result<SourceRegistry> {
    let mut registry = SourceRegistry::new(config.request_timeout);
    for id in &config.enabled {
        match id.as_str() {
            UpworkSource::ID => registry.register(Arc::new(UpworkSource::new(
                config.upwork_api_url.clone(),
                config.request_timeout,
            )?)),
            DemoSource::ID => registry.register(Arc::new(DemoSource::new(Arc::clone(&clock)))),
            other => anyhow::bail!("no implementation for job source '{other}'"),
        }
    }
    Ok(registry)
}
