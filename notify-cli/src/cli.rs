use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};

use notify_core::cache::{Cache, MemoryStore};
use notify_core::config::Config;
use notify_core::notify::NotificationService;
use notify_core::provider::village::VillageForecastProvider;
use notify_core::push::fcm::FcmClient;
use notify_core::scheduler::NotificationScheduler;
use notify_core::users::StaticUserStore;
use notify_core::weather::WeatherService;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "wnotify", version, about = "Weather notification daemon")]
pub struct Cli {
    /// Path to a config file; defaults to the platform config directory.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the notification scheduler until interrupted.
    Run,

    /// Fetch and print the current weather for a coordinate.
    Weather {
        latitude: f64,
        longitude: f64,
    },

    /// Send a test push notification to a device token.
    Send {
        token: String,

        #[arg(long, default_value = "Test notification")]
        title: String,

        #[arg(long, default_value = "Hello from wnotify")]
        body: String,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let config = match &self.config {
            Some(path) => Config::load_from(path)?,
            None => Config::load()?,
        };

        match self.command {
            Command::Run => run_scheduler(&config).await,
            Command::Weather {
                latitude,
                longitude,
            } => show_weather(&config, latitude, longitude).await,
            Command::Send { token, title, body } => send_test(&config, &token, &title, &body).await,
        }
    }
}

fn weather_service(config: &Config) -> Result<WeatherService> {
    let forecast = config.forecast()?;
    let provider = VillageForecastProvider::new(&forecast.base_url, &forecast.service_key)?;
    Ok(WeatherService::new(
        Cache::new(Arc::new(MemoryStore::new())),
        Box::new(provider),
        config.timezone()?,
    ))
}

fn notification_service(config: &Config) -> Result<NotificationService> {
    let push = config.push()?;
    let client = FcmClient::new(&push.endpoint, &push.server_key)?;
    Ok(NotificationService::new(Arc::new(client)))
}

async fn run_scheduler(config: &Config) -> Result<()> {
    let scheduler = NotificationScheduler::new(
        Arc::new(StaticUserStore::new(config.users.clone())),
        weather_service(config)?,
        notification_service(config)?,
        config.timezone()?,
        config.tick_period(),
    );

    scheduler.start();
    tokio::signal::ctrl_c().await?;
    scheduler.stop();

    Ok(())
}

async fn show_weather(config: &Config, latitude: f64, longitude: f64) -> Result<()> {
    let service = weather_service(config)?;
    let snapshot = service.get_weather(latitude, longitude).await?;

    println!("Forecast for ({latitude}, {longitude}):");
    println!("  temperature:   {} °C", snapshot.temperature);
    println!("  humidity:      {} %", snapshot.humidity);
    println!("  precipitation: {} mm ({})", snapshot.precipitation, snapshot.precipitation_type.label());
    println!("  wind speed:    {} m/s", snapshot.wind_speed);
    println!("  sky:           {}", snapshot.sky_condition.label());
    println!("  issued for:    {} {}", snapshot.forecast_date, snapshot.forecast_time);

    Ok(())
}

async fn send_test(config: &Config, token: &str, title: &str, body: &str) -> Result<()> {
    let service = notification_service(config)?;
    let result = service.send_to_one(token, title, body).await;

    if result.success {
        println!(
            "Sent (message id: {})",
            result.message_id.as_deref().unwrap_or("-")
        );
    } else {
        println!("Failed: {}", result.error.as_deref().unwrap_or("unknown"));
    }

    Ok(())
}
