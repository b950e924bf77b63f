//! Periodic notification scheduler.
//!
//! A single interval drives ticks. Each tick loads every user, matches their
//! configured delivery time against the current minute in the configured
//! time zone, and fans out weather notifications. Per-user failures are
//! isolated and counted; a tick that fires while the previous one is still
//! running is dropped with a warning rather than queued or overlapped.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, FixedOffset, Utc};
use tokio::sync::{Mutex, Notify};
use tracing::{debug, error, info, warn};

use crate::model::{RunSummary, UserSettings};
use crate::notify::NotificationService;
use crate::users::UserStore;
use crate::weather::WeatherService;

pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_secs(60);

#[derive(Clone)]
pub struct NotificationScheduler {
    inner: Arc<SchedulerInner>,
}

struct SchedulerInner {
    users: Arc<dyn UserStore>,
    weather: WeatherService,
    notifier: NotificationService,
    zone: FixedOffset,
    period: Duration,
    running: AtomicBool,
    shutdown: Notify,
    tick_guard: Mutex<()>,
}

impl NotificationScheduler {
    pub fn new(
        users: Arc<dyn UserStore>,
        weather: WeatherService,
        notifier: NotificationService,
        zone: FixedOffset,
        period: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                users,
                weather,
                notifier,
                zone,
                period,
                running: AtomicBool::new(false),
                shutdown: Notify::new(),
                tick_guard: Mutex::new(()),
            }),
        }
    }

    /// Start ticking. Calling `start` while already running is a no-op.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) {
        if self.inner.running.swap(true, Ordering::SeqCst) {
            warn!("scheduler is already running");
            return;
        }

        let inner = self.inner.clone();
        tokio::spawn(async move {
            let start = tokio::time::Instant::now() + inner.period;
            let mut ticker = tokio::time::interval_at(start, inner.period);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if !inner.running.load(Ordering::SeqCst) {
                            break;
                        }
                        let inner = inner.clone();
                        tokio::spawn(async move {
                            let now = Utc::now().with_timezone(&inner.zone);
                            inner.try_run_once(now).await;
                        });
                    }
                    _ = inner.shutdown.notified() => break,
                }
            }
            debug!("scheduler loop exited");
        });

        info!(period_secs = self.inner.period.as_secs(), "notification scheduler started");
    }

    /// Stop ticking. The timer is cancelled going forward; an in-flight tick
    /// runs to completion. Calling `stop` while stopped is a no-op.
    pub fn stop(&self) {
        if !self.inner.running.swap(false, Ordering::SeqCst) {
            warn!("scheduler is not running");
            return;
        }

        self.inner.shutdown.notify_waiters();
        info!("notification scheduler stopped");
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::SeqCst)
    }

    /// Evaluate and dispatch one tick at the given wall-clock time.
    pub async fn run_once(&self, now: DateTime<FixedOffset>) -> RunSummary {
        self.inner.run_once(now).await
    }

    /// Run a tick unless the previous one is still in flight, in which case
    /// the tick is dropped with a warning and `None` is returned.
    pub async fn try_run_once(&self, now: DateTime<FixedOffset>) -> Option<RunSummary> {
        self.inner.try_run_once(now).await
    }
}

impl SchedulerInner {
    async fn try_run_once(&self, now: DateTime<FixedOffset>) -> Option<RunSummary> {
        let Ok(_guard) = self.tick_guard.try_lock() else {
            warn!("previous tick still in flight, dropping this tick");
            return None;
        };
        Some(self.run_once(now).await)
    }

    async fn run_once(&self, now: DateTime<FixedOffset>) -> RunSummary {
        let users = match self.users.find_all().await {
            Ok(users) => users,
            Err(err) => {
                error!(error = %err, "failed to load users, aborting tick");
                return RunSummary::default();
            }
        };

        let current = now.format("%H:%M").to_string();
        let mut succeeded = 0;
        let mut failed = 0;

        for user in &users {
            let Some(settings) = &user.settings else {
                continue;
            };

            let target = match dispatch_target(settings, &current) {
                Ok(target) => target,
                Err(skip) => {
                    debug!(user_id = %user.id, reason = skip.as_str(), "skipping user");
                    continue;
                }
            };

            debug!(
                user_id = %user.id,
                notification_time = %current,
                "sending notification at scheduled time"
            );

            let snapshot = match self
                .weather
                .get_weather(target.latitude, target.longitude)
                .await
            {
                Ok(snapshot) => snapshot,
                Err(err) => {
                    failed += 1;
                    error!(user_id = %user.id, error = %err, "failed to fetch weather for user");
                    continue;
                }
            };

            let result = self
                .notifier
                .send_weather_notification(&target.token, &snapshot)
                .await;

            if result.success {
                succeeded += 1;
            } else {
                failed += 1;
                warn!(
                    user_id = %user.id,
                    error = result.error.as_deref().unwrap_or("unknown"),
                    "failed to send notification"
                );
            }
        }

        let summary = RunSummary {
            total: succeeded + failed,
            succeeded,
            failed,
        };
        info!(
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "notification tick complete"
        );
        summary
    }
}

/// Why a user was passed over in a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Skip {
    Disabled,
    TimeMismatch,
    NoToken,
    NoLocation,
}

impl Skip {
    fn as_str(self) -> &'static str {
        match self {
            Self::Disabled => "notifications disabled",
            Self::TimeMismatch => "outside scheduled minute",
            Self::NoToken => "no push token",
            Self::NoLocation => "no location",
        }
    }
}

#[derive(Debug)]
struct DispatchTarget {
    token: String,
    latitude: f64,
    longitude: f64,
}

/// A user is eligible only in the minute whose label equals their configured
/// delivery time, and only with a token and a complete location on record.
fn dispatch_target(settings: &UserSettings, current_hhmm: &str) -> Result<DispatchTarget, Skip> {
    if !settings.notification_enabled {
        return Err(Skip::Disabled);
    }

    let scheduled = settings
        .notification_time
        .get(..5)
        .unwrap_or(&settings.notification_time);
    if scheduled != current_hhmm {
        return Err(Skip::TimeMismatch);
    }

    let token = match settings.fcm_token.as_deref() {
        Some(token) if !token.trim().is_empty() => token.to_string(),
        _ => return Err(Skip::NoToken),
    };

    let (Some(latitude), Some(longitude)) =
        (settings.location_latitude, settings.location_longitude)
    else {
        return Err(Skip::NoLocation);
    };

    Ok(DispatchTarget {
        token,
        latitude,
        longitude,
    })
}
