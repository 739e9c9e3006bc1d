//! Background jobs
//!
//! Three periodic tasks run next to the HTTP server:
//!
//! - recurring events: once a day, materialize upcoming occurrences
//! - booking expiry: release seats held by abandoned checkouts
//! - event completion: close events that have ended
//!
//! Every run is independent; a failed run is logged and retried on the next tick.

pub mod schedule;

use std::future::Future;
use std::time::{Duration, Instant};

use chrono::Utc;
use futures::future::join_all;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::config::JobsConfig;
use crate::middleware::IpRateLimiter;
use crate::services::ServiceFactory;
use crate::utils::errors::Result;
use crate::utils::logging::log_job_run;

pub const RECURRING_EVENTS: &str = "recurring_events";
pub const BOOKING_EXPIRY: &str = "booking_expiry";
pub const EVENT_COMPLETION: &str = "event_completion";
pub const RATE_LIMIT_PRUNE: &str = "rate_limit_prune";

const RATE_LIMIT_PRUNE_EVERY: Duration = Duration::from_secs(60);

/// Run one job and log its outcome
pub async fn run_job<F, Fut>(name: &str, job: F) -> Option<u64>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<u64>>,
{
    let started = Instant::now();
    let result = job().await;
    let duration_ms = started.elapsed().as_millis() as u64;

    match result {
        Ok(affected) => {
            log_job_run(name, affected, duration_ms, true);
            if affected > 0 {
                info!(job = name, affected = affected, "Background job changed rows");
            }
            Some(affected)
        }
        Err(e) => {
            log_job_run(name, 0, duration_ms, false);
            error!(job = name, error = %e, "Background job failed");
            None
        }
    }
}

pub async fn generate_recurring_events(services: &ServiceFactory) -> Option<u64> {
    run_job(RECURRING_EVENTS, || services.event_service.generate_occurrences(Utc::now())).await
}

pub async fn expire_bookings(services: &ServiceFactory) -> Option<u64> {
    run_job(BOOKING_EXPIRY, || services.booking_service.expire_stale(Utc::now())).await
}

pub async fn complete_events(services: &ServiceFactory) -> Option<u64> {
    run_job(EVENT_COMPLETION, || services.event_service.complete_finished(Utc::now())).await
}

/// Handles of the running job tasks
pub struct JobScheduler {
    shutdown: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl JobScheduler {
    /// Spawn every job; nothing is spawned when jobs are disabled
    pub fn start(services: ServiceFactory, config: &JobsConfig) -> Self {
        let (shutdown, _) = watch::channel(false);
        let mut scheduler = Self {
            shutdown,
            handles: Vec::new(),
        };

        if !config.enabled {
            info!("Background jobs are disabled");
            return scheduler;
        }

        let hour = config.recurring_events_hour_utc;
        let daily_services = services.clone();
        scheduler.spawn(RECURRING_EVENTS, move |mut stop| async move {
            // catch up immediately after a restart, then daily at the configured hour
            generate_recurring_events(&daily_services).await;
            loop {
                let wait = schedule::until_next_daily_run(Utc::now(), hour)
                    .to_std()
                    .unwrap_or(Duration::from_secs(3600));
                tokio::select! {
                    _ = tokio::time::sleep(wait) => {
                        generate_recurring_events(&daily_services).await;
                    }
                    _ = stop.changed() => break,
                }
            }
        });

        let expiry_services = services.clone();
        let expiry_every = Duration::from_secs(config.booking_expiry_interval_secs.max(1));
        scheduler.spawn(BOOKING_EXPIRY, move |stop| async move {
            every(expiry_every, stop, || expire_bookings(&expiry_services)).await;
        });

        let completion_every = Duration::from_secs(config.event_completion_interval_secs.max(1));
        scheduler.spawn(EVENT_COMPLETION, move |stop| async move {
            every(completion_every, stop, || complete_events(&services)).await;
        });

        info!(jobs = scheduler.handles.len(), "Background jobs started");
        scheduler
    }

    /// Periodically drop idle clients from the auth rate limiter
    pub fn prune_rate_limiter(&mut self, limiter: IpRateLimiter) {
        self.spawn(RATE_LIMIT_PRUNE, move |stop| async move {
            every(RATE_LIMIT_PRUNE_EVERY, stop, || {
                limiter.retain_recent();
                async { Some(0) }
            })
            .await;
        });
    }

    fn spawn<F, Fut>(&mut self, name: &'static str, task: F)
    where
        F: FnOnce(watch::Receiver<bool>) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let stop = self.shutdown.subscribe();
        let future = task(stop);
        self.handles.push(tokio::spawn(async move {
            future.await;
            info!(job = name, "Background job stopped");
        }));
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Signal every job and wait for in-flight runs to finish
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        for result in join_all(self.handles).await {
            if let Err(e) = result {
                warn!(error = %e, "Background job task ended abnormally");
            }
        }
    }
}

async fn every<F, Fut>(period: Duration, mut stop: watch::Receiver<bool>, mut run: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<u64>>,
{
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                run().await;
            }
            _ = stop.changed() => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::errors::WaddleError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_run_job_reports_outcome() {
        assert_eq!(run_job("ok", || async { Ok(3) }).await, Some(3));
        assert_eq!(
            run_job("failing", || async { Err(WaddleError::BadRequest("boom".into())) }).await,
            None
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_every_runs_until_stopped() {
        let (tx, rx) = watch::channel(false);
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();

        let task = tokio::spawn(every(Duration::from_secs(10), rx, move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Some(0)
            }
        }));

        tokio::time::sleep(Duration::from_secs(25)).await;
        tx.send(true).unwrap();
        tokio_test::assert_ok!(task.await);

        // ticks at 0s, 10s and 20s
        assert_eq!(runs.load(Ordering::SeqCst), 3);
    }
}
