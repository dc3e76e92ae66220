//! Orchestrator — one timer loop per trigger.
//! Each loop computes its next wall-clock fire, sleeps until then, runs its
//! workflow against the store and hands the notification to the sink on a
//! separate task, then arms the next fire. Loops never wait on each other.

use std::sync::Arc;
use std::time::Duration;

use chorerank_core::config::ScheduleConfig;
use chorerank_core::error::{ChoreError, Result};
use chorerank_store::StoreHandle;
use chrono::{FixedOffset, Local, NaiveDate, NaiveDateTime, Utc};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::calendar::{self, Recurrence, TriggerSchedule};
use crate::notify::{Notification, Notifier, NotifyLog};
use crate::workflow::Workflow;

/// Longest single sleep; wall-clock jumps are noticed within this.
const MAX_SLEEP: Duration = Duration::from_secs(60);

/// Source of local wall-clock time.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Host clock, either at a fixed UTC offset or in the host's local zone.
pub struct WallClock {
    offset: Option<FixedOffset>,
}

impl WallClock {
    pub fn new(utc_offset_minutes: Option<i32>) -> Result<Self> {
        let offset = match utc_offset_minutes {
            Some(minutes) => Some(FixedOffset::east_opt(minutes * 60).ok_or_else(|| {
                ChoreError::Config(format!("utc_offset_minutes {minutes} out of range"))
            })?),
            None => None,
        };
        Ok(Self { offset })
    }
}

impl Clock for WallClock {
    fn now(&self) -> NaiveDateTime {
        match self.offset {
            Some(offset) => Utc::now().with_timezone(&offset).naive_local(),
            None => Local::now().naive_local(),
        }
    }
}

/// A named schedule bound to one workflow.
#[derive(Debug, Clone)]
pub struct Trigger {
    pub workflow: Workflow,
    pub schedule: TriggerSchedule,
}

impl Trigger {
    pub fn new(workflow: Workflow, schedule: TriggerSchedule) -> Self {
        Self { workflow, schedule }
    }

    pub fn name(&self) -> &'static str {
        self.workflow.name()
    }
}

/// Build the enabled triggers from config.
pub fn triggers_from_config(config: &ScheduleConfig) -> Vec<Trigger> {
    [
        (Workflow::MorningDigest, &config.morning_digest, Recurrence::Daily),
        (Workflow::PendingNotice, &config.pending_notice, Recurrence::Daily),
        (Workflow::PenaltySweep, &config.penalty_sweep, Recurrence::Daily),
        (Workflow::PeriodClose, &config.period_close, Recurrence::LastDayOfMonth),
    ]
    .into_iter()
    .filter(|(workflow, cfg, _)| {
        if !cfg.enabled {
            tracing::info!("⏸️ Trigger '{}' disabled", workflow.name());
        }
        cfg.enabled
    })
    .map(|(workflow, cfg, recurrence)| {
        Trigger::new(workflow, TriggerSchedule::from_config(cfg, recurrence))
    })
    .collect()
}

/// Drives the triggers. Cheap to clone; clones share the store, sink and log.
#[derive(Clone)]
pub struct Orchestrator {
    store: StoreHandle,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    log: Arc<Mutex<NotifyLog>>,
}

impl Orchestrator {
    pub fn new(store: StoreHandle, notifier: Arc<dyn Notifier>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            notifier,
            clock,
            log: Arc::new(Mutex::new(NotifyLog::new())),
        }
    }

    /// Shared notification history.
    pub fn log(&self) -> Arc<Mutex<NotifyLog>> {
        Arc::clone(&self.log)
    }

    /// Spawn one independent loop per trigger.
    pub fn spawn(&self, triggers: Vec<Trigger>) -> Vec<JoinHandle<()>> {
        tracing::info!("⏰ Orchestrator started with {} trigger(s)", triggers.len());
        triggers
            .into_iter()
            .map(|trigger| {
                let this = self.clone();
                tokio::spawn(async move { this.trigger_loop(trigger).await })
            })
            .collect()
    }

    /// Spawn all triggers and wait on them. Trigger loops only end when their
    /// schedule can never fire again, so this normally runs until shutdown.
    pub async fn run(&self, triggers: Vec<Trigger>) {
        let handles = self.spawn(triggers);
        for result in futures::future::join_all(handles).await {
            if let Err(e) = result {
                tracing::error!("Trigger loop aborted: {e}");
            }
        }
    }

    async fn trigger_loop(self, trigger: Trigger) {
        let mut last_fire: Option<NaiveDateTime> = None;
        loop {
            let now = self.clock.now();
            let from = last_fire.map_or(now, |fired| fired.max(now));
            let Some(next) = trigger.schedule.next_fire(from) else {
                tracing::warn!("Trigger '{}' has no future fire time, stopping", trigger.name());
                return;
            };
            tracing::debug!("Trigger '{}' armed for {next}", trigger.name());

            loop {
                let now = self.clock.now();
                if now >= next {
                    break;
                }
                tokio::time::sleep(calendar::until(now, next).min(MAX_SLEEP)).await;
            }

            last_fire = Some(next);
            if let Err(e) = self.fire(&trigger, next.date()).await {
                tracing::error!("❌ Trigger '{}' failed: {e}", trigger.name());
            }
        }
    }

    /// Run one trigger's workflow now and dispatch its notification.
    ///
    /// Returns once the store work is done; delivery continues in the background.
    pub async fn fire(&self, trigger: &Trigger, fire_date: NaiveDate) -> Result<Notification> {
        tracing::info!("🔔 Trigger fired: '{}'", trigger.name());
        let notification = trigger.workflow.run(&self.store, fire_date).await?;
        self.log.lock().await.record(notification.clone());

        let notifier = Arc::clone(&self.notifier);
        let outgoing = notification.clone();
        tokio::spawn(async move {
            if let Err(e) = notifier.notify(&outgoing).await {
                tracing::warn!("⚠️ Notification '{}' not delivered: {e}", outgoing.title);
            }
        });
        Ok(notification)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chorerank_core::config::TriggerConfig;
    use chorerank_store::ScoreDb;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Wall clock that advances with tokio's (pausable) clock.
    struct TestClock {
        base: NaiveDateTime,
        started: tokio::time::Instant,
    }

    impl TestClock {
        fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> Arc<Self> {
            Arc::new(Self {
                base: NaiveDate::from_ymd_opt(y, m, d)
                    .unwrap()
                    .and_hms_opt(h, min, s)
                    .unwrap(),
                started: tokio::time::Instant::now(),
            })
        }
    }

    impl Clock for TestClock {
        fn now(&self) -> NaiveDateTime {
            self.base + chrono::Duration::from_std(self.started.elapsed()).unwrap()
        }
    }

    /// Counts deliveries; optionally never finishes delivering.
    struct CountingNotifier {
        sent: AtomicUsize,
        hang: bool,
    }

    #[async_trait]
    impl Notifier for CountingNotifier {
        async fn notify(&self, _n: &Notification) -> Result<()> {
            self.sent.fetch_add(1, Ordering::SeqCst);
            if self.hang {
                std::future::pending::<()>().await;
            }
            Ok(())
        }
    }

    fn notifier(hang: bool) -> Arc<CountingNotifier> {
        Arc::new(CountingNotifier {
            sent: AtomicUsize::new(0),
            hang,
        })
    }

    fn store() -> StoreHandle {
        StoreHandle::new(ScoreDb::open_in_memory(-1).unwrap())
    }

    async fn wait_for_log(log: &Arc<Mutex<NotifyLog>>, n: usize) {
        while log.lock().await.len() < n {
            tokio::time::sleep(Duration::from_secs(30)).await;
        }
    }

    #[test]
    fn test_triggers_from_config_skip_disabled() {
        let mut config = ScheduleConfig::default();
        config.pending_notice = TriggerConfig {
            enabled: false,
            ..TriggerConfig::at(20, 0)
        };
        let triggers = triggers_from_config(&config);
        let names: Vec<_> = triggers.iter().map(|t| t.name()).collect();
        assert_eq!(names, ["morning_digest", "penalty_sweep", "period_close"]);
        assert_eq!(triggers[2].schedule.recurrence, Recurrence::LastDayOfMonth);
    }

    #[test]
    fn test_wall_clock_offset_bounds() {
        assert!(WallClock::new(Some(-180)).is_ok());
        assert!(WallClock::new(None).is_ok());
        assert!(WallClock::new(Some(24 * 60)).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_delivery_does_not_block_rearming() {
        let sink = notifier(true);
        let orch = Orchestrator::new(store(), sink.clone(), TestClock::at(2026, 3, 10, 7, 59, 0));
        let handles = orch.spawn(vec![Trigger::new(
            Workflow::MorningDigest,
            TriggerSchedule::daily(8, 0),
        )]);

        wait_for_log(&orch.log(), 2).await;
        while sink.sent.load(Ordering::SeqCst) < 2 {
            tokio::task::yield_now().await;
        }
        // both deliveries are still hanging
        assert_eq!(sink.sent.load(Ordering::SeqCst), 2);
        for h in handles {
            h.abort();
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_triggers_run_independently() {
        let sink = notifier(false);
        let orch = Orchestrator::new(store(), sink.clone(), TestClock::at(2026, 3, 10, 7, 0, 0));
        let handles = orch.spawn(vec![
            Trigger::new(Workflow::MorningDigest, TriggerSchedule::daily(8, 0)),
            Trigger::new(Workflow::PendingNotice, TriggerSchedule::daily(7, 30)),
        ]);

        wait_for_log(&orch.log(), 2).await;
        let log = orch.log();
        let log = log.lock().await;
        let sources: Vec<_> = log.history().map(|n| n.source.as_str()).collect();
        assert_eq!(sources, ["pending_notice", "morning_digest"]);
        for h in handles {
            h.abort();
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_period_close_fires_on_last_day_only() {
        let store = store();
        let id = store.add_task("Ana".into(), "Report".into(), 10).await.unwrap();
        store.complete_task(id).await.unwrap();

        let orch = Orchestrator::new(
            store.clone(),
            notifier(false),
            TestClock::at(2026, 4, 28, 23, 0, 0),
        );
        let schedule = TriggerSchedule::from_config(
            &ScheduleConfig::default().period_close,
            Recurrence::LastDayOfMonth,
        );
        let handles = orch.spawn(vec![Trigger::new(Workflow::PeriodClose, schedule)]);

        wait_for_log(&orch.log(), 1).await;
        // April was closed, on the 30th
        assert_eq!(store.period_history("2026-04".into()).await.unwrap().len(), 1);
        assert!(store.ranking().await.unwrap().is_empty());
        {
            let log = orch.log();
            let log = log.lock().await;
            assert!(log.last().unwrap().body.contains("Winner: Ana"));
        }
        for h in handles {
            h.abort();
        }
    }

    #[tokio::test]
    async fn test_run_returns_when_no_trigger_can_fire() {
        let orch = Orchestrator::new(store(), notifier(false), TestClock::at(2026, 1, 1, 0, 0, 0));
        let never = TriggerSchedule {
            hour: 12,
            minute: 0,
            days: vec![15],
            recurrence: Recurrence::LastDayOfMonth,
        };
        let finished = tokio::time::timeout(
            Duration::from_secs(5),
            orch.run(vec![Trigger::new(Workflow::PeriodClose, never)]),
        )
        .await;
        assert!(finished.is_ok());
        assert!(orch.log().lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_fire_records_notification() {
        let orch = Orchestrator::new(store(), notifier(false), TestClock::at(2026, 1, 1, 0, 0, 0));
        let trigger = Trigger::new(Workflow::PenaltySweep, TriggerSchedule::daily(23, 0));
        let n = orch
            .fire(&trigger, NaiveDate::from_ymd_opt(2026, 1, 1).unwrap())
            .await
            .unwrap();
        assert_eq!(n.source, "penalty_sweep");
        assert_eq!(orch.log().lock().await.len(), 1);
    }
}
