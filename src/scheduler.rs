//! # Daily Scheduler
//!
//! Fires once per reference-zone day at the configured wall-clock time and
//! broadcasts each user's daily batch. The next fire instant is recomputed
//! from the clock on every iteration, so a slow pass or a suspended host
//! never accumulates drift.

use chrono::{DateTime, Days, FixedOffset, NaiveDate, NaiveTime, Utc};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn, Instrument};

use crate::bot::ui_builder::format_daily_message;
use crate::clock::{reference_date, Clock};
use crate::delivery::Delivery;
use crate::errors::{error_logging, AppResult};
use crate::localization::LocalizationManager;
use crate::observability;
use crate::rotation::RotationEngine;

/// A wall-clock time in a fixed reference offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyTrigger {
    at: NaiveTime,
    offset: FixedOffset,
}

impl DailyTrigger {
    pub fn new(at: NaiveTime, offset: FixedOffset) -> Self {
        Self { at, offset }
    }

    pub fn at(&self) -> NaiveTime {
        self.at
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// The first fire instant strictly after `now`
    pub fn next_fire_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let today = reference_date(now, self.offset);
        let candidate = self.instant_on(today);
        if now < candidate {
            candidate
        } else {
            self.instant_on(today + Days::new(1))
        }
    }

    /// How long to sleep from `now` until the next fire
    pub fn duration_until_next(&self, now: DateTime<Utc>) -> Duration {
        (self.next_fire_after(now) - now)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }

    fn instant_on(&self, date: NaiveDate) -> DateTime<Utc> {
        let local = date.and_time(self.at);
        local.and_utc() - chrono::Duration::seconds(i64::from(self.offset.local_minus_utc()))
    }
}

/// Outcome of one broadcast pass
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub failed: usize,
    /// Users without a level or with nothing to send
    pub skipped: usize,
}

pub struct Scheduler {
    engine: Arc<RotationEngine>,
    delivery: Arc<dyn Delivery>,
    localization: Arc<LocalizationManager>,
    clock: Arc<dyn Clock>,
    trigger: DailyTrigger,
    last_fired: Mutex<Option<NaiveDate>>,
}

impl Scheduler {
    pub fn new(
        engine: Arc<RotationEngine>,
        delivery: Arc<dyn Delivery>,
        localization: Arc<LocalizationManager>,
        clock: Arc<dyn Clock>,
        trigger: DailyTrigger,
    ) -> Self {
        Self {
            engine,
            delivery,
            localization,
            clock,
            trigger,
            last_fired: Mutex::new(None),
        }
    }

    /// Loop until `shutdown` is cancelled. Cancellation is observed while
    /// waiting, never in the middle of a pass.
    pub async fn run(&self, shutdown: CancellationToken) {
        info!(
            at = %self.trigger.at().format("%H:%M"),
            offset = %self.trigger.offset(),
            "Daily scheduler started"
        );

        loop {
            let now = self.clock.now();
            let next = self.trigger.next_fire_after(now);
            let wait = self.trigger.duration_until_next(now);
            debug!(next_fire = %next, wait_secs = wait.as_secs(), "Waiting for next daily fire");

            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Daily scheduler stopping");
                    break;
                }
                _ = tokio::time::sleep(wait) => {}
            }

            let fire_date = reference_date(next, self.trigger.offset());
            if !self.claim(fire_date) {
                debug!(date = %fire_date, "Daily pass already ran for this date");
                continue;
            }

            let report = self
                .run_daily_pass()
                .instrument(observability::scheduler_span(&fire_date.to_string()))
                .await;
            info!(
                date = %fire_date,
                delivered = report.delivered,
                failed = report.failed,
                skipped = report.skipped,
                "Daily broadcast finished"
            );
        }
    }

    /// Record `date` as fired; false if a pass already ran for it
    pub fn claim(&self, date: NaiveDate) -> bool {
        let mut last = self.last_fired.lock();
        if *last == Some(date) {
            return false;
        }
        *last = Some(date);
        true
    }

    /// Send today's batch to every user with a level. One user's failure is
    /// logged and counted, then the pass moves on.
    pub async fn run_daily_pass(&self) -> BroadcastReport {
        let mut report = BroadcastReport::default();

        let user_ids = match self.engine.store().user_ids().await {
            Ok(ids) => ids,
            Err(e) => {
                error_logging::log_database_error(&e, "list_users_for_broadcast", None);
                return report;
            }
        };

        for user_id in user_ids {
            match self.deliver_to(user_id).await {
                Ok(true) => report.delivered += 1,
                Ok(false) => report.skipped += 1,
                Err(e) => {
                    error_logging::log_delivery_error(&e, user_id, "daily_broadcast");
                    report.failed += 1;
                }
            }
        }

        if report.failed > 0 {
            warn!(failed = report.failed, "Some daily messages were not delivered");
        }
        observability::record_broadcast_metrics(report.delivered, report.failed, report.skipped);

        report
    }

    async fn deliver_to(&self, user_id: i64) -> AppResult<bool> {
        let Some(level) = self.engine.level(user_id).await? else {
            return Ok(false);
        };

        let words = self.engine.ensure_daily(user_id).await?;
        if words.is_empty() {
            debug!(user_id = %user_id, "Nothing to send");
            return Ok(false);
        }

        let text = format_daily_message(&words, level, &self.localization, None);
        self.delivery.send(user_id, &text).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::moscow_offset;
    use chrono::TimeZone;

    fn ten_am_moscow() -> DailyTrigger {
        DailyTrigger::new(NaiveTime::from_hms_opt(10, 0, 0).unwrap(), moscow_offset())
    }

    #[test]
    fn test_fires_today_when_before_instant() {
        // 06:59 UTC = 09:59 Moscow
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 6, 59, 0).unwrap();
        assert_eq!(
            ten_am_moscow().next_fire_after(now),
            Utc.with_ymd_and_hms(2024, 5, 1, 7, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_one_second_after_instant_is_tomorrow() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 7, 0, 1).unwrap();
        assert_eq!(
            ten_am_moscow().next_fire_after(now),
            Utc.with_ymd_and_hms(2024, 5, 2, 7, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_exactly_at_instant_is_tomorrow() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 7, 0, 0).unwrap();
        let next = ten_am_moscow().next_fire_after(now);
        assert!(next > now);
        assert_eq!(next, Utc.with_ymd_and_hms(2024, 5, 2, 7, 0, 0).unwrap());
    }

    #[test]
    fn test_reference_day_differs_from_utc_day() {
        // 22:00 UTC on May 1 is already May 2 in Moscow, before 10:00
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 22, 0, 0).unwrap();
        assert_eq!(
            ten_am_moscow().next_fire_after(now),
            Utc.with_ymd_and_hms(2024, 5, 2, 7, 0, 0).unwrap()
        );
        assert_eq!(
            ten_am_moscow().duration_until_next(now),
            Duration::from_secs(9 * 3600)
        );
    }

    #[test]
    fn test_fire_instant_is_at_local_wall_clock() {
        let trigger = ten_am_moscow();
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let local = trigger.next_fire_after(now).with_timezone(&trigger.offset());
        assert_eq!(local.time(), trigger.at());
    }

    #[test]
    fn test_negative_offset() {
        let trigger = DailyTrigger::new(
            NaiveTime::from_hms_opt(8, 30, 0).unwrap(),
            FixedOffset::west_opt(5 * 3600).unwrap(),
        );
        let now = Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap();
        assert_eq!(
            trigger.next_fire_after(now),
            Utc.with_ymd_and_hms(2024, 1, 10, 13, 30, 0).unwrap()
        );
    }
}
