use chrono::{DateTime, NaiveTime, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};

use super::Currency;

/// Host state during one hour.
///
/// `active_contracts` is a gauge sampled at capture time. Every other
/// counter and amount is the accrual since the previous snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostSnapshot {
    pub timestamp: DateTime<Utc>,

    pub active_contracts: u64,

    pub new_contracts: u64,
    pub expired_contracts: u64,
    pub successful_contracts: u64,
    pub failed_contracts: u64,

    pub payout: Currency,
    pub earned_revenue: Currency,
    pub potential_revenue: Currency,
    pub burnt_collateral: Currency,
}

impl HostSnapshot {
    /// Empty snapshot at `timestamp`, normalized to UTC
    pub fn new<Tz: TimeZone>(timestamp: DateTime<Tz>) -> Self {
        Self {
            timestamp: timestamp.with_timezone(&Utc),
            ..Self::default()
        }
    }

    pub fn with_active_contracts(mut self, active: u64) -> Self {
        self.active_contracts = active;
        self
    }

    pub fn with_contracts(mut self, new: u64, expired: u64, successful: u64, failed: u64) -> Self {
        self.new_contracts = new;
        self.expired_contracts = expired;
        self.successful_contracts = successful;
        self.failed_contracts = failed;
        self
    }

    pub fn with_revenue(
        mut self,
        payout: Currency,
        earned: Currency,
        potential: Currency,
        burnt_collateral: Currency,
    ) -> Self {
        self.payout = payout;
        self.earned_revenue = earned;
        self.potential_revenue = potential;
        self.burnt_collateral = burnt_collateral;
        self
    }

    /// Fold one hour into a longer period: the gauge takes the hour's value,
    /// additive fields accumulate. Counters saturate at `u64::MAX`.
    pub fn merge_hour(&mut self, hour: &HostSnapshot) {
        self.active_contracts = hour.active_contracts;

        self.new_contracts = self.new_contracts.saturating_add(hour.new_contracts);
        self.expired_contracts = self.expired_contracts.saturating_add(hour.expired_contracts);
        self.successful_contracts = self
            .successful_contracts
            .saturating_add(hour.successful_contracts);
        self.failed_contracts = self.failed_contracts.saturating_add(hour.failed_contracts);

        self.payout += &hour.payout;
        self.earned_revenue += &hour.earned_revenue;
        self.potential_revenue += &hour.potential_revenue;
        self.burnt_collateral += &hour.burnt_collateral;
    }
}

/// Start of the hour containing `timestamp`
pub fn truncate_to_hour(timestamp: DateTime<Utc>) -> DateTime<Utc> {
    let naive = timestamp.naive_utc();
    let top = NaiveTime::from_hms_opt(naive.hour(), 0, 0).unwrap_or(NaiveTime::MIN);
    Utc.from_utc_datetime(&naive.date().and_time(top))
}

/// Midnight UTC of the day containing `timestamp`
pub fn start_of_day(timestamp: DateTime<Utc>) -> DateTime<Utc> {
    Utc.from_utc_datetime(&timestamp.date_naive().and_time(NaiveTime::MIN))
}
