//! Time allocator: splits weekly prime and off-peak court-hours across channels
//!
//! League blocks draw from prime time only. A configured block count that
//! overruns prime is clamped uniformly; a schedule-derived one is auto-fitted by
//! giving up courts (down to two), then Friday, Mon-Thu and weekend blocks.
//! Either way the allocation carries a warning. Corporate and tournament hours are drawn from whichever
//! bucket the configuration names. If the booked channels together need more
//! hours than a bucket has, allocation fails instead of clamping open play to
//! zero, because the configuration itself double-books capacity.

use chrono::Weekday;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::FacilityConfig;
use crate::error::{EngineError, Result};
use crate::rates::Bucket;
use crate::schedule::{
    league_court_hours, league_windows, prime_hours_week, total_court_hours_week, weekly_league_blocks, LeagueDayGroup,
};

/// Slack for floating-point noise when comparing hour totals
const HOURS_EPSILON: f64 = 1e-9;

/// Auto-fit never takes a derived league below this many courts
pub const MIN_LEAGUE_COURTS: u32 = 2;

/// Court-hours per week for one channel, split by bucket
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq)]
pub struct BucketHours {
    pub prime: f64,
    pub offpeak: f64,
}

impl BucketHours {
    pub fn get(&self, bucket: Bucket) -> f64 {
        match bucket {
            Bucket::Prime => self.prime,
            Bucket::OffPeak => self.offpeak,
        }
    }

    pub fn total(&self) -> f64 {
        self.prime + self.offpeak
    }
}

/// A request the allocator had to trim to fit capacity
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CapacityWarning {
    pub channel: String,
    pub requested_hours: f64,
    pub available_hours: f64,
    pub message: String,
}

/// Weekly court-hour allocation for one run
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TimeAllocation {
    pub total_hours: f64,
    pub prime_hours: f64,
    pub offpeak_hours: f64,

    /// Blocks the configuration asked for
    pub requested_league_blocks: u32,

    /// Blocks actually scheduled after the capacity clamp
    pub league_blocks: u32,

    /// Courts each league block runs on after auto-fit
    pub league_courts_used: u32,

    pub league_prime_hours: f64,
    pub corporate: BucketHours,
    pub tournament: BucketHours,
    pub open_prime_hours: f64,
    pub open_offpeak_hours: f64,
    pub warnings: Vec<CapacityWarning>,
}

impl TimeAllocation {
    pub fn prime_share(&self) -> f64 {
        if self.total_hours > 0.0 {
            self.prime_hours / self.total_hours
        } else {
            0.0
        }
    }

    /// Bucket supply per week
    pub fn bucket_hours(&self, bucket: Bucket) -> f64 {
        match bucket {
            Bucket::Prime => self.prime_hours,
            Bucket::OffPeak => self.offpeak_hours,
        }
    }

    /// Open-play hours per week in a bucket
    pub fn open_hours(&self, bucket: Bucket) -> f64 {
        match bucket {
            Bucket::Prime => self.open_prime_hours,
            Bucket::OffPeak => self.open_offpeak_hours,
        }
    }

    /// Hours booked by league, corporate and tournament channels in a bucket
    pub fn booked_hours(&self, bucket: Bucket) -> f64 {
        let league = match bucket {
            Bucket::Prime => self.league_prime_hours,
            Bucket::OffPeak => 0.0,
        };
        league + self.corporate.get(bucket) + self.tournament.get(bucket)
    }

    /// Prime court-hours over a span of days (e.g. 30 for a month view)
    pub fn prime_hours_for_days(&self, days: f64) -> f64 {
        self.prime_hours * days / 7.0
    }

    pub fn capacity_exceeded(&self) -> bool {
        !self.warnings.is_empty()
    }
}

struct LeagueFit {
    blocks: u32,
    courts_used: u32,
    warning: Option<CapacityWarning>,
}

/// Fit the league request into the prime supply
fn fit_league(config: &FacilityConfig, prime_hours: f64) -> LeagueFit {
    let league = &config.league;
    let block_hours = league.block_hours();
    let fits = |blocks: u32, courts: u32| league_court_hours(blocks, courts, block_hours) <= prime_hours + HOURS_EPSILON;

    let requested_blocks = weekly_league_blocks(&config.schedule, league);
    let requested_hours = league_court_hours(requested_blocks, league.courts_used, block_hours);
    if fits(requested_blocks, league.courts_used) {
        return LeagueFit { blocks: requested_blocks, courts_used: league.courts_used, warning: None };
    }

    let mut courts = league.courts_used;
    let mut steps = Vec::new();
    let blocks = if league.blocks_per_week.is_some() {
        let per_block = courts as f64 * block_hours;
        let fitted = if per_block > 0.0 { (prime_hours / per_block).floor() as u32 } else { 0 };
        steps.push(format!("scheduling {} blocks", fitted));
        fitted
    } else {
        let floor = courts.min(MIN_LEAGUE_COURTS);
        while courts > floor && !fits(requested_blocks, courts) {
            courts -= 1;
        }
        if courts != league.courts_used {
            steps.push(format!("reduced courts_used from {} to {}", league.courts_used, courts));
        }

        let mut windows = league_windows(&config.schedule, league);
        let total = |windows: &Vec<(Weekday, u32)>| windows.iter().map(|(_, b)| b).sum::<u32>();
        for group in LeagueDayGroup::TRIM_ORDER {
            let before = total(&windows);
            while !fits(total(&windows), courts) {
                // Trim the fullest window in the group so its days stay even
                let fullest = windows
                    .iter_mut()
                    .filter(|(day, b)| LeagueDayGroup::of(*day) == group && *b > 0)
                    .rev()
                    .max_by_key(|(_, b)| *b);
                match fullest {
                    Some((_, b)) => *b -= 1,
                    None => break,
                }
            }
            let after = total(&windows);
            if after != before {
                steps.push(format!("reduced {} blocks by {}", group.as_str(), before - after));
            }
        }
        total(&windows)
    };

    let message = format!(
        "League capacity exceeded: {} blocks need {:.1} court-hours/week but prime supplies {:.1}; {}",
        requested_blocks,
        requested_hours,
        prime_hours,
        steps.join(", ")
    );
    LeagueFit {
        blocks,
        courts_used: courts,
        warning: Some(CapacityWarning {
            channel: "league".to_string(),
            requested_hours,
            available_hours: prime_hours,
            message,
        }),
    }
}

/// Allocate weekly court-hours for a configuration
pub fn allocate(config: &FacilityConfig) -> Result<TimeAllocation> {
    let total_hours = total_court_hours_week(&config.facility);
    let prime_hours = prime_hours_week(&config.facility, &config.schedule);
    let offpeak_hours = total_hours - prime_hours;
    if offpeak_hours < -HOURS_EPSILON {
        return Err(EngineError::OverAllocation {
            bucket: Bucket::Prime,
            requested: prime_hours,
            available: total_hours,
        });
    }
    let offpeak_hours = offpeak_hours.max(0.0);

    let mut warnings = Vec::new();
    let requested_league_blocks = weekly_league_blocks(&config.schedule, &config.league);
    let fit = fit_league(config, prime_hours);
    if let Some(warning) = fit.warning {
        warn!("{}", warning.message);
        warnings.push(warning);
    }
    let league_blocks = fit.blocks;
    let league_courts_used = fit.courts_used;
    let league_prime_hours = league_court_hours(league_blocks, league_courts_used, config.league.block_hours());

    let corp = &config.corporate;
    let corp_hours_per_event = corp.hours_per_event * corp.courts_used as f64;
    let corporate = BucketHours {
        prime: corp.prime_events_per_year * corp_hours_per_event / 52.0,
        offpeak: corp.offpeak_events_per_year * corp_hours_per_event / 52.0,
    };

    let tourney = &config.tournament;
    let tournament = BucketHours {
        prime: tourney.prime_court_hours_per_quarter * 4.0 / 52.0,
        offpeak: tourney.offpeak_court_hours_per_quarter * 4.0 / 52.0,
    };

    let prime_requested = league_prime_hours + corporate.prime + tournament.prime;
    if prime_requested > prime_hours + HOURS_EPSILON {
        return Err(EngineError::OverAllocation {
            bucket: Bucket::Prime,
            requested: prime_requested,
            available: prime_hours,
        });
    }

    let offpeak_requested = corporate.offpeak + tournament.offpeak;
    if offpeak_requested > offpeak_hours + HOURS_EPSILON {
        return Err(EngineError::OverAllocation {
            bucket: Bucket::OffPeak,
            requested: offpeak_requested,
            available: offpeak_hours,
        });
    }

    let allocation = TimeAllocation {
        total_hours,
        prime_hours,
        offpeak_hours,
        requested_league_blocks,
        league_blocks,
        league_courts_used,
        league_prime_hours,
        corporate,
        tournament,
        open_prime_hours: (prime_hours - prime_requested).max(0.0),
        open_offpeak_hours: (offpeak_hours - offpeak_requested).max(0.0),
        warnings,
    };

    debug!(
        "Allocated week: prime {:.1}h (league {:.1}, open {:.1}), off-peak {:.1}h (open {:.1})",
        allocation.prime_hours,
        allocation.league_prime_hours,
        allocation.open_prime_hours,
        allocation.offpeak_hours,
        allocation.open_offpeak_hours
    );

    Ok(allocation)
}
