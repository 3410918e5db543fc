//! Revenue calculator
//!
//! Turns a [`TimeAllocation`] into weekly revenue per channel, then scales it to a
//! steady-state year and to every projected month (with the opening ramp applied).
//! Every weekly figure is checked against the physical ceiling of hours × highest
//! applicable rate before it is returned.

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::allocation::TimeAllocation;
use crate::config::FacilityConfig;
use crate::error::{EngineError, Result};
use crate::money::{money, Money};
use crate::rates::{Bucket, RateCategory, RateTable};
use crate::seasonality::{self, MonthSlot};
use crate::utilization::{resolve_offpeak, RampLevels, SolvedUtilization};

/// Relative slack on ceiling comparisons for floating-point noise
const CEILING_EPSILON: f64 = 1e-9;

/// Revenue per channel over some period
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq)]
pub struct ChannelRevenue {
    pub court_prime: f64,
    pub court_offpeak: f64,
    pub league: f64,
    pub corporate: f64,
    pub tournament: f64,
    pub retail: f64,
}

impl ChannelRevenue {
    pub fn court(&self) -> f64 {
        self.court_prime + self.court_offpeak
    }

    /// Sum of all channels (everything except membership dues)
    pub fn total(&self) -> f64 {
        self.court_prime + self.court_offpeak + self.league + self.corporate + self.tournament + self.retail
    }

    fn scaled(&self, court_and_corporate: f64, league: f64, fixed: f64) -> Self {
        Self {
            court_prime: self.court_prime * court_and_corporate,
            court_offpeak: self.court_offpeak * court_and_corporate,
            league: self.league * league,
            corporate: self.corporate * court_and_corporate,
            tournament: self.tournament * fixed,
            retail: self.retail * fixed,
        }
    }
}

/// Channel revenue as booked in the monthly ledger, in cents
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq)]
pub struct BookedRevenue {
    pub court_prime: Money,
    pub court_offpeak: Money,
    pub league: Money,
    pub corporate: Money,
    pub tournament: Money,
    pub retail: Money,
}

impl BookedRevenue {
    pub fn court(&self) -> Money {
        self.court_prime + self.court_offpeak
    }

    pub fn total(&self) -> Money {
        self.court_prime + self.court_offpeak + self.league + self.corporate + self.tournament + self.retail
    }
}

impl From<&ChannelRevenue> for BookedRevenue {
    fn from(channels: &ChannelRevenue) -> Self {
        Self {
            court_prime: money(channels.court_prime),
            court_offpeak: money(channels.court_offpeak),
            league: money(channels.league),
            corporate: money(channels.corporate),
            tournament: money(channels.tournament),
            retail: money(channels.retail),
        }
    }
}

/// Open-play rental revenue in one bucket
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CourtBucketRevenue {
    pub bucket: Bucket,
    pub open_hours: f64,
    pub utilization: f64,
    pub utilized_hours: f64,
    pub member_share: f64,
    pub member_hours: f64,
    pub non_member_hours: f64,

    /// Σ mix_i × tier rate_i, per court-hour
    pub member_blended_rate: f64,
    pub non_member_rate: f64,

    /// Member revenue by tier
    pub tier_revenue: BTreeMap<String, f64>,
    pub member_revenue: f64,
    pub non_member_revenue: f64,
    pub revenue: f64,
}

/// Weekly league economics
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LeagueRevenue {
    pub blocks: u32,
    pub seats: f64,
    pub filled_seats: f64,
    pub member_seats: f64,
    pub non_member_seats: f64,
    pub weighted_member_price: f64,
    pub rack_price: f64,
    pub cycle_weeks: f64,
    pub revenue: f64,
}

/// Ceiling check for one channel
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChannelCeiling {
    pub channel: String,
    pub revenue: f64,
    pub hours: f64,
    pub max_rate: f64,
    pub ceiling: f64,
}

impl ChannelCeiling {
    fn hourly(channel: &str, revenue: f64, hours: f64, max_rate: f64) -> Self {
        Self { channel: channel.to_string(), revenue, hours, max_rate, ceiling: hours * max_rate }
    }

    /// Channels that are not sold by the hour are capped by their gross volume
    fn gross(channel: &str, revenue: f64, gross: f64) -> Self {
        Self { channel: channel.to_string(), revenue, hours: 0.0, max_rate: 0.0, ceiling: gross }
    }

    pub fn holds(&self) -> bool {
        self.revenue <= self.ceiling * (1.0 + CEILING_EPSILON) + CEILING_EPSILON
    }
}

/// One week of revenue at given operating levels
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WeeklyRevenue {
    pub levels: RampLevels,
    pub channels: ChannelRevenue,
    pub court_prime: CourtBucketRevenue,
    pub court_offpeak: CourtBucketRevenue,
    pub league: LeagueRevenue,
    pub ceilings: Vec<ChannelCeiling>,

    /// Court-hours actually played or booked
    pub utilized_hours: f64,
}

/// One projected month of channel revenue
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MonthlyRevenue {
    pub index: u32,
    pub month: String,
    pub weeks: f64,
    pub league_weeks: f64,
    pub levels: RampLevels,
    pub channels: ChannelRevenue,

    /// `channels` rounded into the ledger
    pub booked: BookedRevenue,

    /// League players normalized to this month (weekly players × league weeks ÷ cycle)
    pub league_players: f64,

    pub available_hours: f64,
    pub prime_hours: f64,
    pub booked_prime_hours: f64,
    pub utilized_hours: f64,
}

/// Full revenue output of one run
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RevenueBreakdown {
    pub offpeak_utilization: SolvedUtilization,
    pub weekly: WeeklyRevenue,
    pub annual: ChannelRevenue,
    pub monthly: Vec<MonthlyRevenue>,
}

impl RevenueBreakdown {
    /// Steady-state variable revenue per year
    pub fn annual_total(&self) -> f64 {
        self.annual.total()
    }
}

/// Filled league seats per week: blocks × courts × players/court × fill
pub fn league_weekly_players(blocks: u32, courts_used: u32, players_per_court: u32, fill_rate: f64) -> f64 {
    blocks as f64 * courts_used as f64 * players_per_court as f64 * fill_rate
}

/// Weekly league players spread over a league cycle and scaled to a month
pub fn monthly_normalized_players(weekly_players: f64, league_weeks: f64, cycle_weeks: f64) -> f64 {
    weekly_players * league_weeks / cycle_weeks
}

/// Member price per seat per cycle, weighted by the league tier mix
pub fn weighted_member_league_price(rates: &RateTable, mix: &BTreeMap<String, f64>) -> Result<f64> {
    rates.blended_member_rate(RateCategory::LeaguePerCycle, Bucket::Prime, mix)
}

/// Computes revenue for one configuration and its allocation
pub struct RevenueCalculator<'a> {
    config: &'a FacilityConfig,
    allocation: &'a TimeAllocation,
    rates: RateTable,
    member_mix: BTreeMap<String, f64>,
    league_mix: BTreeMap<String, f64>,
    offpeak: SolvedUtilization,
}

impl<'a> RevenueCalculator<'a> {
    /// Validate the configuration and prepare rates
    pub fn new(config: &'a FacilityConfig, allocation: &'a TimeAllocation) -> Result<Self> {
        config.validate()?;
        let member_mix = config.pricing.tiers.iter().map(|t| (t.name.clone(), t.mix)).collect();
        Ok(Self {
            config,
            allocation,
            rates: RateTable::from_config(config),
            member_mix,
            league_mix: config.league_tier_mix(),
            offpeak: resolve_offpeak(&config.open_play, allocation.prime_share()),
        })
    }

    pub fn rates(&self) -> &RateTable {
        &self.rates
    }

    pub fn steady_levels(&self) -> RampLevels {
        RampLevels::steady(self.config, self.offpeak.offpeak)
    }

    /// Open-play revenue in one bucket: hours × util × [ms × blended + (1 − ms) × rack]
    pub fn court_bucket(&self, bucket: Bucket, utilization: f64) -> Result<CourtBucketRevenue> {
        let member_share = match bucket {
            Bucket::Prime => self.config.open_play.member_share_prime,
            Bucket::OffPeak => self.config.open_play.member_share_offpeak,
        };
        let open_hours = self.allocation.open_hours(bucket);
        let utilized_hours = open_hours * utilization;
        let member_hours = utilized_hours * member_share;
        let non_member_hours = utilized_hours * (1.0 - member_share);

        let mut tier_revenue = BTreeMap::new();
        let mut member_revenue = 0.0;
        for (tier, share) in &self.member_mix {
            let rate = self.rates.rate(RateCategory::CourtPerHour, tier, bucket)?;
            let revenue = member_hours * share * rate;
            member_revenue += revenue;
            tier_revenue.insert(tier.clone(), revenue);
        }

        let member_blended_rate = self.rates.blended_member_rate(RateCategory::CourtPerHour, bucket, &self.member_mix)?;
        let non_member_rate = self.rates.non_member_rate(RateCategory::CourtPerHour, bucket);
        let non_member_revenue = non_member_hours * non_member_rate;

        Ok(CourtBucketRevenue {
            bucket,
            open_hours,
            utilization,
            utilized_hours,
            member_share,
            member_hours,
            non_member_hours,
            member_blended_rate,
            non_member_rate,
            tier_revenue,
            member_revenue,
            non_member_revenue,
            revenue: member_revenue + non_member_revenue,
        })
    }

    /// League revenue per week at a given fill rate
    pub fn league(&self, fill_rate: f64) -> Result<LeagueRevenue> {
        let lg = &self.config.league;
        let blocks = self.allocation.league_blocks;
        let seats = league_weekly_players(blocks, self.allocation.league_courts_used, lg.players_per_court, 1.0);
        let filled_seats = league_weekly_players(blocks, self.allocation.league_courts_used, lg.players_per_court, fill_rate);
        let member_seats = filled_seats * lg.member_share;
        let non_member_seats = filled_seats - member_seats;

        let weighted_member_price = weighted_member_league_price(&self.rates, &self.league_mix)?;
        let rack_price = self.rates.non_member_rate(RateCategory::LeaguePerCycle, Bucket::Prime);
        let revenue = (member_seats * weighted_member_price + non_member_seats * rack_price) / lg.cycle_weeks;

        Ok(LeagueRevenue {
            blocks,
            seats,
            filled_seats,
            member_seats,
            non_member_seats,
            weighted_member_price,
            rack_price,
            cycle_weeks: lg.cycle_weeks,
            revenue,
        })
    }

    pub fn corporate_week(&self) -> f64 {
        let corp = &self.config.corporate;
        self.allocation.corporate.prime * corp.prime_rate_per_court
            + self.allocation.corporate.offpeak * corp.offpeak_rate_per_court
    }

    pub fn tournament_week(&self) -> f64 {
        let t = &self.config.tournament;
        4.0 * t.per_quarter_revenue * t.sponsorship_share / 52.0
    }

    pub fn retail_week(&self) -> f64 {
        let r = &self.config.retail;
        12.0 * r.monthly_sales * r.gross_margin * r.revenue_share / 52.0
    }

    /// One week of revenue at the given levels, ceiling-checked
    pub fn weekly(&self, levels: &RampLevels) -> Result<WeeklyRevenue> {
        let court_prime = self.court_bucket(Bucket::Prime, levels.prime_utilization)?;
        let court_offpeak = self.court_bucket(Bucket::OffPeak, levels.offpeak_utilization)?;
        let league = self.league(levels.league_fill_rate)?;

        let channels = ChannelRevenue {
            court_prime: court_prime.revenue,
            court_offpeak: court_offpeak.revenue,
            league: league.revenue,
            corporate: self.corporate_week(),
            tournament: self.tournament_week(),
            retail: self.retail_week(),
        };

        let ceilings = self.ceilings(&channels, &court_prime, &court_offpeak);
        if let Some(violation) = ceilings.iter().find(|c| !c.holds()) {
            return Err(EngineError::RevenueCeilingViolation {
                channel: violation.channel.clone(),
                revenue: violation.revenue,
                ceiling: violation.ceiling,
            });
        }

        let alloc = self.allocation;
        let utilized_hours = court_prime.utilized_hours
            + court_offpeak.utilized_hours
            + alloc.league_prime_hours
            + alloc.corporate.total()
            + alloc.tournament.total();

        Ok(WeeklyRevenue { levels: *levels, channels, court_prime, court_offpeak, league, ceilings, utilized_hours })
    }

    fn ceilings(
        &self,
        channels: &ChannelRevenue,
        court_prime: &CourtBucketRevenue,
        court_offpeak: &CourtBucketRevenue,
    ) -> Vec<ChannelCeiling> {
        let lg = &self.config.league;
        let corp = &self.config.corporate;

        // Seat price per cycle → court-hour price for a full block
        let league_max_rate = if lg.block_hours() > 0.0 {
            self.rates.max_rate(RateCategory::LeaguePerCycle, Bucket::Prime) * lg.players_per_court as f64
                / lg.cycle_weeks
                / lg.block_hours()
        } else {
            0.0
        };

        vec![
            ChannelCeiling::hourly(
                "court_prime",
                channels.court_prime,
                court_prime.open_hours,
                self.rates.max_rate(RateCategory::CourtPerHour, Bucket::Prime),
            ),
            ChannelCeiling::hourly(
                "court_offpeak",
                channels.court_offpeak,
                court_offpeak.open_hours,
                self.rates.max_rate(RateCategory::CourtPerHour, Bucket::OffPeak),
            ),
            ChannelCeiling::hourly("league", channels.league, self.allocation.league_prime_hours, league_max_rate),
            ChannelCeiling::hourly(
                "corporate",
                channels.corporate,
                self.allocation.corporate.total(),
                corp.prime_rate_per_court.max(corp.offpeak_rate_per_court),
            ),
            ChannelCeiling::gross(
                "tournament",
                channels.tournament,
                4.0 * self.config.tournament.per_quarter_revenue / 52.0,
            ),
            ChannelCeiling::gross("retail", channels.retail, 12.0 * self.config.retail.monthly_sales / 52.0),
        ]
    }

    /// One projected month at its ramp levels
    pub fn month(&self, slot: &MonthSlot) -> Result<MonthlyRevenue> {
        let levels = RampLevels::for_month(self.config, self.offpeak.offpeak, slot.index);
        let week = self.weekly(&levels)?;
        let alloc = self.allocation;

        let channels = week.channels.scaled(slot.weeks, slot.league_weeks, 1.0);
        // Tournament and retail are not hour-based: spread the year evenly
        let channels = ChannelRevenue {
            tournament: week.channels.tournament * 52.0 / 12.0,
            retail: week.channels.retail * 52.0 / 12.0,
            ..channels
        };

        let non_league_hours = week.utilized_hours - alloc.league_prime_hours;
        let league_hours = alloc.league_prime_hours * slot.league_weeks;

        Ok(MonthlyRevenue {
            index: slot.index,
            month: slot.label.clone(),
            weeks: slot.weeks,
            league_weeks: slot.league_weeks,
            levels,
            booked: BookedRevenue::from(&channels),
            channels,
            league_players: monthly_normalized_players(
                week.league.filled_seats,
                slot.league_weeks,
                self.config.league.cycle_weeks,
            ),
            available_hours: alloc.total_hours * slot.weeks,
            prime_hours: alloc.prime_hours * slot.weeks,
            booked_prime_hours: league_hours + (alloc.corporate.prime + alloc.tournament.prime) * slot.weeks,
            utilized_hours: non_league_hours * slot.weeks + league_hours,
        })
    }

    /// Steady-state week, steady-state year and every projected month
    pub fn breakdown(&self) -> Result<RevenueBreakdown> {
        seasonality::reconcile(self.config)?;
        let weekly = self.weekly(&self.steady_levels())?;
        let annual = weekly.channels.scaled(52.0, self.config.league.active_weeks_per_year, 52.0);

        let monthly = seasonality::month_slots(self.config)?
            .iter()
            .map(|slot| self.month(slot))
            .collect::<Result<Vec<_>>>()?;

        debug!(
            "Weekly revenue: court {:.0}, league {:.0}, corporate {:.0}",
            weekly.channels.court(),
            weekly.channels.league,
            weekly.channels.corporate
        );
        info!("Steady-state variable revenue {:.0}/year", annual.total());

        Ok(RevenueBreakdown { offpeak_utilization: self.offpeak.clone(), weekly, annual, monthly })
    }
}

/// Revenue breakdown for a configuration and its allocation
pub fn compute(config: &FacilityConfig, allocation: &TimeAllocation) -> Result<RevenueBreakdown> {
    RevenueCalculator::new(config, allocation)?.breakdown()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::allocate;
    use crate::error::ConfigValidationError;

    fn default_breakdown() -> RevenueBreakdown {
        let config = FacilityConfig::default();
        let alloc = allocate(&config).unwrap();
        compute(&config, &alloc).unwrap()
    }

    #[test]
    fn test_league_players_scenario() {
        // 60 blocks × 4 courts × 4 players × 90% fill
        let weekly = league_weekly_players(60, 4, 4, 0.9);
        assert!((weekly - 864.0).abs() < 1e-9);
        let monthly = monthly_normalized_players(weekly, 4.33, 6.0);
        assert!((monthly - 624.0).abs() <= 5.0);
    }

    #[test]
    fn test_weighted_member_league_price() {
        let config = FacilityConfig::default();
        let rates = RateTable::from_config(&config);
        let price = weighted_member_league_price(&rates, &config.league_tier_mix()).unwrap();
        // 150 × (0.2 × 1.0 + 0.6 × 0.85 + 0.2 × 0.75)
        assert!((price - 129.0).abs() < 1e-9);
    }

    #[test]
    fn test_court_revenue_formula() {
        let config = FacilityConfig::default();
        let alloc = allocate(&config).unwrap();
        let calc = RevenueCalculator::new(&config, &alloc).unwrap();
        let prime = calc.court_bucket(Bucket::Prime, 0.95).unwrap();

        let blended = 0.2 * 56.0 + 0.6 * 36.0;
        let expected = alloc.open_prime_hours * 0.95 * (0.6 * blended + 0.4 * 65.0);
        assert!((prime.revenue - expected).abs() < 1e-6);
        assert!((prime.member_blended_rate - blended).abs() < 1e-9);
    }

    #[test]
    fn test_zero_priced_tiers_earn_exactly_zero() {
        let breakdown = default_breakdown();
        assert_eq!(breakdown.weekly.court_prime.tier_revenue["pro"], 0.0);
        assert_eq!(breakdown.weekly.court_offpeak.tier_revenue["pro"], 0.0);
        assert_eq!(breakdown.weekly.court_offpeak.tier_revenue["player"], 0.0);
        assert!(breakdown.weekly.court_prime.tier_revenue["player"] > 0.0);
    }

    #[test]
    fn test_ceilings_hold_for_defaults() {
        let breakdown = default_breakdown();
        assert_eq!(breakdown.weekly.ceilings.len(), 6);
        assert!(breakdown.weekly.ceilings.iter().all(|c| c.holds()));
    }

    #[test]
    fn test_annual_uses_active_league_weeks() {
        let breakdown = default_breakdown();
        assert!((breakdown.annual.league - breakdown.weekly.channels.league * 46.0).abs() < 1e-6);
        assert!((breakdown.annual.court_prime - breakdown.weekly.channels.court_prime * 52.0).abs() < 1e-6);
        assert!((breakdown.annual.retail - 12.0 * 3000.0 * 0.2 * 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_monthly_series_ramps_up() {
        let breakdown = default_breakdown();
        assert_eq!(breakdown.monthly.len(), 24);
        let first = &breakdown.monthly[0];
        let steady = &breakdown.monthly[8];
        assert!(first.levels.factor < 1.0);
        assert_eq!(steady.levels.factor, 1.0);
        assert!(first.channels.league / first.league_weeks < steady.channels.league / steady.league_weeks);
    }

    #[test]
    fn test_booked_months_are_whole_cents() {
        for month in default_breakdown().monthly {
            let booked = &month.booked;
            assert_eq!(booked.league, money(month.channels.league));
            assert_eq!(booked.court(), money(month.channels.court_prime) + money(month.channels.court_offpeak));
            assert_eq!(booked.total(), booked.total().round_dp(2));
        }
    }

    #[test]
    fn test_monthly_capacity_invariants() {
        for month in default_breakdown().monthly {
            assert!(month.booked_prime_hours <= month.prime_hours + 1e-9);
            assert!(month.utilized_hours <= month.available_hours + 1e-9);
        }
    }

    #[test]
    fn test_member_share_out_of_range() {
        let mut config = FacilityConfig::default();
        config.league.member_share = -0.1;
        let alloc = allocate(&FacilityConfig::default()).unwrap();
        assert!(matches!(
            compute(&config, &alloc),
            Err(EngineError::ConfigValidation(ConfigValidationError::InvalidFraction { .. }))
        ));
    }

    #[test]
    fn test_ceiling_violation_detected() {
        let ceiling = ChannelCeiling::hourly("court_prime", 101.0, 10.0, 10.0);
        assert!(!ceiling.holds());
        let ceiling = ChannelCeiling::hourly("court_prime", 100.0, 10.0, 10.0);
        assert!(ceiling.holds());
    }

    #[test]
    fn test_scaling_mismatch_is_fatal() {
        let mut config = FacilityConfig::default();
        config.league.active_weeks_per_year = 40.0;
        let alloc = allocate(&config).unwrap();
        assert!(matches!(compute(&config, &alloc), Err(EngineError::ScalingReconciliation { .. })));
    }
}
