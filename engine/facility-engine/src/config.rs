//! Configuration for the facility projection engine
//!
//! A [`FacilityConfig`] is built once per run (defaults, a TOML file or the
//! environment) and passed by reference into [`crate::compute`]. Nothing in the
//! engine mutates it; sweeps clone it per variant.

use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::error::ConfigValidationError;

/// Tolerance for tier mixes summing to 1.0
pub const TIER_MIX_TOLERANCE: f64 = 1e-6;

/// Longest projection the engine accepts
pub const MAX_PROJECTION_MONTHS: u32 = 120;

/// Longest loan term the engine accepts
pub const MAX_LOAN_TERM_MONTHS: u32 = 600;

/// Complete input for one projection run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct FacilityConfig {
    /// Physical facility
    pub facility: FacilityLayout,

    /// Prime-time windows
    pub schedule: ScheduleConfig,

    /// Rack rates and member tiers
    pub pricing: PricingConfig,

    /// Open-play utilization and member share
    pub open_play: OpenPlayConfig,

    /// League programming
    pub league: LeagueConfig,

    /// Corporate events
    pub corporate: CorporateConfig,

    /// Tournaments and sponsorship
    pub tournament: TournamentConfig,

    /// Pro-shop revenue share
    pub retail: RetailConfig,

    /// Weekly-to-monthly scaling
    pub seasonality: SeasonalityConfig,

    /// Opening ramp of programs and utilization
    pub ramp: RampConfig,

    /// Operating cost structure
    pub costs: CostConfig,

    /// Capital structure, debt and tax
    pub financing: FinancingConfig,

    /// Membership growth curve
    pub membership: MembershipConfig,

    /// Legacy single-rate model used for historical validation
    pub reference: ReferenceFacility,

    /// Guardrail thresholds
    pub guardrails: GuardrailConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FacilityLayout {
    /// Number of courts
    pub courts: u32,

    /// Operating hours per day
    pub hours_per_day: f64,
}

/// A prime-time window on one weekday, in hours since midnight
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PrimeWindow {
    pub day: Weekday,

    /// Window opens (17.5 = 5:30 pm)
    pub start_hour: f64,

    /// Window closes; never before `start_hour`
    pub end_hour: f64,
}

impl PrimeWindow {
    pub fn new(day: Weekday, start_hour: f64, end_hour: f64) -> Self {
        Self { day, start_hour, end_hour }
    }

    /// Window length in hours, never negative
    pub fn hours(&self) -> f64 {
        (self.end_hour - self.start_hour).max(0.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Every prime window in a week; hours outside them are off-peak
    pub prime_windows: Vec<PrimeWindow>,
}

/// Member tier with per-person hourly rates
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TierDefinition {
    /// Tier key used by rate lookups and league overrides
    pub name: String,

    /// Per-person prime rate
    pub prime_rate_pp: f64,

    /// Per-person off-peak rate
    pub offpeak_rate_pp: f64,

    /// League discount off the rack price (0.15 = 15%)
    pub league_discount_pct: f64,

    /// Monthly dues
    pub monthly_fee: f64,

    /// Share of members on this tier
    pub mix: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NonMemberRates {
    /// Walk-in price per prime court-hour
    pub prime_per_court: f64,

    /// Walk-in price per off-peak court-hour
    pub offpeak_per_court: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PricingConfig {
    /// Converts per-person rates to per-court rates (4 = doubles)
    pub players_per_court: u32,

    /// Rack rates for non-members
    pub non_member: NonMemberRates,

    /// Member tiers; mixes must sum to 1.0
    pub tiers: Vec<TierDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OpenPlayConfig {
    /// Share of open prime hours that get played
    pub prime_utilization: f64,

    /// Fixed off-peak utilization; solved from the overall target when absent
    pub offpeak_utilization: Option<f64>,

    /// Blended open-play utilization the solver aims for
    pub target_overall_utilization: f64,

    /// Bounds applied to a solved off-peak utilization
    pub offpeak_min: f64,
    pub offpeak_max: f64,

    /// Share of played prime hours booked by members
    pub member_share_prime: f64,

    /// Share of played off-peak hours booked by members
    pub member_share_offpeak: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LeagueConfig {
    /// Fixed weekly blocks; derived from prime windows on `league_days` when absent
    pub blocks_per_week: Option<u32>,

    /// Days whose prime windows host league blocks
    pub league_days: Vec<Weekday>,

    /// Courts one league block occupies
    pub courts_used: u32,

    /// Seats per court in a league block
    pub players_per_court: u32,

    /// Play time per block
    pub session_hours: f64,

    /// Changeover between blocks
    pub buffer_minutes: f64,

    /// Share of league seats sold
    pub fill_rate: f64,

    /// League session length in weeks
    pub cycle_weeks: f64,

    /// Weeks with league play in a year
    pub active_weeks_per_year: f64,

    /// Non-member price per player per cycle
    pub rack_price_per_cycle: f64,

    /// Share of league players who are members
    pub member_share: f64,

    /// Tier mix among league members; overall member mix when absent
    pub tier_mix_override: Option<BTreeMap<String, f64>>,
}

impl LeagueConfig {
    /// One league block including changeover buffer
    pub fn block_hours(&self) -> f64 {
        self.session_hours + self.buffer_minutes / 60.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CorporateConfig {
    /// Events booked into prime time
    pub prime_events_per_year: f64,

    /// Events booked into off-peak time
    pub offpeak_events_per_year: f64,

    /// Length of one event
    pub hours_per_event: f64,

    /// Courts one event takes over
    pub courts_used: u32,

    /// Price per court-hour during prime time
    pub prime_rate_per_court: f64,

    /// Price per court-hour during off-peak time
    pub offpeak_rate_per_court: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TournamentConfig {
    /// Gross tournament revenue per quarter
    pub per_quarter_revenue: f64,

    /// Facility take of tournament revenue
    pub sponsorship_share: f64,

    /// Court-hours tournaments block out each quarter, by bucket
    pub prime_court_hours_per_quarter: f64,
    pub offpeak_court_hours_per_quarter: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetailConfig {
    /// Pro-shop gross sales per month
    pub monthly_sales: f64,

    /// Margin on those sales
    pub gross_margin: f64,

    /// Facility share of the margin
    pub revenue_share: f64,
}

/// Weekly-to-monthly scaling, indexed by calendar month (January first)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SeasonalityConfig {
    /// Calendar weeks per month (days ÷ 7)
    pub weeks_per_month: [f64; 12],

    /// Active league weeks per calendar month
    pub league_weeks_per_month: [f64; 12],
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RampConfig {
    /// Months until programs reach steady state
    pub months: u32,

    /// League fill in the first month
    pub fill_rate_floor: f64,

    /// Starting utilization as a fraction of the steady-state target
    pub prime_utilization_start: f64,
    pub offpeak_utilization_start: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CostConfig {
    /// Base rent in the first lease year
    pub rent_monthly: f64,

    /// Yearly rent increase (0.03 = 3%)
    pub rent_escalator: f64,

    /// Rent-free months at opening
    pub rent_abatement_months: u32,

    /// Utilities, insurance, salaried staff and the rest
    pub other_fixed_monthly: f64,

    /// Yearly increase of other fixed costs
    pub other_fixed_escalator: f64,

    /// Share of variable (non-membership) revenue
    pub variable_cost_pct: f64,

    /// Desk and coaching cost per utilized court-hour
    pub staff_cost_per_utilized_hour: f64,
}

/// Capitalized use of funds
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CapexItem {
    pub name: String,

    /// Amount spent before opening
    pub amount: f64,

    /// Straight-line depreciation period
    pub useful_life_months: u32,
}

impl CapexItem {
    pub fn new(name: &str, amount: f64, useful_life_months: u32) -> Self {
        Self { name: name.to_string(), amount, useful_life_months }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FinancingConfig {
    /// Capitalized uses of funds
    pub capex: Vec<CapexItem>,

    /// Cash left on the balance sheet at opening
    pub working_capital_reserve: f64,

    /// Cash contributed by the owners
    pub owner_equity: f64,

    /// Landlord tenant-improvement allowance
    pub ti_allowance: f64,

    /// Fixed loan amount; sized to balance sources and uses when absent
    pub loan_amount: Option<f64>,

    /// Annual percentage rate, compounded monthly
    pub apr: f64,

    /// Amortization period, at most [`MAX_LOAN_TERM_MONTHS`]
    pub term_months: u32,

    /// Flat income tax rate
    pub tax_rate: f64,

    /// Losses available to offset income in the first month
    pub nol_carryforward_start: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MembershipConfig {
    /// Opening day; month labels count from here
    pub start_date: NaiveDate,

    /// Projection horizon
    pub months: u32,

    /// Founding members at opening
    pub start_members: u32,

    /// Asymptote of the S-curve
    pub target_members: u32,

    /// Hard ceiling applied every month
    pub member_cap: u32,

    /// Steepness of the S-curve
    pub growth_rate: f64,

    /// Month index where the S-curve reaches half the target
    pub midpoint_month: f64,
}

/// The single-rate facility the historical actuals were recorded against
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReferenceFacility {
    pub courts: u32,
    pub hours_per_day: f64,

    /// Mature membership before the cap
    pub members: u32,

    /// Regular non-member players
    pub non_members: u32,

    /// Single membership price
    pub monthly_fee: f64,

    /// Hourly court rates at regular and prime times
    pub member_rate: f64,
    pub non_member_rate: f64,

    /// Hourly court rates in the early-bird slot
    pub early_bird_member_rate: f64,
    pub early_bird_non_member_rate: f64,

    /// Split of booked hours across early-bird, regular and prime slots
    pub early_bird_share: f64,
    pub regular_share: f64,
    pub prime_share: f64,

    /// Court-hours each player books per month
    pub member_hours_per_month: f64,
    pub non_member_hours_per_month: f64,

    /// Flat monthly lines outside court rental
    pub programming_monthly: f64,
    pub ancillary_monthly: f64,

    /// Months the legacy ramp takes to reach mature volume
    pub months_to_peak: u32,

    /// Opening volume as a fraction of mature volume
    pub starting_capacity: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GuardrailConfig {
    /// RevPACH watchlist band
    pub revpach_min: f64,
    pub revpach_max: f64,

    /// Allowed drift of league weeks per projection year
    pub league_weeks_tolerance: f64,

    /// Largest balance-sheet or sources/uses gap still treated as balanced
    pub balance_tolerance: f64,

    /// Debt-service coverage below this warns
    pub min_dscr: f64,
}

impl Default for FacilityLayout {
    fn default() -> Self {
        Self { courts: 4, hours_per_day: 14.0 }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        let mut prime_windows = Vec::new();
        for day in [Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu] {
            prime_windows.push(PrimeWindow::new(day, 16.0, 22.0));
        }
        prime_windows.push(PrimeWindow::new(Weekday::Fri, 16.0, 21.0));
        prime_windows.push(PrimeWindow::new(Weekday::Sat, 8.0, 12.0));
        prime_windows.push(PrimeWindow::new(Weekday::Sun, 8.0, 12.0));
        Self { prime_windows }
    }
}

impl Default for NonMemberRates {
    fn default() -> Self {
        Self { prime_per_court: 65.0, offpeak_per_court: 56.0 }
    }
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            players_per_court: 4,
            non_member: NonMemberRates::default(),
            tiers: vec![
                TierDefinition {
                    name: "community".to_string(),
                    prime_rate_pp: 14.0,
                    offpeak_rate_pp: 11.0,
                    league_discount_pct: 0.0,
                    monthly_fee: 0.0,
                    mix: 0.20,
                },
                TierDefinition {
                    name: "player".to_string(),
                    prime_rate_pp: 9.0,
                    offpeak_rate_pp: 0.0, // included in dues
                    league_discount_pct: 0.15,
                    monthly_fee: 99.0,
                    mix: 0.60,
                },
                TierDefinition {
                    name: "pro".to_string(),
                    prime_rate_pp: 0.0,
                    offpeak_rate_pp: 0.0,
                    league_discount_pct: 0.25,
                    monthly_fee: 189.0,
                    mix: 0.20,
                },
            ],
        }
    }
}

impl Default for OpenPlayConfig {
    fn default() -> Self {
        Self {
            prime_utilization: 0.95,
            offpeak_utilization: None,
            target_overall_utilization: 0.73,
            offpeak_min: 0.45,
            offpeak_max: 0.80,
            member_share_prime: 0.60,
            member_share_offpeak: 0.60,
        }
    }
}

impl Default for LeagueConfig {
    fn default() -> Self {
        Self {
            blocks_per_week: None,
            league_days: vec![Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Sat],
            courts_used: 4,
            players_per_court: 4,
            session_hours: 1.5,
            buffer_minutes: 10.0,
            fill_rate: 0.90,
            cycle_weeks: 6.0,
            active_weeks_per_year: 46.0,
            rack_price_per_cycle: 150.0,
            member_share: 0.30,
            tier_mix_override: None,
        }
    }
}

impl Default for CorporateConfig {
    fn default() -> Self {
        Self {
            prime_events_per_year: 0.0,
            offpeak_events_per_year: 32.0,
            hours_per_event: 6.0,
            courts_used: 4,
            prime_rate_per_court: 200.0,
            offpeak_rate_per_court: 170.0,
        }
    }
}

impl Default for TournamentConfig {
    fn default() -> Self {
        Self {
            per_quarter_revenue: 9000.0,
            sponsorship_share: 0.40,
            prime_court_hours_per_quarter: 0.0,
            offpeak_court_hours_per_quarter: 0.0,
        }
    }
}

impl Default for RetailConfig {
    fn default() -> Self {
        Self { monthly_sales: 3000.0, gross_margin: 0.20, revenue_share: 0.40 }
    }
}

impl Default for SeasonalityConfig {
    fn default() -> Self {
        const DAYS: [f64; 12] = [31.0, 28.0, 31.0, 30.0, 31.0, 30.0, 31.0, 31.0, 30.0, 31.0, 30.0, 31.0];
        Self {
            weeks_per_month: DAYS.map(|d| d / 7.0),
            league_weeks_per_month: [4.0, 4.0, 4.0, 4.0, 4.0, 3.5, 3.5, 4.0, 4.0, 4.0, 4.0, 3.0],
        }
    }
}

impl Default for RampConfig {
    fn default() -> Self {
        Self {
            months: 6,
            fill_rate_floor: 0.60,
            prime_utilization_start: 0.60,
            offpeak_utilization_start: 0.70,
        }
    }
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            rent_monthly: 37_000.0,
            rent_escalator: 0.03,
            rent_abatement_months: 0,
            other_fixed_monthly: 23_000.0,
            other_fixed_escalator: 0.03,
            variable_cost_pct: 0.15,
            staff_cost_per_utilized_hour: 5.0,
        }
    }
}

impl Default for FinancingConfig {
    fn default() -> Self {
        Self {
            capex: vec![
                CapexItem::new("leasehold_improvements", 994_000.0, 120),
                CapexItem::new("equipment", 220_000.0, 84),
                CapexItem::new("contingency", 99_400.0, 120),
                CapexItem::new("pre_opening", 50_000.0, 60),
            ],
            working_capital_reserve: 200_000.0,
            owner_equity: 200_000.0,
            ti_allowance: 25.0 * 17_139.0, // $25/sf
            loan_amount: None,
            apr: 0.09,
            term_months: 120,
            tax_rate: 0.21,
            nol_carryforward_start: 0.0,
        }
    }
}

impl Default for MembershipConfig {
    fn default() -> Self {
        Self {
            start_date: NaiveDate::from_ymd_opt(2026, 8, 1).unwrap_or_default(),
            months: 24,
            start_members: 50,
            target_members: 350,
            member_cap: 350,
            growth_rate: 0.35,
            midpoint_month: 8.0,
        }
    }
}

impl Default for ReferenceFacility {
    fn default() -> Self {
        Self {
            courts: 12,
            hours_per_day: 15.0,
            members: 370,
            non_members: 150,
            monthly_fee: 68.0,
            member_rate: 6.0,
            non_member_rate: 10.0,
            early_bird_member_rate: 3.75,
            early_bird_non_member_rate: 5.0,
            early_bird_share: 0.15,
            regular_share: 0.40,
            prime_share: 0.45,
            member_hours_per_month: 11.0,
            non_member_hours_per_month: 4.0,
            programming_monthly: 38_000.0,
            ancillary_monthly: 32_000.0,
            months_to_peak: 12,
            starting_capacity: 0.40,
        }
    }
}

impl Default for GuardrailConfig {
    fn default() -> Self {
        Self {
            revpach_min: 25.0,
            revpach_max: 35.0,
            league_weeks_tolerance: 1.0,
            balance_tolerance: 1e-2,
            min_dscr: 1.25,
        }
    }
}

fn check_fraction(field: &str, value: f64) -> Result<(), ConfigValidationError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigValidationError::InvalidFraction { field: field.to_string(), value });
    }
    Ok(())
}

fn check_non_negative(field: &str, value: f64) -> Result<(), ConfigValidationError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigValidationError::invalid(field, format!("must be a finite non-negative number, got {value}")));
    }
    Ok(())
}

fn check_positive(field: &str, value: f64) -> Result<(), ConfigValidationError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ConfigValidationError::invalid(field, format!("must be positive, got {value}")));
    }
    Ok(())
}

fn check_mix_sum(scope: &str, sum: f64) -> Result<(), ConfigValidationError> {
    if (sum - 1.0).abs() > TIER_MIX_TOLERANCE {
        return Err(ConfigValidationError::TierMix { scope: scope.to_string(), sum });
    }
    Ok(())
}

impl FacilityConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: FacilityConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file(&self, path: &str) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Defaults overlaid with `FACILITY_*` environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        let mut config = Self::default();

        if let Ok(courts) = std::env::var("FACILITY_COURTS") {
            config.facility.courts = courts.parse().unwrap_or(config.facility.courts);
        }

        if let Ok(hours) = std::env::var("FACILITY_HOURS_PER_DAY") {
            config.facility.hours_per_day = hours.parse().unwrap_or(config.facility.hours_per_day);
        }

        if let Ok(cap) = std::env::var("FACILITY_MEMBER_CAP") {
            config.membership.member_cap = cap.parse().unwrap_or(config.membership.member_cap);
        }

        if let Ok(apr) = std::env::var("FACILITY_LOAN_APR") {
            config.financing.apr = apr.parse().unwrap_or(config.financing.apr);
        }

        Ok(config)
    }

    /// Look up a tier by name
    pub fn tier(&self, name: &str) -> Option<&TierDefinition> {
        self.pricing.tiers.iter().find(|t| t.name == name)
    }

    /// Tier mix used for league members, falling back to the overall member mix
    pub fn league_tier_mix(&self) -> BTreeMap<String, f64> {
        match &self.league.tier_mix_override {
            Some(mix) => mix.clone(),
            None => self.pricing.tiers.iter().map(|t| (t.name.clone(), t.mix)).collect(),
        }
    }

    /// Run every configuration-time check
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        self.validate_facility()?;
        self.validate_pricing()?;
        self.validate_programs()?;
        self.validate_costs_and_financing()?;
        self.validate_membership()?;
        Ok(())
    }

    fn validate_facility(&self) -> Result<(), ConfigValidationError> {
        if self.facility.courts == 0 {
            return Err(ConfigValidationError::invalid("facility.courts", "at least one court is required"));
        }
        let hpd = self.facility.hours_per_day;
        if !(hpd > 0.0 && hpd <= 24.0) {
            return Err(ConfigValidationError::invalid("facility.hours_per_day", format!("must be in (0, 24], got {hpd}")));
        }

        let mut per_day: BTreeMap<u32, f64> = BTreeMap::new();
        for window in &self.schedule.prime_windows {
            if !window.start_hour.is_finite() || !window.end_hour.is_finite() || window.end_hour < window.start_hour {
                return Err(ConfigValidationError::invalid(
                    "schedule.prime_windows",
                    format!("{} window {}–{} ends before it starts", window.day, window.start_hour, window.end_hour),
                ));
            }
            *per_day.entry(window.day.num_days_from_monday()).or_insert(0.0) += window.hours();
        }
        if let Some((day, hours)) = per_day.iter().find(|(_, h)| **h > hpd + 1e-9) {
            return Err(ConfigValidationError::invalid(
                "schedule.prime_windows",
                format!("day {day} has {hours} prime hours but the facility opens {hpd} hours"),
            ));
        }
        Ok(())
    }

    fn validate_pricing(&self) -> Result<(), ConfigValidationError> {
        if self.pricing.players_per_court == 0 {
            return Err(ConfigValidationError::invalid("pricing.players_per_court", "must be at least 1"));
        }
        if self.pricing.tiers.is_empty() {
            return Err(ConfigValidationError::invalid("pricing.tiers", "at least one tier is required"));
        }
        check_non_negative("pricing.non_member.prime_per_court", self.pricing.non_member.prime_per_court)?;
        check_non_negative("pricing.non_member.offpeak_per_court", self.pricing.non_member.offpeak_per_court)?;

        let mut seen = HashSet::new();
        for tier in &self.pricing.tiers {
            if !seen.insert(tier.name.as_str()) {
                return Err(ConfigValidationError::invalid("pricing.tiers", format!("duplicate tier {}", tier.name)));
            }
            check_non_negative(&format!("tier {} prime_rate_pp", tier.name), tier.prime_rate_pp)?;
            check_non_negative(&format!("tier {} offpeak_rate_pp", tier.name), tier.offpeak_rate_pp)?;
            check_non_negative(&format!("tier {} monthly_fee", tier.name), tier.monthly_fee)?;
            check_fraction(&format!("tier {} league_discount_pct", tier.name), tier.league_discount_pct)?;
            check_fraction(&format!("tier {} mix", tier.name), tier.mix)?;
        }
        check_mix_sum("member", self.pricing.tiers.iter().map(|t| t.mix).sum())?;

        if let Some(mix) = &self.league.tier_mix_override {
            for (name, share) in mix {
                if self.tier(name).is_none() {
                    return Err(ConfigValidationError::UnknownTier(name.clone()));
                }
                check_fraction(&format!("league tier mix {name}"), *share)?;
            }
            check_mix_sum("league", mix.values().sum())?;
        }

        let op = &self.open_play;
        check_fraction("open_play.prime_utilization", op.prime_utilization)?;
        if let Some(off) = op.offpeak_utilization {
            check_fraction("open_play.offpeak_utilization", off)?;
        }
        check_fraction("open_play.target_overall_utilization", op.target_overall_utilization)?;
        check_fraction("open_play.offpeak_min", op.offpeak_min)?;
        check_fraction("open_play.offpeak_max", op.offpeak_max)?;
        if op.offpeak_min > op.offpeak_max {
            return Err(ConfigValidationError::invalid("open_play.offpeak_min", "exceeds offpeak_max"));
        }
        check_fraction("open_play.member_share_prime", op.member_share_prime)?;
        check_fraction("open_play.member_share_offpeak", op.member_share_offpeak)?;
        Ok(())
    }

    fn validate_programs(&self) -> Result<(), ConfigValidationError> {
        let lg = &self.league;
        // Schedule-derived leagues are auto-fitted at allocation time
        if lg.blocks_per_week.is_some() && lg.courts_used > self.facility.courts {
            return Err(ConfigValidationError::invalid(
                "league.courts_used",
                format!("{} courts requested but the facility has {}", lg.courts_used, self.facility.courts),
            ));
        }
        if lg.players_per_court == 0 {
            return Err(ConfigValidationError::invalid("league.players_per_court", "must be at least 1"));
        }
        check_positive("league.session_hours", lg.session_hours)?;
        check_non_negative("league.buffer_minutes", lg.buffer_minutes)?;
        check_positive("league.cycle_weeks", lg.cycle_weeks)?;
        check_non_negative("league.active_weeks_per_year", lg.active_weeks_per_year)?;
        check_non_negative("league.rack_price_per_cycle", lg.rack_price_per_cycle)?;
        check_fraction("league.fill_rate", lg.fill_rate)?;
        check_fraction("league.member_share", lg.member_share)?;

        let corp = &self.corporate;
        if corp.courts_used > self.facility.courts {
            return Err(ConfigValidationError::invalid("corporate.courts_used", "exceeds facility courts"));
        }
        check_non_negative("corporate.prime_events_per_year", corp.prime_events_per_year)?;
        check_non_negative("corporate.offpeak_events_per_year", corp.offpeak_events_per_year)?;
        check_non_negative("corporate.hours_per_event", corp.hours_per_event)?;
        check_non_negative("corporate.prime_rate_per_court", corp.prime_rate_per_court)?;
        check_non_negative("corporate.offpeak_rate_per_court", corp.offpeak_rate_per_court)?;

        let t = &self.tournament;
        check_non_negative("tournament.per_quarter_revenue", t.per_quarter_revenue)?;
        check_fraction("tournament.sponsorship_share", t.sponsorship_share)?;
        check_non_negative("tournament.prime_court_hours_per_quarter", t.prime_court_hours_per_quarter)?;
        check_non_negative("tournament.offpeak_court_hours_per_quarter", t.offpeak_court_hours_per_quarter)?;

        check_non_negative("retail.monthly_sales", self.retail.monthly_sales)?;
        check_fraction("retail.gross_margin", self.retail.gross_margin)?;
        check_fraction("retail.revenue_share", self.retail.revenue_share)?;

        for (i, w) in self.seasonality.weeks_per_month.iter().enumerate() {
            check_non_negative(&format!("seasonality.weeks_per_month[{i}]"), *w)?;
        }
        for (i, w) in self.seasonality.league_weeks_per_month.iter().enumerate() {
            check_non_negative(&format!("seasonality.league_weeks_per_month[{i}]"), *w)?;
        }

        check_fraction("ramp.fill_rate_floor", self.ramp.fill_rate_floor)?;
        check_fraction("ramp.prime_utilization_start", self.ramp.prime_utilization_start)?;
        check_fraction("ramp.offpeak_utilization_start", self.ramp.offpeak_utilization_start)?;
        Ok(())
    }

    fn validate_costs_and_financing(&self) -> Result<(), ConfigValidationError> {
        let c = &self.costs;
        check_non_negative("costs.rent_monthly", c.rent_monthly)?;
        check_fraction("costs.rent_escalator", c.rent_escalator)?;
        check_non_negative("costs.other_fixed_monthly", c.other_fixed_monthly)?;
        check_fraction("costs.other_fixed_escalator", c.other_fixed_escalator)?;
        check_fraction("costs.variable_cost_pct", c.variable_cost_pct)?;
        check_non_negative("costs.staff_cost_per_utilized_hour", c.staff_cost_per_utilized_hour)?;

        let f = &self.financing;
        for item in &f.capex {
            check_non_negative(&format!("capex {} amount", item.name), item.amount)?;
            if item.useful_life_months == 0 {
                return Err(ConfigValidationError::invalid(format!("capex {} useful_life_months", item.name), "must be at least 1"));
            }
        }
        check_non_negative("financing.working_capital_reserve", f.working_capital_reserve)?;
        check_non_negative("financing.owner_equity", f.owner_equity)?;
        check_non_negative("financing.ti_allowance", f.ti_allowance)?;
        if let Some(loan) = f.loan_amount {
            check_non_negative("financing.loan_amount", loan)?;
        }
        check_fraction("financing.apr", f.apr)?;
        if f.term_months == 0 || f.term_months > MAX_LOAN_TERM_MONTHS {
            return Err(ConfigValidationError::invalid(
                "financing.term_months",
                format!("must be within 1..={MAX_LOAN_TERM_MONTHS}, got {}", f.term_months),
            ));
        }
        check_fraction("financing.tax_rate", f.tax_rate)?;
        check_non_negative("financing.nol_carryforward_start", f.nol_carryforward_start)?;
        Ok(())
    }

    fn validate_membership(&self) -> Result<(), ConfigValidationError> {
        let m = &self.membership;
        if m.months == 0 || m.months > MAX_PROJECTION_MONTHS {
            return Err(ConfigValidationError::invalid(
                "membership.months",
                format!("must be within 1..={MAX_PROJECTION_MONTHS}, got {}", m.months),
            ));
        }
        if m.target_members == 0 {
            return Err(ConfigValidationError::invalid("membership.target_members", "must be positive"));
        }
        check_positive("membership.growth_rate", m.growth_rate)?;
        if !m.midpoint_month.is_finite() {
            return Err(ConfigValidationError::invalid("membership.midpoint_month", "must be finite"));
        }
        check_fraction("reference.starting_capacity", self.reference.starting_capacity)?;
        Ok(())
    }
}
