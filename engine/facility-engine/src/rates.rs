//! Rate table: (category, tier, bucket) → unit price
//!
//! Member rates are quoted per person per hour but consumed per court-hour, so the
//! table converts them once with [`per_court`]. League prices are per player per
//! cycle with each tier's discount applied.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::config::FacilityConfig;
use crate::error::{ConfigValidationError, EngineError, Result};

/// Time bucket a court-hour falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Bucket {
    Prime,
    OffPeak,
}

impl Bucket {
    pub const ALL: [Bucket; 2] = [Bucket::Prime, Bucket::OffPeak];

    pub fn as_str(&self) -> &'static str {
        match self {
            Bucket::Prime => "prime",
            Bucket::OffPeak => "off-peak",
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Bucket {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "prime" => Ok(Bucket::Prime),
            "off-peak" | "offpeak" => Ok(Bucket::OffPeak),
            other => Err(ConfigValidationError::UnknownBucket(other.to_string()).into()),
        }
    }
}

/// What a rate is charged for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RateCategory {
    /// Open-play court rental, per court-hour
    CourtPerHour,
    /// League seat, per player per cycle
    LeaguePerCycle,
}

/// Convert a per-person rate to a per-court rate
pub fn per_court(rate_pp: f64, players_per_court: u32) -> f64 {
    rate_pp * players_per_court as f64
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TierRates {
    pub prime_per_court: f64,
    pub offpeak_per_court: f64,
    pub league_per_cycle: f64,
}

/// Immutable price lookup built from a [`FacilityConfig`]
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RateTable {
    tiers: BTreeMap<String, TierRates>,
    non_member_prime: f64,
    non_member_offpeak: f64,
    league_rack: f64,
    players_per_court: u32,
}

impl RateTable {
    pub fn from_config(config: &FacilityConfig) -> Self {
        let ppc = config.pricing.players_per_court;
        let rack = config.league.rack_price_per_cycle;
        let tiers = config
            .pricing
            .tiers
            .iter()
            .map(|t| {
                (
                    t.name.clone(),
                    TierRates {
                        prime_per_court: per_court(t.prime_rate_pp, ppc),
                        offpeak_per_court: per_court(t.offpeak_rate_pp, ppc),
                        league_per_cycle: rack * (1.0 - t.league_discount_pct),
                    },
                )
            })
            .collect();

        Self {
            tiers,
            non_member_prime: config.pricing.non_member.prime_per_court,
            non_member_offpeak: config.pricing.non_member.offpeak_per_court,
            league_rack: rack,
            players_per_court: ppc,
        }
    }

    /// Member price for a tier
    pub fn rate(&self, category: RateCategory, tier: &str, bucket: Bucket) -> Result<f64> {
        let rates = self
            .tiers
            .get(tier)
            .ok_or_else(|| ConfigValidationError::UnknownTier(tier.to_string()))?;
        Ok(match (category, bucket) {
            (RateCategory::CourtPerHour, Bucket::Prime) => rates.prime_per_court,
            (RateCategory::CourtPerHour, Bucket::OffPeak) => rates.offpeak_per_court,
            (RateCategory::LeaguePerCycle, _) => rates.league_per_cycle,
        })
    }

    /// Same as [`RateTable::rate`] with the bucket given by name
    pub fn lookup(&self, category: RateCategory, tier: &str, bucket: &str) -> Result<f64> {
        let bucket: Bucket = bucket.parse()?;
        self.rate(category, tier, bucket)
    }

    /// Rack rate charged to non-members
    pub fn non_member_rate(&self, category: RateCategory, bucket: Bucket) -> f64 {
        match (category, bucket) {
            (RateCategory::CourtPerHour, Bucket::Prime) => self.non_member_prime,
            (RateCategory::CourtPerHour, Bucket::OffPeak) => self.non_member_offpeak,
            (RateCategory::LeaguePerCycle, _) => self.league_rack,
        }
    }

    /// Highest price any payer can be charged
    pub fn max_rate(&self, category: RateCategory, bucket: Bucket) -> f64 {
        self.tiers
            .keys()
            .filter_map(|name| self.rate(category, name, bucket).ok())
            .fold(self.non_member_rate(category, bucket), f64::max)
    }

    /// Mix-weighted member price: Σ mix_i × rate_i
    pub fn blended_member_rate(
        &self,
        category: RateCategory,
        bucket: Bucket,
        mix: &BTreeMap<String, f64>,
    ) -> Result<f64> {
        let mut blended = 0.0;
        for (tier, share) in mix {
            blended += share * self.rate(category, tier, bucket)?;
        }
        Ok(blended)
    }

    /// (tier, bucket) pairs whose court rate is exactly zero
    pub fn zero_priced(&self) -> Vec<(String, Bucket)> {
        let mut zero = Vec::new();
        for (name, rates) in &self.tiers {
            if rates.prime_per_court == 0.0 {
                zero.push((name.clone(), Bucket::Prime));
            }
            if rates.offpeak_per_court == 0.0 {
                zero.push((name.clone(), Bucket::OffPeak));
            }
        }
        zero
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RateTable {
        RateTable::from_config(&FacilityConfig::default())
    }

    #[test]
    fn test_bucket_parsing() {
        assert_eq!("prime".parse::<Bucket>().unwrap(), Bucket::Prime);
        assert_eq!("off-peak".parse::<Bucket>().unwrap(), Bucket::OffPeak);
        assert_eq!("OffPeak".parse::<Bucket>().unwrap(), Bucket::OffPeak);
        let err = "weekend".parse::<Bucket>().unwrap_err();
        assert_eq!(
            err,
            EngineError::ConfigValidation(ConfigValidationError::UnknownBucket("weekend".to_string()))
        );
    }

    #[test]
    fn test_per_person_rates_converted_per_court() {
        let rates = table();
        // community: $14 pp prime, $11 pp off-peak, doubles
        assert_eq!(rates.rate(RateCategory::CourtPerHour, "community", Bucket::Prime).unwrap(), 56.0);
        assert_eq!(rates.rate(RateCategory::CourtPerHour, "community", Bucket::OffPeak).unwrap(), 44.0);
        assert_eq!(rates.lookup(RateCategory::CourtPerHour, "player", "prime").unwrap(), 36.0);
    }

    #[test]
    fn test_league_prices_apply_tier_discount() {
        let rates = table();
        assert_eq!(rates.rate(RateCategory::LeaguePerCycle, "community", Bucket::Prime).unwrap(), 150.0);
        assert!((rates.rate(RateCategory::LeaguePerCycle, "player", Bucket::Prime).unwrap() - 127.5).abs() < 1e-9);
        assert!((rates.rate(RateCategory::LeaguePerCycle, "pro", Bucket::OffPeak).unwrap() - 112.5).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_tier_and_bucket() {
        let rates = table();
        assert!(matches!(
            rates.rate(RateCategory::CourtPerHour, "gold", Bucket::Prime),
            Err(EngineError::ConfigValidation(ConfigValidationError::UnknownTier(_)))
        ));
        assert!(matches!(
            rates.lookup(RateCategory::CourtPerHour, "pro", "midday"),
            Err(EngineError::ConfigValidation(ConfigValidationError::UnknownBucket(_)))
        ));
    }

    #[test]
    fn test_max_rate_includes_rack() {
        let rates = table();
        assert_eq!(rates.max_rate(RateCategory::CourtPerHour, Bucket::Prime), 65.0);
        assert_eq!(rates.max_rate(RateCategory::CourtPerHour, Bucket::OffPeak), 56.0);
        assert_eq!(rates.max_rate(RateCategory::LeaguePerCycle, Bucket::Prime), 150.0);
    }

    #[test]
    fn test_blended_member_rate() {
        let config = FacilityConfig::default();
        let rates = table();
        let blended = rates
            .blended_member_rate(RateCategory::CourtPerHour, Bucket::Prime, &config.league_tier_mix())
            .unwrap();
        // 0.2 * 56 + 0.6 * 36 + 0.2 * 0
        assert!((blended - 32.8).abs() < 1e-9);
    }

    #[test]
    fn test_zero_priced_tiers_listed() {
        let zero = table().zero_priced();
        assert!(zero.contains(&("player".to_string(), Bucket::OffPeak)));
        assert!(zero.contains(&("pro".to_string(), Bucket::Prime)));
        assert!(zero.contains(&("pro".to_string(), Bucket::OffPeak)));
        assert_eq!(zero.len(), 3);
    }
}
