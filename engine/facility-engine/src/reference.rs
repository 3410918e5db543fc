//! Legacy single-rate facility model
//!
//! Historical actuals were recorded against a simpler model: one membership
//! price, one member court rate and one non-member court rate with an
//! early-bird discount. It is kept so projected series can be checked against
//! the numbers those actuals were validated with.

use serde::Serialize;

use crate::config::ReferenceFacility;

/// One month of the legacy model
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LegacyMonth {
    /// Members after the cap
    pub members: u32,
    pub membership_revenue: f64,
    pub member_court_revenue: f64,
    pub non_member_court_revenue: f64,
    pub programming: f64,
    pub ancillary: f64,
    pub total_hours: f64,

    /// Booked hours over monthly capacity, at most 1.0
    pub utilization: f64,
}

impl LegacyMonth {
    pub fn court_revenue(&self) -> f64 {
        self.member_court_revenue + self.non_member_court_revenue
    }

    pub fn total(&self) -> f64 {
        self.membership_revenue + self.court_revenue() + self.programming + self.ancillary
    }
}

/// Blended hourly rate across early-bird, regular and prime shares
fn blended_rate(reference: &ReferenceFacility, early_bird_rate: f64, rate: f64) -> f64 {
    reference.early_bird_share * early_bird_rate + (reference.regular_share + reference.prime_share) * rate
}

/// Monthly revenue of the legacy model with membership clamped at `member_cap`
///
/// `growth_factor` scales every volume-driven line (1.0 = mature facility).
pub fn legacy_monthly_revenue(reference: &ReferenceFacility, member_cap: u32, growth_factor: f64) -> LegacyMonth {
    let members = reference.members.min(member_cap);
    let member_hours = members as f64 * reference.member_hours_per_month;
    let non_member_hours = reference.non_members as f64 * reference.non_member_hours_per_month;

    let member_rate = blended_rate(reference, reference.early_bird_member_rate, reference.member_rate);
    let non_member_rate = blended_rate(reference, reference.early_bird_non_member_rate, reference.non_member_rate);

    let total_hours = (member_hours + non_member_hours) * growth_factor;
    let capacity = reference.courts as f64 * reference.hours_per_day * 30.0;
    let utilization = if capacity > 0.0 { (total_hours / capacity).min(1.0) } else { 0.0 };

    LegacyMonth {
        members,
        membership_revenue: members as f64 * reference.monthly_fee * growth_factor,
        member_court_revenue: member_hours * member_rate * growth_factor,
        non_member_court_revenue: non_member_hours * non_member_rate * growth_factor,
        programming: reference.programming_monthly * growth_factor,
        ancillary: reference.ancillary_monthly * growth_factor,
        total_hours,
        utilization,
    }
}

/// Opening ramp of the legacy model
///
/// Grows from `starting_capacity` (fraction of mature volume) along a 1.5-power
/// curve until `months_to_peak`, then holds at peak with a ±5% seasonal swing,
/// capped at 1.1.
pub fn legacy_growth_factor(month: u32, months_to_peak: u32, starting_capacity: f64) -> f64 {
    if months_to_peak > 0 && month <= months_to_peak {
        let progress = month as f64 / months_to_peak as f64;
        starting_capacity + (1.0 - starting_capacity) * progress.powf(1.5)
    } else {
        let seasonal = 1.0 + 0.05 * ((month as f64 - months_to_peak as f64) * std::f64::consts::PI / 6.0).sin();
        seasonal.min(1.1)
    }
}

/// Month `m` of the legacy model on its configured opening ramp
pub fn legacy_ramp_month(reference: &ReferenceFacility, member_cap: u32, month: u32) -> LegacyMonth {
    let factor = legacy_growth_factor(month, reference.months_to_peak, reference.starting_capacity);
    legacy_monthly_revenue(reference, member_cap, factor)
}
