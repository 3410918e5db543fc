//! Hour-by-hour breakdown of a computed run
//!
//! Only formats values already in the allocation and revenue breakdown; it
//! never recomputes them.

use std::fmt;

use crate::allocation::TimeAllocation;
use crate::rates::Bucket;
use crate::revenue::{CourtBucketRevenue, RevenueBreakdown};

/// Days used for the monthly column
const MONTH_VIEW_DAYS: f64 = 30.0;

pub struct DebugView<'a> {
    pub allocation: &'a TimeAllocation,
    pub revenue: &'a RevenueBreakdown,
}

impl<'a> DebugView<'a> {
    pub fn new(allocation: &'a TimeAllocation, revenue: &'a RevenueBreakdown) -> Self {
        Self { allocation, revenue }
    }

    fn court(&self, bucket: Bucket) -> &CourtBucketRevenue {
        match bucket {
            Bucket::Prime => &self.revenue.weekly.court_prime,
            Bucket::OffPeak => &self.revenue.weekly.court_offpeak,
        }
    }
}

fn row(f: &mut fmt::Formatter<'_>, label: &str, weekly: f64) -> fmt::Result {
    writeln!(f, "  {:<22} {:>10.1} {:>12.1}", label, weekly, weekly * MONTH_VIEW_DAYS / 7.0)
}

impl fmt::Display for DebugView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let alloc = self.allocation;
        writeln!(f, "Court-hours                  per week   per 30 days")?;
        row(f, "total", alloc.total_hours)?;
        for bucket in Bucket::ALL {
            writeln!(f, "{}", bucket)?;
            row(f, "supply", alloc.bucket_hours(bucket))?;
            if bucket == Bucket::Prime {
                row(f, "league", alloc.league_prime_hours)?;
            }
            row(f, "corporate", alloc.corporate.get(bucket))?;
            row(f, "tournament", alloc.tournament.get(bucket))?;
            row(f, "open play", alloc.open_hours(bucket))?;
        }
        writeln!(f, "  prime share            {:>9.1}%", alloc.prime_share() * 100.0)?;

        writeln!(f)?;
        writeln!(f, "Open play (steady state)")?;
        for bucket in Bucket::ALL {
            let court = self.court(bucket);
            writeln!(
                f,
                "  {:<9} util {:>5.1}%  member {:>7.1}h @ ${:>6.2}  non-member {:>7.1}h @ ${:>6.2}  = ${:>10.2}/wk",
                bucket.as_str(),
                court.utilization * 100.0,
                court.member_hours,
                court.member_blended_rate,
                court.non_member_hours,
                court.non_member_rate,
                court.revenue
            )?;
            for (tier, revenue) in &court.tier_revenue {
                writeln!(f, "      {:<12} ${:>10.2}", tier, revenue)?;
            }
        }
        writeln!(f, "  blended utilization    {:>9.1}%", self.revenue.offpeak_utilization.overall * 100.0)?;
        if let Some(warning) = &self.revenue.offpeak_utilization.warning {
            writeln!(f, "  note: {}", warning)?;
        }

        let league = &self.revenue.weekly.league;
        writeln!(f)?;
        writeln!(
            f,
            "League: {} blocks, {:.0}/{:.0} seats filled, member price ${:.2}, rack ${:.2}, ${:.2}/wk",
            league.blocks, league.filled_seats, league.seats, league.weighted_member_price, league.rack_price, league.revenue
        )?;

        writeln!(f)?;
        writeln!(f, "Ceilings (per week)")?;
        for ceiling in &self.revenue.weekly.ceilings {
            writeln!(f, "  {:<14} ${:>10.2} of ${:>10.2}", ceiling.channel, ceiling.revenue, ceiling.ceiling)?;
        }

        for warning in &alloc.warnings {
            writeln!(f, "warning: {}", warning.message)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::allocate;
    use crate::config::FacilityConfig;

    #[test]
    fn test_view_renders_computed_values() {
        let config = FacilityConfig::default();
        let alloc = allocate(&config).unwrap();
        let revenue = crate::revenue::compute(&config, &alloc).unwrap();
        let text = DebugView::new(&alloc, &revenue).to_string();

        assert!(text.contains("prime"));
        assert!(text.contains("off-peak"));
        assert!(text.contains("League: 14 blocks"));
        assert!(text.contains(&format!("{:.1}", alloc.open_prime_hours)));
        assert!(!text.contains("warning:"));
        assert!(text.contains(&format!("blended utilization    {:>9.1}%", revenue.offpeak_utilization.overall * 100.0)));
    }
}
