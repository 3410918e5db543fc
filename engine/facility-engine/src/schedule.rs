//! Weekly court-hour supply derived from the facility schedule

use chrono::Weekday;

use crate::config::{FacilityConfig, FacilityLayout, LeagueConfig, ScheduleConfig};

/// Court-hours the facility is open per week
pub fn total_court_hours_week(facility: &FacilityLayout) -> f64 {
    facility.courts as f64 * facility.hours_per_day * 7.0
}

/// Prime court-hours per week across all configured windows
pub fn prime_hours_week(facility: &FacilityLayout, schedule: &ScheduleConfig) -> f64 {
    let window_hours: f64 = schedule.prime_windows.iter().map(|w| w.hours()).sum();
    window_hours * facility.courts as f64
}

/// Share of weekly court-hours that are prime
pub fn prime_share(config: &FacilityConfig) -> f64 {
    let total = total_court_hours_week(&config.facility);
    if total > 0.0 {
        prime_hours_week(&config.facility, &config.schedule) / total
    } else {
        0.0
    }
}

/// Whole league blocks that fit in a window
pub fn blocks_per_window(window_hours: f64, block_hours: f64) -> u32 {
    if block_hours <= 0.0 {
        return 0;
    }
    (window_hours / block_hours).floor() as u32
}

/// Part of the week a league window falls in, in the order auto-fit trims them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeagueDayGroup {
    Friday,
    MonThu,
    Weekend,
}

impl LeagueDayGroup {
    pub const TRIM_ORDER: [LeagueDayGroup; 3] = [LeagueDayGroup::Friday, LeagueDayGroup::MonThu, LeagueDayGroup::Weekend];

    pub fn of(day: Weekday) -> Self {
        match day {
            Weekday::Fri => LeagueDayGroup::Friday,
            Weekday::Sat | Weekday::Sun => LeagueDayGroup::Weekend,
            _ => LeagueDayGroup::MonThu,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LeagueDayGroup::Friday => "Friday",
            LeagueDayGroup::MonThu => "Mon-Thu",
            LeagueDayGroup::Weekend => "weekend",
        }
    }
}

/// Whole league blocks in each prime window on a league day
pub fn league_windows(schedule: &ScheduleConfig, league: &LeagueConfig) -> Vec<(Weekday, u32)> {
    let block_hours = league.block_hours();
    schedule
        .prime_windows
        .iter()
        .filter(|w| league.league_days.contains(&w.day))
        .map(|w| (w.day, blocks_per_window(w.hours(), block_hours)))
        .collect()
}

/// League blocks per week: configured, or derived from prime windows on league days
pub fn weekly_league_blocks(schedule: &ScheduleConfig, league: &LeagueConfig) -> u32 {
    match league.blocks_per_week {
        Some(blocks) => blocks,
        None => league_windows(schedule, league).iter().map(|(_, blocks)| blocks).sum(),
    }
}

/// Court-hours consumed by a number of league blocks across `courts_used` courts
pub fn league_court_hours(blocks: u32, courts_used: u32, block_hours: f64) -> f64 {
    blocks as f64 * courts_used as f64 * block_hours
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PrimeWindow;

    #[test]
    fn test_total_court_hours() {
        let config = FacilityConfig::default();
        assert_eq!(total_court_hours_week(&config.facility), 392.0);
    }

    #[test]
    fn test_default_prime_hours() {
        let config = FacilityConfig::default();
        // (4 × 6h + 5h + 2 × 4h) × 4 courts
        assert_eq!(prime_hours_week(&config.facility, &config.schedule), 148.0);
        assert!((prime_share(&config) - 148.0 / 392.0).abs() < 1e-12);
    }

    #[test]
    fn test_blocks_per_window_floors() {
        // 90 min + 10 min buffer
        assert_eq!(blocks_per_window(6.0, 1.5 + 10.0 / 60.0), 3);
        assert_eq!(blocks_per_window(4.0, 1.5 + 10.0 / 60.0), 2);
        assert_eq!(blocks_per_window(1.0, 1.5), 0);
        assert_eq!(blocks_per_window(5.0, 0.0), 0);
    }

    #[test]
    fn test_derived_league_blocks() {
        let config = FacilityConfig::default();
        // Mon–Thu 3 blocks each, Saturday 2
        assert_eq!(weekly_league_blocks(&config.schedule, &config.league), 14);
    }

    #[test]
    fn test_league_windows_group_by_day() {
        let config = FacilityConfig::default();
        let windows = league_windows(&config.schedule, &config.league);
        assert_eq!(windows.len(), 5);
        assert!(windows.iter().all(|(day, _)| *day != Weekday::Fri && *day != Weekday::Sun));
        assert_eq!(LeagueDayGroup::of(Weekday::Fri), LeagueDayGroup::Friday);
        assert_eq!(LeagueDayGroup::of(Weekday::Sun), LeagueDayGroup::Weekend);
        assert_eq!(LeagueDayGroup::of(Weekday::Wed), LeagueDayGroup::MonThu);
    }

    #[test]
    fn test_configured_blocks_take_precedence() {
        let mut config = FacilityConfig::default();
        config.league.blocks_per_week = Some(60);
        assert_eq!(weekly_league_blocks(&config.schedule, &config.league), 60);
    }

    #[test]
    fn test_inverted_window_contributes_nothing() {
        let facility = FacilityLayout { courts: 2, hours_per_day: 12.0 };
        let schedule = ScheduleConfig { prime_windows: vec![PrimeWindow::new(Weekday::Mon, 20.0, 18.0)] };
        assert_eq!(prime_hours_week(&facility, &schedule), 0.0);
    }
}
