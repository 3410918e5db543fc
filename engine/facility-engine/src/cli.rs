//! # Command Line Interface
//!
//! Runs projections from a TOML configuration and prints JSON or a text summary.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};

use crate::config::FacilityConfig;
use crate::guardrails::{GuardrailReport, GuardrailStatus};
use crate::metrics::{align_with_actuals, HistoricalActual};
use crate::money::Money;
use crate::reference::{legacy_monthly_revenue, legacy_ramp_month};
use crate::sweep::{linspace, sweep, SweepParameter};
use crate::ProjectionBundle;

/// Facility projection CLI
#[derive(Parser)]
#[command(name = "facility-cli")]
#[command(about = "Financial projections for an indoor multi-court facility")]
pub struct Cli {
    /// TOML configuration; defaults plus FACILITY_* environment overrides when absent
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Print JSON instead of a text summary
    #[arg(long, global = true)]
    pub json: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Monthly projection with yearly roll-ups
    Project,
    /// Run the guardrail battery; exits non-zero on any failure
    Guardrails,
    /// Hour-by-hour allocation and revenue breakdown
    Breakdown,
    /// Vary one parameter across a range
    Sweep {
        /// Parameter to vary (member-cap, loan-apr, prime-utilization, league-fill-rate,
        /// league-member-share, courts, rent-monthly)
        parameter: String,
        #[arg(long)]
        start: f64,
        #[arg(long)]
        end: f64,
        #[arg(long, default_value = "5")]
        steps: usize,
    },
    /// Monthly series in historical-actuals shape, optionally paired with recorded months
    Metrics {
        /// JSON array of historical actuals
        #[arg(long)]
        actuals: Option<PathBuf>,
    },
    /// One month of the legacy single-rate model the historical actuals were validated with
    Reference {
        /// Volume scale (1.0 = mature facility)
        #[arg(long, conflicts_with = "month")]
        growth_factor: Option<f64>,

        /// Month index on the legacy opening ramp
        #[arg(long)]
        month: Option<u32>,
    },
    /// Print the default configuration as TOML
    Defaults {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn path_str(path: &Path) -> Result<&str> {
    path.to_str().with_context(|| format!("path is not valid UTF-8: {}", path.display()))
}

/// Load the configuration named on the command line
pub fn load_config(path: Option<&Path>) -> Result<FacilityConfig> {
    match path {
        Some(path) => FacilityConfig::from_file(path_str(path)?)
            .with_context(|| format!("failed to load configuration from {}", path.display())),
        None => FacilityConfig::from_env(),
    }
}

/// CLI handler
pub struct CliHandler {
    config: FacilityConfig,
    json: bool,
}

impl CliHandler {
    pub fn new(config: FacilityConfig, json: bool) -> Self {
        Self { config, json }
    }

    /// Handle CLI commands
    pub fn handle_command(&self, command: Commands) -> Result<()> {
        match command {
            Commands::Project => self.show_projection()?,
            Commands::Guardrails => self.show_guardrails()?,
            Commands::Breakdown => self.show_breakdown()?,
            Commands::Sweep { parameter, start, end, steps } => self.run_sweep(&parameter, start, end, steps)?,
            Commands::Metrics { actuals } => self.show_metrics(actuals.as_deref())?,
            Commands::Reference { growth_factor, month } => self.show_reference(growth_factor, month)?,
            Commands::Defaults { output } => self.write_defaults(output.as_deref())?,
        }
        Ok(())
    }

    fn compute(&self) -> Result<ProjectionBundle> {
        crate::compute(&self.config).context("projection failed")
    }

    fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    fn show_projection(&self) -> Result<()> {
        let bundle = self.compute()?;
        if self.json {
            return Self::print_json(&bundle);
        }

        let statements = &bundle.statements;
        println!("{}", "Monthly projection".cyan().bold());
        println!(
            "{:<8} {:>7} {:>12} {:>12} {:>12} {:>12} {:>8}",
            "month", "members", "revenue", "EBITDA", "net income", "cash", "DSCR"
        );
        for m in &statements.months {
            let dscr = m.dscr.map(|d| format!("{d:.2}")).unwrap_or_else(|| "-".to_string());
            let ebitda = format!("{:>12.0}", m.ebitda);
            let ebitda = if m.ebitda < Money::ZERO { ebitda.red() } else { ebitda.normal() };
            println!(
                "{:<8} {:>7} {:>12.0} {} {:>12.0} {:>12.0} {:>8}",
                m.month, m.members, m.total_revenue, ebitda, m.net_income, m.cash, dscr
            );
        }

        println!();
        for y in &statements.years {
            println!(
                "{} revenue {:.0}, EBITDA {:.0}, net income {:.0}, ending cash {:.0}, min DSCR {}, break-even {}",
                format!("Year {}:", y.year).bold(),
                y.revenue,
                y.ebitda,
                y.net_income,
                y.ending_cash,
                y.min_dscr.map(|d| format!("{d:.2}")).unwrap_or_else(|| "-".to_string()),
                y.break_even_month.as_deref().unwrap_or("-")
            );
        }
        if let Some(first) = statements.break_even_month() {
            println!("First EBITDA-positive month: {}", first.month);
        }
        println!(
            "Loan {:.0} at {:.2}/month, RevPACH ${:.2}, revenue per utilized hour ${:.2}",
            bundle.capital.loan,
            statements.loan_payment,
            bundle.revpach(),
            bundle.rev_per_utilized_hour()
        );
        Ok(())
    }

    fn print_report(report: &GuardrailReport) {
        for check in &report.checks {
            let status = match check.status {
                GuardrailStatus::Pass => check.status.to_string().green(),
                GuardrailStatus::Warn => check.status.to_string().yellow(),
                GuardrailStatus::Fail => check.status.to_string().red().bold(),
            };
            println!(
                "[{}] {:<22} measured {:>14.2}  threshold {:>14.2}  {}",
                status, check.name, check.measured, check.threshold, check.detail
            );
        }
    }

    fn show_guardrails(&self) -> Result<()> {
        let bundle = self.compute()?;
        if self.json {
            Self::print_json(&bundle.guardrails)?;
        } else {
            println!("{}", "Guardrails".cyan().bold());
            Self::print_report(&bundle.guardrails);
        }
        let failures = bundle.guardrails.count(GuardrailStatus::Fail);
        if failures > 0 {
            bail!("{failures} guardrail(s) failed");
        }
        Ok(())
    }

    fn show_breakdown(&self) -> Result<()> {
        let bundle = self.compute()?;
        if self.json {
            return Self::print_json(&serde_json::json!({
                "allocation": bundle.allocation,
                "weekly_revenue": bundle.revenue.weekly,
                "annual_revenue": bundle.revenue.annual,
            }));
        }
        print!("{}", bundle.debug_view());
        Ok(())
    }

    fn run_sweep(&self, parameter: &str, start: f64, end: f64, steps: usize) -> Result<()> {
        let parameter: SweepParameter = parameter.parse()?;
        let outcomes = sweep(&self.config, parameter, &linspace(start, end, steps));
        if self.json {
            return Self::print_json(&outcomes);
        }

        println!("{}", format!("Sweep over {parameter}").cyan().bold());
        println!(
            "{:>12} {:>14} {:>14} {:>10} {:>10} {:>10}  guardrails",
            "value", "final EBITDA", "ending cash", "min DSCR", "RevPACH", "Rev/UtilHr"
        );
        let fmt = |v: Option<f64>| v.map(|v| format!("{v:.2}")).unwrap_or_else(|| "-".to_string());
        let fmt_money = |v: Option<Money>| v.map(|v| format!("{v:.0}")).unwrap_or_else(|| "-".to_string());
        for o in &outcomes {
            let verdict = match (&o.error, o.guardrails_passed) {
                (Some(e), _) => e.red(),
                (None, true) => "ok".green(),
                (None, false) => "failed".red(),
            };
            println!(
                "{:>12.4} {:>14} {:>14} {:>10} {:>10} {:>10}  {}",
                o.value,
                fmt_money(o.final_year_ebitda),
                fmt_money(o.ending_cash),
                fmt(o.min_dscr),
                fmt(o.revpach),
                fmt(o.rev_per_utilized_hour),
                verdict
            );
        }
        Ok(())
    }

    fn show_metrics(&self, actuals: Option<&Path>) -> Result<()> {
        let bundle = self.compute()?;
        let series = bundle.metrics_series();
        let Some(path) = actuals else {
            return Self::print_json(&series);
        };

        let content =
            std::fs::read_to_string(path).with_context(|| format!("failed to read actuals from {}", path.display()))?;
        let actuals: Vec<HistoricalActual> = serde_json::from_str(&content).context("failed to parse actuals")?;
        Self::print_json(&align_with_actuals(&series, &actuals))
    }

    fn show_reference(&self, growth_factor: Option<f64>, month: Option<u32>) -> Result<()> {
        let reference = &self.config.reference;
        let cap = self.config.membership.member_cap;
        let month = match month {
            Some(index) => legacy_ramp_month(reference, cap, index),
            None => legacy_monthly_revenue(reference, cap, growth_factor.unwrap_or(1.0)),
        };
        if self.json {
            return Self::print_json(&month);
        }

        println!("{}", "Legacy single-rate model".cyan().bold());
        println!("  members          {:>10}", month.members);
        println!("  membership       {:>10.0}", month.membership_revenue);
        println!("  court (member)   {:>10.0}", month.member_court_revenue);
        println!("  court (other)    {:>10.0}", month.non_member_court_revenue);
        println!("  programming      {:>10.0}", month.programming);
        println!("  ancillary        {:>10.0}", month.ancillary);
        println!("  {}            {:>10.0}", "total".bold(), month.total());
        println!("  utilization      {:>9.1}%", month.utilization * 100.0);
        Ok(())
    }

    fn write_defaults(&self, output: Option<&Path>) -> Result<()> {
        let defaults = FacilityConfig::default();
        match output {
            Some(path) => {
                defaults.to_file(path_str(path)?)?;
                println!("{} {}", "Wrote".green(), path.display());
            }
            None => print!("{}", toml::to_string_pretty(&defaults)?),
        }
        Ok(())
    }
}
