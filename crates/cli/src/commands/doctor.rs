use chrono::{Datelike, Local};
use digsafe_core::config::{AppConfig, LoadOptions};
use digsafe_core::HolidaySet;
use serde::Serialize;
use serde_json::Value;

use super::{CommandResult, EXIT_CONFIG_FAILURE};

const COMMAND: &str = "doctor";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    year: i32,
    checks: Vec<DoctorCheck>,
}

pub fn run(options: &LoadOptions, json_output: bool, year: Option<i32>) -> CommandResult {
    let year = year.unwrap_or_else(|| Local::now().year());
    let report = build_report(options, year);
    let passed = report.overall_status == CheckStatus::Pass;
    let exit_code = if passed { 0 } else { EXIT_CONFIG_FAILURE };

    if json_output {
        if passed {
            return CommandResult::success_with_report(COMMAND, report.summary.clone(), &report);
        }
        let data = serde_json::to_value(&report).unwrap_or(Value::Null);
        return CommandResult::failure_with_data(
            COMMAND,
            "preflight",
            report.summary.clone(),
            exit_code,
            data,
        );
    }

    CommandResult { exit_code, output: render_human(&report) }
}

fn build_report(options: &LoadOptions, year: i32) -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(options.clone()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            match config.holiday_set() {
                Ok(holidays) => {
                    checks.push(DoctorCheck {
                        name: "holiday_calendar",
                        status: CheckStatus::Pass,
                        details: format!(
                            "{} holidays loaded for {}",
                            holidays.len(),
                            config.calendar.jurisdiction
                        ),
                    });
                    checks.push(check_holiday_coverage(&holidays, year));
                }
                Err(error) => {
                    checks.push(DoctorCheck {
                        name: "holiday_calendar",
                        status: CheckStatus::Fail,
                        details: error.to_string(),
                    });
                    checks.push(skipped("holiday_coverage", "holiday calendar did not load"));
                }
            }
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.push(skipped("holiday_calendar", "configuration did not load"));
            checks.push(skipped("holiday_coverage", "configuration did not load"));
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all preflight checks passed".to_string()
    } else {
        "doctor: one or more preflight checks failed".to_string()
    };

    tracing::info!(
        event_name = "cli.doctor.completed",
        year,
        passed = all_pass,
        "doctor checks completed"
    );

    DoctorReport { overall_status, summary, year, checks }
}

// Holiday data is year-bounded; an uncovered year silently counts holidays
// as business days.
fn check_holiday_coverage(holidays: &HolidaySet, year: i32) -> DoctorCheck {
    if holidays.covers_year(year) {
        DoctorCheck {
            name: "holiday_coverage",
            status: CheckStatus::Pass,
            details: format!("{} holidays configured for {year}", holidays.in_year(year).len()),
        }
    } else {
        DoctorCheck {
            name: "holiday_coverage",
            status: CheckStatus::Fail,
            details: format!("no holidays configured for {year}; extend the holiday file"),
        }
    }
}

fn skipped(name: &'static str, reason: &str) -> DoctorCheck {
    DoctorCheck {
        name,
        status: CheckStatus::Skipped,
        details: format!("skipped because {reason}"),
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}
