//! Row projection: flattens aggregates into ordered string fields

use crate::models::PowerDuration;
use crate::rider::RiderAggregate;

/// Public profile page for a rider
pub const PROFILE_URL: &str = "https://zwiftpower.com/profile.php?z=";

const LEADING_COLUMNS: [&str; 6] =
    ["Name", "Zwid", "Profile", "Category", "Womens Category", "Weight"];

/// Category label for a ZwiftPower division code
pub fn category_label(code: i32) -> &'static str {
    match code {
        5 => "A+",
        10 => "A",
        20 => "B",
        30 => "C",
        40 => "D",
        _ => "",
    }
}

/// Column headers, index-aligned with [`to_row`] for the same window set
pub fn header_row(window_days: &[u32]) -> Vec<String> {
    let mut header: Vec<String> = LEADING_COLUMNS.iter().map(|s| s.to_string()).collect();

    for days in window_days {
        header.push(format!("Races{days}Days"));
        header.push(format!("Ftp{days}Days"));
        for duration in PowerDuration::ALL {
            header.push(format!("W{}{days}Days", duration.label()));
            header.push(format!("Wkg{}{days}Days", duration.label()));
        }
    }
    header
}

/// Field values for one rider, windows in the aggregate's configured order
pub fn to_row(rider: &RiderAggregate) -> Vec<String> {
    let mut row = vec![
        rider.name.clone(),
        rider.zwid.to_string(),
        format!("{PROFILE_URL}{}", rider.zwid),
        category_label(rider.div).to_string(),
        category_label(rider.divw).to_string(),
        one_decimal(rider.weight),
    ];

    for window in &rider.windows {
        row.push(window.races().to_string());
        row.push(one_decimal(window.best_ftp_ratio()));
        for duration in PowerDuration::ALL {
            row.push(truncated(window.best_watts(duration)));
            row.push(one_decimal(window.best_wkg(duration)));
        }
    }
    row
}

fn one_decimal(value: f64) -> String {
    format!("{value:.1}")
}

/// Absolute watts are truncated toward zero, not rounded
fn truncated(value: f64) -> String {
    (value as i64).to_string()
}
