//! Plain-text rendering of a [`WeatherReport`].

use std::fmt::Write as _;

use skybrief_core::{DailyForecast, WeatherReport, WeatherSnapshot};

const CHART_WIDTH: usize = 24;

pub fn report(report: &WeatherReport) -> String {
    let mut out = String::new();

    out.push_str(&snapshot(&report.snapshot));

    if let Some(narrative) = &report.narrative {
        out.push('\n');
        out.push_str(&narrative.text);
        if narrative.is_fallback() {
            out.push_str(" (generated description unavailable)");
        }
        out.push('\n');
    }

    out.push_str("\n---\n");
    match &report.forecast {
        Ok(days) if days.is_empty() => out.push_str("No forecast data available.\n"),
        Ok(days) => {
            out.push_str(&forecast_table(days));
            out.push('\n');
            out.push_str(&temperature_chart(days));
        }
        Err(err) => {
            let _ = writeln!(out, "Error in fetching forecast data: {err}");
        }
    }

    out
}

/// Two columns of metric cards.
pub fn snapshot(s: &WeatherSnapshot) -> String {
    let visibility = match s.visibility_m {
        Some(m) => format!("{m} m"),
        None => "unknown".to_string(),
    };

    let rows = [
        (
            ("Temperature", format!("{:.2}°C", s.temperature_c)),
            ("Pressure", format!("{} hPa", s.pressure_hpa)),
        ),
        (
            ("Humidity", format!("{}%", s.humidity_pct)),
            ("Wind Speed", format!("{} m/s", s.wind_speed_ms)),
        ),
        (
            ("Feels Like", format!("{:.1}°C", s.feels_like_c)),
            ("Visibility", visibility),
        ),
    ];

    let mut out = format!("Weather Updates for {}:\n", s.city);
    let _ = writeln!(out, "  {}", capitalize(&s.condition));
    out.push('\n');
    for ((l1, v1), (l2, v2)) in rows {
        let _ = writeln!(out, "  {l1:<12}{v1:<14}{l2:<12}{v2}");
    }
    out
}

pub fn forecast_table(days: &[DailyForecast]) -> String {
    let mut out = format!("{}-Day Weather Forecast\n", days.len());
    let _ = writeln!(
        out,
        "  {:<13}{:<22}{:<10}{:<10}",
        "Day", "Description", "Min Temp", "Max Temp"
    );
    for day in days {
        let _ = writeln!(
            out,
            "  {:<13}{:<22}{:<10}{:<10}",
            day.date.format("%a, %b %d").to_string(),
            capitalize(&day.dominant_condition),
            format!("{:.1}°C", day.min_temp_c),
            format!("{:.1}°C", day.max_temp_c),
        );
    }
    out
}

/// Horizontal bars of the daily mean temperature, scaled to the coldest and warmest day.
pub fn temperature_chart(days: &[DailyForecast]) -> String {
    let lo = days.iter().map(|d| d.avg_temp_c).fold(f64::INFINITY, f64::min);
    let hi = days.iter().map(|d| d.avg_temp_c).fold(f64::NEG_INFINITY, f64::max);
    let span = hi - lo;

    let mut out = String::from("Average Temperature\n");
    for day in days {
        let len = if span > f64::EPSILON {
            1 + ((day.avg_temp_c - lo) / span * (CHART_WIDTH - 1) as f64).round() as usize
        } else {
            CHART_WIDTH
        };
        let _ = writeln!(
            out,
            "  {:<13}{:<w$} {:.1}°C",
            day.date.format("%a, %b %d").to_string(),
            "█".repeat(len),
            day.avg_temp_c,
            w = CHART_WIDTH,
        );
    }
    out
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
