use std::fmt::Write as _;

use hotleads_core::Lead;
use hotleads_leads::LeadReport;
use hotleads_osm::GeocodeResult;

use crate::OutputFormat;

const NAME_WIDTH: usize = 32;
const PHONE_WIDTH: usize = 20;
const ADDRESS_WIDTH: usize = 44;

/// Renders a search report in the requested format.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub(crate) fn render_report(report: &LeadReport, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&report.leads)?),
        OutputFormat::Csv => Ok(render_csv(&report.leads)),
        OutputFormat::Table => Ok(render_table(report)),
    }
}

fn render_table(report: &LeadReport) -> String {
    let mut out = format!("Found {} call-ready leads", report.leads.len());
    if report.leads.is_empty() {
        let reason = report.status.reason_code().unwrap_or("no-results");
        let _ = write!(out, "\nNo leads found for these parameters ({reason}).");
        return out;
    }

    let _ = write!(
        out,
        "\n\n{:<NAME_WIDTH$}{:<PHONE_WIDTH$}{:<ADDRESS_WIDTH$}{:>6}{:>7}",
        "NAME", "PHONE", "ADDRESS", "DAYS", "SCORE"
    );
    for lead in &report.leads {
        let _ = write!(
            out,
            "\n{:<NAME_WIDTH$}{:<PHONE_WIDTH$}{:<ADDRESS_WIDTH$}{:>6}{:>7}",
            truncate(&lead.name, NAME_WIDTH - 2),
            truncate(&lead.contact, PHONE_WIDTH - 2),
            truncate(&lead.address, ADDRESS_WIDTH - 2),
            lead.days_since_listed,
            lead.score
        );
    }
    out
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        format!("{}...", text.chars().take(max - 3).collect::<String>())
    } else {
        text.to_owned()
    }
}

fn render_csv(leads: &[Lead]) -> String {
    let mut out = String::from("name,phone,address,days_since_listed,score,lat,lon");
    for lead in leads {
        let _ = write!(
            out,
            "\n{},{},{},{},{},{},{}",
            csv_field(&lead.name),
            csv_field(&lead.contact),
            csv_field(&lead.address),
            lead.days_since_listed,
            lead.score,
            lead.position.lat,
            lead.position.lon
        );
    }
    out
}

/// Quotes a field when it contains a delimiter, quote, or line break.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_owned()
    }
}

pub(crate) fn render_geocode(result: &GeocodeResult) -> String {
    let mut out = format!("lat: {}\nlon: {}", result.point.lat, result.point.lon);
    if let Some(b) = &result.bounding_box {
        let _ = write!(
            out,
            "\nbbox (south, west, north, east): {}, {}, {}, {}",
            b.south, b.west, b.north, b.east
        );
    }
    if let Some(name) = &result.display_name {
        let _ = write!(out, "\nname: {name}");
    }
    out
}
