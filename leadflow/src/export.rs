//! Flat lead exports.
//!
//! Both formats carry the same fields in the same order: company name,
//! industry, location, employee count, revenue, contact email and
//! qualification score.

use crate::errors::Result;
use crate::leads::Lead;
use serde::Serialize;
use std::io::Write;

/// CSV header line.
pub const CSV_HEADER: &str = "Company Name,Industry,Location,Employees,Revenue,Contact Email,Score";

#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    company_name: &'a str,
    industry: &'a str,
    location: &'a str,
    employee_count: u32,
    revenue: Option<u64>,
    contact_email: Option<&'a str>,
    qualification_score: u8,
}

impl<'a> From<&'a Lead> for ExportRow<'a> {
    fn from(lead: &'a Lead) -> Self {
        Self {
            company_name: &lead.company_name,
            industry: &lead.industry,
            location: &lead.location,
            employee_count: lead.employee_count,
            revenue: lead.revenue,
            contact_email: lead.contact_email.as_deref(),
            qualification_score: lead.qualification_score,
        }
    }
}

fn quote(text: &str) -> String {
    format!("\"{}\"", text.replace('"', "\"\""))
}

fn csv_line(lead: &Lead) -> String {
    format!(
        "{},{},{},{},{},{},{}",
        quote(&lead.company_name),
        quote(&lead.industry),
        quote(&lead.location),
        lead.employee_count,
        lead.revenue.map(|r| r.to_string()).unwrap_or_default(),
        quote(lead.contact_email.as_deref().unwrap_or_default()),
        lead.qualification_score,
    )
}

/// Writes leads as CSV, one header line then one line per lead.
///
/// # Errors
///
/// Returns `LeadflowError::Io` if the writer fails.
pub fn write_csv(mut writer: impl Write, leads: &[Lead]) -> Result<()> {
    writeln!(writer, "{CSV_HEADER}")?;
    for lead in leads {
        writeln!(writer, "{}", csv_line(lead))?;
    }
    writer.flush()?;
    Ok(())
}

/// Renders leads as CSV.
#[must_use]
pub fn to_csv(leads: &[Lead]) -> String {
    std::iter::once(CSV_HEADER.to_string())
        .chain(leads.iter().map(csv_line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Renders leads as a pretty-printed JSON array.
///
/// # Errors
///
/// Returns `LeadflowError::Serialization` if encoding fails.
pub fn to_json(leads: &[Lead]) -> Result<String> {
    let rows: Vec<ExportRow<'_>> = leads.iter().map(ExportRow::from).collect();
    Ok(serde_json::to_string_pretty(&rows)?)
}
