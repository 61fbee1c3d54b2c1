//! CSV export for shortlisted recommendations.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::roi::Guarded;
use crate::scoring::ShortlistEntry;

/// Column header for the shortlist CSV.
const HEADER: &str = "rank,motivation,candidate_id,tier,inverter_brand,system_kw,panel_count,\
                       battery_kwh,total_cost,rebates,net_cost,annual_savings,payback_years,\
                       npv,total_score,confidence";

fn guarded(value: Guarded, precision: usize) -> String {
    match value {
        Guarded::Finite(v) => format!("{v:.precision$}"),
        Guarded::Unbounded => String::new(),
    }
}

/// Exports a shortlist to a CSV file at the given path.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv(shortlist: &[ShortlistEntry], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_csv(shortlist, buf)
}

/// Writes a shortlist as CSV to any writer, one row per entry in rank order.
///
/// Unbounded payback is written as an empty cell.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv(shortlist: &[ShortlistEntry], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(HEADER.split(',').map(str::trim))?;

    for entry in shortlist {
        let scored = &entry.candidate;
        let c = &scored.candidate;
        wtr.write_record(&[
            entry.rank.to_string(),
            entry.motivation.to_string(),
            c.id.clone(),
            c.tier.to_string(),
            c.inverter_brand().unwrap_or_default().to_string(),
            format!("{:.2}", c.system_kw),
            c.panel_count.to_string(),
            c.battery_kwh.map(|k| format!("{k:.1}")).unwrap_or_default(),
            format!("{:.2}", c.cost.total),
            format!("{:.2}", scored.rebate.total),
            format!("{:.2}", scored.roi.upfront_cost),
            format!("{:.2}", scored.roi.annual_savings),
            guarded(scored.roi.payback_years, 2),
            format!("{:.2}", scored.roi.npv),
            format!("{:.4}", scored.total_score),
            format!("{:.2}", scored.confidence),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
