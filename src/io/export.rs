//! CSV export of the cage history series and the farm harvest outlook.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::analytics::harvest::CageHarvest;
use crate::analytics::series::HistoryRow;
use crate::error::Result;

/// Column header for the growth history export.
const HISTORY_HEADER: &str = "date,doc,stocks,mortality,present_stock,samples,abw_g,\
                              wt_inc_g_per_day,biomass_kg,feeding_rate_pct,dfr_kg,\
                              feed_kg,total_gained_kg,fcr";

/// Column header for the harvest outlook export.
const HARVEST_HEADER: &str = "cage_id,investor,latest_sampling,current_abw_g,target_g,\
                              growth_rate_g_per_day,days_until_harvest,estimated_date,ready";

/// Writes a cage's history rows to a CSV file at `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn export_history_csv(rows: &[HistoryRow], path: &Path) -> Result<()> {
    let file = File::create(path)?;
    write_history_csv(rows, io::BufWriter::new(file))
}

/// Writes history rows as CSV to any writer, one row per sampling.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_history_csv(rows: &[HistoryRow], writer: impl Write) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(HISTORY_HEADER.split(',').map(str::trim))?;

    for r in rows {
        wtr.write_record(&[
            r.date.to_string(),
            r.doc.clone(),
            r.stocks.to_string(),
            r.mortality.to_string(),
            r.present_stock.to_string(),
            r.sample_count.to_string(),
            format!("{:.2}", r.abw_g),
            format!("{:.1}", r.weight_increment_g_per_day),
            format!("{:.2}", r.biomass_kg),
            format!("{}", r.feeding_rate_pct),
            format!("{:.2}", r.daily_feed_ration_kg),
            format!("{:.2}", r.feed_consumed_kg),
            format!("{:.2}", r.total_gained_kg),
            format!("{:.2}", r.fcr),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Writes the harvest outlook to a CSV file at `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn export_harvest_csv(outlook: &[CageHarvest], path: &Path) -> Result<()> {
    let file = File::create(path)?;
    write_harvest_csv(outlook, io::BufWriter::new(file))
}

/// Writes the harvest outlook as CSV; undetermined fields are left empty.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_harvest_csv(outlook: &[CageHarvest], writer: impl Write) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(HARVEST_HEADER.split(',').map(str::trim))?;

    for h in outlook {
        let e = &h.estimate;
        wtr.write_record(&[
            h.cage_id.to_string(),
            h.investor_name.clone().unwrap_or_default(),
            e.latest_sampling_date
                .map(|d| d.to_string())
                .unwrap_or_default(),
            format!("{:.2}", e.current_avg_weight_g),
            format!("{}", e.target_weight_g),
            format!("{:.2}", e.growth_rate_used),
            e.days_until_harvest
                .map(|d| d.to_string())
                .unwrap_or_default(),
            e.estimated_date.map(|d| d.to_string()).unwrap_or_default(),
            e.is_ready.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
