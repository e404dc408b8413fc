//! JSON persistence of optimizer results.
//!
//! Assignment results are written as one JSON object. Routing results of a
//! planning cycle are written as an object keyed by ISO date
//! (`"2024-01-02"`). Optional fields are omitted when absent and read back
//! as `None`.

use std::collections::BTreeMap;
use std::io::{Read, Write};

use chrono::NaiveDate;

use crate::error::Result;
use crate::models::{AssignmentOutput, CvrpOutput};

/// Writes an assignment result as pretty-printed JSON.
pub fn write_assignment_output<W: Write>(writer: W, output: &AssignmentOutput) -> Result<()> {
    serde_json::to_writer_pretty(writer, output)?;
    Ok(())
}

/// Reads an assignment result written by [`write_assignment_output`].
pub fn read_assignment_output<R: Read>(reader: R) -> Result<AssignmentOutput> {
    Ok(serde_json::from_reader(reader)?)
}

/// Writes per-day routing results as a JSON object keyed by ISO date.
pub fn write_daily_routes<W: Write>(
    writer: W,
    routes: &BTreeMap<NaiveDate, CvrpOutput>,
) -> Result<()> {
    serde_json::to_writer_pretty(writer, routes)?;
    Ok(())
}

/// Reads per-day routing results written by [`write_daily_routes`].
pub fn read_daily_routes<R: Read>(reader: R) -> Result<BTreeMap<NaiveDate, CvrpOutput>> {
    Ok(serde_json::from_reader(reader)?)
}
