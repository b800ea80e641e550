//! Report export and encoder state persistence
//!
//! Every write goes through a temporary file that is renamed over the
//! target, so a crash never leaves a half-written report behind.

use crate::error::{Result, StorageError};
use atomicwrites::{AtomicFile, OverwriteBehavior};
use lookalike_features::EncoderState;
use lookalike_similarity::LookalikeReport;
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Write `CustomerID, Lookalike1, Score1, ...` rows
pub fn write_report_csv<P: AsRef<Path>>(path: P, report: &LookalikeReport) -> Result<()> {
    let path = path.as_ref();
    AtomicFile::new(path, OverwriteBehavior::AllowOverwrite)
        .write(|file| -> std::result::Result<(), csv::Error> {
            let mut writer = csv::Writer::from_writer(file);
            writer.write_record(report.header())?;
            for record in report.records() {
                writer.write_record(&record)?;
            }
            writer.flush()?;
            Ok(())
        })
        .map_err(|e| match e {
            atomicwrites::Error::Internal(io) => StorageError::io(path, io),
            atomicwrites::Error::User(err) => StorageError::csv(path, err),
        })?;

    tracing::info!(path = %path.display(), rows = report.rows.len(), "report written");
    Ok(())
}

/// Write the full report, failures included, as pretty JSON
pub fn write_report_json<P: AsRef<Path>>(path: P, report: &LookalikeReport) -> Result<()> {
    let path = path.as_ref();
    write_json(path, report)?;
    tracing::info!(path = %path.display(), rows = report.rows.len(), "report written");
    Ok(())
}

pub fn save_encoder_state<P: AsRef<Path>>(path: P, state: &EncoderState) -> Result<()> {
    let path = path.as_ref();
    write_json(path, state)?;
    tracing::debug!(path = %path.display(), dim = state.dim(), "encoder state saved");
    Ok(())
}

pub fn load_encoder_state<P: AsRef<Path>>(path: P) -> Result<EncoderState> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| StorageError::io(path, e))?;
    let state: EncoderState =
        serde_json::from_reader(BufReader::new(file)).map_err(|e| StorageError::json(path, e))?;
    tracing::debug!(path = %path.display(), dim = state.dim(), "encoder state loaded");
    Ok(state)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    AtomicFile::new(path, OverwriteBehavior::AllowOverwrite)
        .write(|file| -> std::result::Result<(), serde_json::Error> {
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, value)?;
            writer.flush().map_err(serde_json::Error::io)?;
            Ok(())
        })
        .map_err(|e| match e {
            atomicwrites::Error::Internal(io) => StorageError::io(path, io),
            atomicwrites::Error::User(err) => StorageError::json(path, err),
        })
}
