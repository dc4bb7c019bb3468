//! Decoding of report responses.
//!
//! Report endpoints answer in whatever format the query asked for and often
//! prefix the body with a UTF-8 byte-order mark. The mark is always removed;
//! what happens next depends on whether the caller wants the report on disk,
//! as JSON, or as raw bytes (CSV, Excel, XML).

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::error::MapiError;
use crate::http::HttpResponse;
use crate::types::StatsQuery;

pub const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// What a report call produced.
#[derive(Debug, Clone, PartialEq)]
pub enum StatsOutput {
    /// The report was written to this file.
    Saved(PathBuf),
    /// The report was requested as JSON and decoded.
    Json(Value),
    /// Any other format, BOM removed, otherwise untouched.
    Raw(Vec<u8>),
}

impl StatsOutput {
    pub fn is_saved(&self) -> bool {
        matches!(self, StatsOutput::Saved(_))
    }
}

pub fn strip_bom(body: &[u8]) -> &[u8] {
    body.strip_prefix(&UTF8_BOM[..]).unwrap_or(body)
}

/// Decode a report body according to `query.format`, or save it to `filepath`.
pub fn decode_stats(
    response: &HttpResponse,
    query: &StatsQuery,
    filepath: Option<&Path>,
) -> Result<StatsOutput, MapiError> {
    let body = strip_bom(&response.body);

    if let Some(path) = filepath {
        save(path, body)?;
        debug!(path = %path.display(), bytes = body.len(), "saved report");
        return Ok(StatsOutput::Saved(path.to_path_buf()));
    }

    if query.is_json() {
        return serde_json::from_slice(body)
            .map(StatsOutput::Json)
            .map_err(MapiError::Deserialization);
    }

    Ok(StatsOutput::Raw(body.to_vec()))
}

fn save(path: &Path, body: &[u8]) -> Result<(), MapiError> {
    let io_error = |source| MapiError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut file = File::create(path).map_err(io_error)?;
    file.write_all(body).map_err(io_error)?;
    file.flush().map_err(io_error)
}
