use std::io::Write;
use std::path::Path;

use image::{ImageReader, RgbaImage};
use serde::{Serialize, de::DeserializeOwned};

/// Serializes an object to a JSON file.
pub fn object_to_json<T: Serialize, P: AsRef<Path>>(output_path: P, object: &T) -> std::io::Result<()> {
    let j = serde_json::to_string_pretty(object)?;
    let mut file = std::fs::File::create(output_path)?;
    file.write_all(j.as_bytes())?;
    Ok(())
}

/// Deserializes an object from a JSON file.
pub fn object_from_json<T: DeserializeOwned, P: AsRef<Path>>(file_path: P) -> std::io::Result<T> {
    let contents = std::fs::read_to_string(file_path)?;
    Ok(serde_json::from_str(&contents)?)
}

/// Reads and decodes any supported image as RGBA.
pub fn load_rgba<P: AsRef<Path>>(path: P) -> Result<RgbaImage, image::ImageError> {
    Ok(ImageReader::open(path)?.with_guessed_format()?.decode()?.to_rgba8())
}

/// Summary of one run of the recognition loop.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionReport {
    pub ticks: u64,
    pub skipped_ticks: u64,
    pub best_similarity: f32,
    pub threshold: f32,
    pub recognized: bool,
    pub resets: u32,
    pub asset: Option<String>,
}

#[derive(Serialize)]
struct TimestampedReport<'a> {
    timestamp: String,
    #[serde(flatten)]
    report: &'a SessionReport,
}

/// Writes a session report as JSON, stamped with the local time when the
/// offset is known and UTC otherwise.
pub fn write_session_report<P: AsRef<Path>>(output_path: P, report: &SessionReport) -> std::io::Result<()> {
    let now = time::OffsetDateTime::now_local().unwrap_or_else(|_| time::OffsetDateTime::now_utc());
    let timestamp = now
        .format(&time::format_description::well_known::Rfc3339)
        .map_err(std::io::Error::other)?;
    object_to_json(output_path, &TimestampedReport { timestamp, report })
}
