use std::path::Path;

use byteorder::{ByteOrder, LittleEndian};
use log::{debug, warn};
use lynxcore::data::chromatogram::AnalogTrace;
use regex::Regex;

use crate::data::error::{read_file, RawDataError, Result};

/// Offset of the first channel entry in `_CHROMS.INF`.
pub const CHANNEL_INFO_START: usize = 0x84;
/// Size of one channel entry in `_CHROMS.INF`.
pub const CHANNEL_INFO_LEN: usize = 0x55;
/// Size of the header preceding the samples of a `_CHROnnn.DAT` file.
pub const ANALOG_DATA_START: usize = 0x80;
const SAMPLE_LEN: usize = 8;

/// Name and optional unit of one analog channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelInfo {
    pub name: String,
    pub unit: Option<String>,
}

/// Parses the channel table of `_CHROMS.INF`.
///
/// Each entry is cleaned of control bytes, `$CC$` markers and `(n)` counters
/// and split on commas. One field is a bare name, six fields carry the unit
/// in the last one. Entries of any other shape are skipped.
pub fn parse_channel_info(bytes: &[u8]) -> Vec<ChannelInfo> {
    let noise = Regex::new(r"[\x00-\x04]|\$CC\$|\([0-9]*\)").expect("static pattern is valid");
    let mut channels = Vec::new();

    if bytes.len() <= CHANNEL_INFO_START {
        return channels;
    }

    for entry in bytes[CHANNEL_INFO_START..].chunks(CHANNEL_INFO_LEN) {
        // one char per byte keeps the fixed entry size intact
        let raw: String = entry.iter().map(|&b| b as char).collect();
        let cleaned = noise.replace_all(&raw, "");
        let fields: Vec<&str> = cleaned.trim().split(',').collect();
        match fields.len() {
            1 => channels.push(ChannelInfo {
                name: fields[0].to_string(),
                unit: None,
            }),
            6 => channels.push(ChannelInfo {
                name: fields[0].to_string(),
                unit: Some(fields[5].to_string()),
            }),
            n => warn!("skipping analog channel entry with {} fields: {}", n, cleaned.trim()),
        }
    }
    channels
}

/// Decodes one `_CHROnnn.DAT` buffer.
///
/// # Arguments
///
/// * `bytes` - content of the file
/// * `channel` - name and unit from the channel table
/// * `path` - path used for naming and error reporting
///
/// # Returns
///
/// * `None` if the file holds no samples
///
pub fn parse_analog_data(bytes: &[u8], channel: &ChannelInfo, path: &Path) -> Result<Option<AnalogTrace>> {
    if bytes.len() <= ANALOG_DATA_START {
        return Ok(None);
    }
    let body = &bytes[ANALOG_DATA_START..];
    if body.len() % SAMPLE_LEN != 0 {
        return Err(RawDataError::corrupt(
            path,
            format!("{} sample bytes are not a multiple of {}", body.len(), SAMPLE_LEN),
        ));
    }

    let mut times = Vec::with_capacity(body.len() / SAMPLE_LEN);
    let mut values = Vec::with_capacity(body.len() / SAMPLE_LEN);
    for sample in body.chunks_exact(SAMPLE_LEN) {
        times.push(LittleEndian::read_f32(&sample[0..4]));
        values.push(LittleEndian::read_f32(&sample[4..8]));
    }

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(Some(AnalogTrace::new(
        name,
        &channel.name,
        channel.unit.as_deref(),
        times,
        values,
    )))
}

/// File name of the analog data file of channel `index` (0-based).
pub fn analog_file_name(index: usize) -> String {
    format!("_CHRO{:03}.DAT", index + 1)
}

/// Decodes every analog channel of a raw directory.
///
/// A directory without `_CHROMS.INF` has no analog channels.
pub fn read_analog(dir: &Path) -> Result<Vec<AnalogTrace>> {
    let info_path = dir.join("_CHROMS.INF");
    if !info_path.exists() {
        return Ok(Vec::new());
    }
    let channels = parse_channel_info(&read_file(&info_path)?);

    let mut traces = Vec::with_capacity(channels.len());
    for (index, channel) in channels.iter().enumerate() {
        let path = dir.join(analog_file_name(index));
        if !path.exists() {
            warn!("{} listed in _CHROMS.INF is missing", path.display());
            continue;
        }
        let bytes = read_file(&path)?;
        if let Some(trace) = parse_analog_data(&bytes, channel, &path)? {
            traces.push(trace);
        }
    }

    debug!("decoded {} analog traces in {}", traces.len(), dir.display());
    Ok(traces)
}
