use std::path::Path;

use lynxcore::data::chromatogram::AnalogTrace;
use lynxcore::data::metadata::Metadata;
use lynxcore::data::spectrum::SpectrumMatrix;
use serde::{Deserialize, Serialize};

use crate::data::config::DecodeConfig;
use crate::data::error::Result;
use crate::data::handle::{MassLynxData, WatersRawDataHandle};

/// Decoded content of a whole raw directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawDirectoryContent {
    pub metadata: Metadata,
    pub spectra: Vec<SpectrumMatrix>,
    pub analog: Vec<AnalogTrace>,
}

/// Short description of one decoded entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntitySummary {
    pub name: String,
    pub detector: Option<String>,
    pub num_times: usize,
    pub num_keys: usize,
    pub key_range: Option<(f64, f64)>,
    pub total: f64,
}

impl From<&SpectrumMatrix> for EntitySummary {
    fn from(spectrum: &SpectrumMatrix) -> Self {
        let key_range = match (spectrum.keys.first(), spectrum.keys.last()) {
            (Some(&first), Some(&last)) => Some((first, last)),
            _ => None,
        };
        EntitySummary {
            name: spectrum.name.clone(),
            detector: Some(spectrum.detector.to_string()),
            num_times: spectrum.num_scans(),
            num_keys: spectrum.num_keys(),
            key_range,
            total: spectrum.total_intensity(),
        }
    }
}

impl From<&AnalogTrace> for EntitySummary {
    fn from(trace: &AnalogTrace) -> Self {
        EntitySummary {
            name: trace.name.clone(),
            detector: trace.detector.map(|d| d.to_string()),
            num_times: trace.len(),
            num_keys: 1,
            key_range: None,
            total: trace.values.iter().map(|&v| v as f64).sum(),
        }
    }
}

impl RawDirectoryContent {
    pub fn summary(&self) -> Vec<EntitySummary> {
        self.spectra
            .iter()
            .map(EntitySummary::from)
            .chain(self.analog.iter().map(EntitySummary::from))
            .collect()
    }
}

pub struct WatersDataset {
    pub handle: WatersRawDataHandle,
}

impl WatersDataset {
    pub fn new(data_path: &Path) -> Result<Self> {
        let handle = WatersRawDataHandle::new(data_path)?;
        Ok(WatersDataset { handle })
    }

    /// Decodes spectra, analog traces and directory metadata.
    pub fn read_all(&self, config: &DecodeConfig) -> Result<RawDirectoryContent> {
        Ok(RawDirectoryContent {
            metadata: self.handle.get_metadata(),
            spectra: self.handle.read_spectra(config)?,
            analog: self.handle.read_analog()?,
        })
    }
}

impl MassLynxData for WatersDataset {
    fn read_function(&self, number: u32, config: &DecodeConfig) -> Result<SpectrumMatrix> {
        self.handle.read_function(number, config)
    }
    fn read_spectra(&self, config: &DecodeConfig) -> Result<Vec<SpectrumMatrix>> {
        self.handle.read_spectra(config)
    }
    fn read_analog(&self) -> Result<Vec<AnalogTrace>> {
        self.handle.read_analog()
    }
    fn get_metadata(&self) -> Metadata {
        self.handle.get_metadata()
    }
    fn get_function_count(&self) -> usize {
        self.handle.get_function_count()
    }
    fn get_data_path(&self) -> &Path {
        self.handle.get_data_path()
    }
}
