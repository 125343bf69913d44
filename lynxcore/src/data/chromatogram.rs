use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::data::metadata::{keys, Metadata, MetadataValue};
use crate::data::spectrum::DetectorKind;

/// A single analog detector channel, one value per time point.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct AnalogTrace {
    pub name: String,
    pub detector: Option<DetectorKind>,
    pub times: Vec<f32>,
    pub values: Vec<f32>,
    pub metadata: Metadata,
}

impl AnalogTrace {
    /// Builds a trace for channel `signal`, inferring the detector from its name.
    pub fn new(
        name: String,
        signal: &str,
        unit: Option<&str>,
        times: Vec<f32>,
        values: Vec<f32>,
    ) -> Self {
        assert_eq!(times.len(), values.len());
        let mut metadata = Metadata::new();
        metadata.insert(keys::SIGNAL.to_string(), MetadataValue::from(signal));
        if let Some(unit) = unit {
            metadata.insert(keys::UNIT.to_string(), MetadataValue::from(unit));
        }
        AnalogTrace {
            name,
            detector: DetectorKind::from_channel_name(signal),
            times,
            values,
            metadata,
        }
    }

    pub fn signal(&self) -> Option<&str> {
        self.metadata.get(keys::SIGNAL).and_then(MetadataValue::as_str)
    }

    pub fn unit(&self) -> Option<&str> {
        self.metadata.get(keys::UNIT).and_then(MetadataValue::as_str)
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}
