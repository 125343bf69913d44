use std::fmt;
use std::fmt::{Display, Formatter};

use bincode::{Decode, Encode};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::data::matrix::ValueMatrix;
use crate::data::metadata::{Metadata, MetadataValue};

/// Detector that produced a decoded signal.
///
/// # Description
///
/// Spectral functions are `MS` when a mass calibration was supplied and `UV`
/// otherwise. Analog channels may additionally be `CAD` or `ELSD`.
///
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize, Encode, Decode)]
pub enum DetectorKind {
    MS,
    UV,
    CAD,
    ELSD,
}

impl DetectorKind {
    /// Detector of a spectral function, decided by whether it is mass calibrated.
    pub fn for_function(calibrated: bool) -> DetectorKind {
        if calibrated {
            DetectorKind::MS
        } else {
            DetectorKind::UV
        }
    }

    /// Infers the detector of an analog channel from its name.
    ///
    /// # Example
    ///
    /// ```rust
    /// use lynxcore::data::spectrum::DetectorKind;
    /// assert_eq!(DetectorKind::from_channel_name("ELSD Signal"), Some(DetectorKind::ELSD));
    /// assert_eq!(DetectorKind::from_channel_name("254nm@4"), Some(DetectorKind::UV));
    /// assert_eq!(DetectorKind::from_channel_name("Pressure"), None);
    /// ```
    pub fn from_channel_name(name: &str) -> Option<DetectorKind> {
        if name.contains("CAD") {
            Some(DetectorKind::CAD)
        } else if name.contains("ELSD") {
            Some(DetectorKind::ELSD)
        } else if name.contains("nm@") {
            Some(DetectorKind::UV)
        } else {
            None
        }
    }
}

impl Display for DetectorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            DetectorKind::MS => write!(f, "MS"),
            DetectorKind::UV => write!(f, "UV"),
            DetectorKind::CAD => write!(f, "CAD"),
            DetectorKind::ELSD => write!(f, "ELSD"),
        }
    }
}

/// The decoded content of one spectral function.
///
/// `values` has shape `(times.len(), keys.len())` and cell `[s][k]` holds the
/// summed intensity of scan `s` at key `keys[k]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct SpectrumMatrix {
    pub name: String,
    pub detector: DetectorKind,
    pub times: Vec<f32>,
    pub keys: Vec<f64>,
    pub values: ValueMatrix,
    pub metadata: Metadata,
}

impl SpectrumMatrix {
    /// Constructs a new `SpectrumMatrix`.
    ///
    /// # Panics
    ///
    /// Panics if the value matrix shape does not match `(times.len(), keys.len())`.
    pub fn new(
        name: String,
        detector: DetectorKind,
        times: Vec<f32>,
        keys: Vec<f64>,
        values: ValueMatrix,
        metadata: Metadata,
    ) -> Self {
        assert_eq!(
            values.shape(),
            (times.len(), keys.len()),
            "value matrix shape must be (scans, keys)"
        );
        SpectrumMatrix {
            name,
            detector,
            times,
            keys,
            values,
            metadata,
        }
    }

    pub fn num_scans(&self) -> usize {
        self.times.len()
    }

    pub fn num_keys(&self) -> usize {
        self.keys.len()
    }

    pub fn polarity(&self) -> Option<char> {
        self.metadata
            .get(crate::data::metadata::keys::POLARITY)
            .and_then(MetadataValue::as_char)
    }

    /// True if the key axis is strictly ascending, i.e. sorted without duplicates.
    pub fn has_strictly_ascending_keys(&self) -> bool {
        self.keys.iter().tuple_windows().all(|(a, b)| a < b)
    }

    /// Total intensity per scan.
    pub fn total_ion_chromatogram(&self) -> Vec<f64> {
        self.values.row_sums()
    }

    /// Sum over the whole matrix.
    pub fn total_intensity(&self) -> f64 {
        self.values.total()
    }

    /// Non-zero `(key, value)` pairs of one scan.
    pub fn scan(&self, scan: usize) -> Vec<(f64, f64)> {
        self.keys
            .iter()
            .enumerate()
            .map(|(k, &key)| (key, self.values.get_f64(scan, k)))
            .filter(|(_, value)| *value != 0.0)
            .collect()
    }
}

impl Display for SpectrumMatrix {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let (first, last) = match (self.keys.first(), self.keys.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => (0.0, 0.0),
        };
        write!(
            f,
            "SpectrumMatrix({}, detector: {}, scans: {}, keys: {} [{:.4}, {:.4}])",
            self.name,
            self.detector,
            self.num_scans(),
            self.num_keys(),
            first,
            last
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::matrix::Matrix;
    use crate::data::metadata::keys;

    fn small_matrix() -> SpectrumMatrix {
        let mut metadata = Metadata::new();
        metadata.insert(keys::POLARITY.to_string(), MetadataValue::Char('+'));
        SpectrumMatrix::new(
            "_FUNC001.DAT".to_string(),
            DetectorKind::MS,
            vec![0.1, 0.2],
            vec![100.0, 101.0, 150.0],
            ValueMatrix::Integer(Matrix::from_row_major(2, 3, vec![5, 0, 1, 0, 2, 0])),
            metadata,
        )
    }

    #[test]
    fn test_accessors() {
        let spectrum = small_matrix();
        assert_eq!(spectrum.num_scans(), 2);
        assert_eq!(spectrum.num_keys(), 3);
        assert_eq!(spectrum.polarity(), Some('+'));
        assert!(spectrum.has_strictly_ascending_keys());
        assert_eq!(spectrum.total_intensity(), 8.0);
        assert_eq!(spectrum.total_ion_chromatogram(), vec![6.0, 2.0]);
        assert_eq!(spectrum.scan(0), vec![(100.0, 5.0), (150.0, 1.0)]);
    }

    #[test]
    fn test_duplicate_keys_are_not_ascending() {
        let mut spectrum = small_matrix();
        spectrum.keys = vec![100.0, 100.0, 150.0];
        assert!(!spectrum.has_strictly_ascending_keys());
    }

    #[test]
    #[should_panic]
    fn test_shape_mismatch_panics() {
        SpectrumMatrix::new(
            "bad".to_string(),
            DetectorKind::UV,
            vec![0.1],
            vec![1.0, 2.0],
            ValueMatrix::Float(Matrix::zeros(1, 3)),
            Metadata::new(),
        );
    }

    #[test]
    fn test_detector_for_function() {
        assert_eq!(DetectorKind::for_function(true), DetectorKind::MS);
        assert_eq!(DetectorKind::for_function(false), DetectorKind::UV);
        assert_eq!(DetectorKind::from_channel_name("CAD 1"), Some(DetectorKind::CAD));
    }

    #[test]
    fn test_bincode_keeps_matrix_and_metadata() {
        let spectrum = small_matrix();
        let bytes = bincode::encode_to_vec(&spectrum, bincode::config::standard()).unwrap();
        let (decoded, _): (SpectrumMatrix, usize) =
            bincode::decode_from_slice(&bytes, bincode::config::standard()).unwrap();
        assert_eq!(decoded, spectrum);
    }

    #[test]
    fn test_json_keeps_polarity() {
        let spectrum = small_matrix();
        let json = serde_json::to_string(&spectrum).unwrap();
        let decoded: SpectrumMatrix = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.polarity(), Some('+'));
        assert_eq!(decoded, spectrum);
    }
}
