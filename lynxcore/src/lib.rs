// algorithm module
pub mod algorithm {
    pub mod bits;
    pub mod calibration;
    pub mod aggregate;
}

// data module
pub mod data {
    pub mod matrix;
    pub mod metadata;
    pub mod spectrum;
    pub mod chromatogram;
}
