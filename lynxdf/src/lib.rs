// src/lib.rs
pub mod data {
    pub mod error;
    pub mod config;
    pub mod function_info;
    pub mod scan_index;
    pub mod record;
    pub mod meta;
    pub mod analog;
    pub mod handle;
    pub mod dataset;
}
