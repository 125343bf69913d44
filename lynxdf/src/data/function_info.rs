use std::io::{Cursor, Read, Seek, SeekFrom};
use std::path::Path;

use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};
use log::debug;

use crate::data::error::{read_file, RawDataError, Result};

/// Number of entries in each coefficient table of a function record.
pub const TABLE_LEN: usize = 32;

/// Size of one record in `_FUNCTNS.INF`.
pub const FUNCTION_RECORD_LEN: usize = 2 + 16 + 4 + 10 + 128 + 128 + 136;

/// Acquisition parameters of one function, read from `_FUNCTNS.INF`.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionInfo {
    pub function_id: u8,
    pub form: u16,
    pub num_scans: u32,
    pub q1: [f32; TABLE_LEN],
    pub q3: [f32; TABLE_LEN],
}

impl FunctionInfo {
    /// Reads one record at the cursor position.
    ///
    /// # Record layout (little endian)
    ///
    /// * `u16` packed word, function id in the low 5 bits, record form above bit 10
    /// * 16 reserved bytes
    /// * `u32` number of scans
    /// * 10 reserved bytes
    /// * 128 reserved bytes
    /// * 32 x `f32` q1 table
    /// * 136 bytes of which the leading 32 x `f32` are the q3 table
    ///
    pub fn read_from(cursor: &mut Cursor<&[u8]>) -> std::io::Result<FunctionInfo> {
        let packed = cursor.read_u16::<LittleEndian>()?;
        let function_id = (packed & 0x1F) as u8;
        let form = packed >> 10;

        cursor.seek(SeekFrom::Current(16))?;
        let num_scans = cursor.read_u32::<LittleEndian>()?;
        cursor.seek(SeekFrom::Current(10))?;

        let mut reserved = [0u8; 128];
        cursor.read_exact(&mut reserved)?;

        let mut q1 = [0f32; TABLE_LEN];
        cursor.read_f32_into::<LittleEndian>(&mut q1)?;

        // the q3 block is two floats longer than the table it holds
        let mut q3_block = [0u8; 136];
        cursor.read_exact(&mut q3_block)?;
        let mut q3 = [0f32; TABLE_LEN];
        LittleEndian::read_f32_into(&q3_block[..TABLE_LEN * 4], &mut q3);

        Ok(FunctionInfo {
            function_id,
            form,
            num_scans,
            q1,
            q3,
        })
    }
}

/// Parses every record of a function directory buffer.
///
/// Records are read back to back until the end of the buffer; a trailing
/// partial record means the cursor can not land on the end of the file and
/// the directory is rejected as corrupt.
///
/// # Arguments
///
/// * `bytes` - content of `_FUNCTNS.INF`
/// * `path` - path used for error reporting
///
pub fn parse_function_directory(bytes: &[u8], path: &Path) -> Result<Vec<FunctionInfo>> {
    let mut cursor = Cursor::new(bytes);
    let mut functions = Vec::with_capacity(bytes.len() / FUNCTION_RECORD_LEN);

    while (cursor.position() as usize) < bytes.len() {
        let remaining = bytes.len() - cursor.position() as usize;
        if remaining < FUNCTION_RECORD_LEN {
            return Err(RawDataError::corrupt(
                path,
                format!(
                    "{} trailing bytes after {} function records, expected records of {} bytes",
                    remaining,
                    functions.len(),
                    FUNCTION_RECORD_LEN
                ),
            ));
        }
        let info = FunctionInfo::read_from(&mut cursor).map_err(|e| RawDataError::io(path, e))?;
        functions.push(info);
    }

    if cursor.position() as usize != bytes.len() {
        return Err(RawDataError::corrupt(path, "read cursor did not land on end of file"));
    }

    debug!("read {} function records from {}", functions.len(), path.display());
    Ok(functions)
}

/// Reads and parses `_FUNCTNS.INF` from disk.
pub fn read_function_directory(path: &Path) -> Result<Vec<FunctionInfo>> {
    let bytes = read_file(path)?;
    parse_function_directory(&bytes, path)
}
