use std::path::Path;

use crate::error::IoError;
use crate::files::{read_to_string, write_string};

/// Passes a PED/BEAGLE genotype file through unchanged.
///
/// Format conversion itself is out of scope here; this exists only so the
/// `ohana-convert` entry point has something to call.
pub fn convert(input: &Path, output: &Path) -> Result<(), IoError> {
    let contents = read_to_string(input)?;
    write_string(output, &contents)
}
