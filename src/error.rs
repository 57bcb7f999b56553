use thiserror::Error;

/// Structural failures while reading a CGATS file.
///
/// Missing numeric cells are not errors; they are tolerated by the parser.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CgatsError {
    #[error("Missing required keyword: {0}")]
    MissingKeyword(&'static str),

    #[error("Data format declares no fields")]
    EmptyDataFormat,

    #[error("No SAMPLE_NAME or SAMPLE_ID field in data format")]
    MissingSampleName,

    #[error("No recognized color data fields (LAB_*, SPECTRAL_*, CMYK_*, XYZ_* or nCLR_*)")]
    NoColorData,
}

/// Problems with weighting-table reference data and its selectors.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ReferenceError {
    #[error("Unknown illuminant: {0}")]
    UnknownIlluminant(String),

    #[error("Unknown observer angle: {0}")]
    UnknownObserver(String),

    #[error("Unknown measurement mode: {0}")]
    UnknownMode(String),

    #[error("Unknown adaptation method: {0} (expected ratio or delta)")]
    UnknownMethod(String),

    #[error("Inconsistent white point in table {key} at {wavelength} nm")]
    InconsistentWhitePoint { key: String, wavelength: u32 },

    #[error("Duplicate wavelength {wavelength} nm in table {key}")]
    DuplicateWavelength { key: String, wavelength: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cgats_error_messages() {
        assert_eq!(
            CgatsError::MissingKeyword("BEGIN_DATA").to_string(),
            "Missing required keyword: BEGIN_DATA"
        );
        assert_eq!(
            CgatsError::MissingSampleName.to_string(),
            "No SAMPLE_NAME or SAMPLE_ID field in data format"
        );
    }

    #[test]
    fn test_reference_error_messages() {
        let error = ReferenceError::InconsistentWhitePoint {
            key: "D50/2°/5".to_string(),
            wavelength: 550,
        };
        assert_eq!(
            error.to_string(),
            "Inconsistent white point in table D50/2°/5 at 550 nm"
        );
        assert_eq!(
            ReferenceError::UnknownIlluminant("D93".to_string()).to_string(),
            "Unknown illuminant: D93"
        );
    }
}
