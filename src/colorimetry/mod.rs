/// Colour science: weighting tables, spectral → Lab, derived metrics.
///
/// ```text
///   WeightingRow (reference data)
///        │  group by illuminant/observer/table
///        ▼
///   ┌───────────────┐
///   │ ReferenceData │  WeightingKey → WeightingTable
///   └───────────────┘
///        │
///        ▼
///   SpectralCurve ──► convert ──► Xyz ──► LabColor ──► lch / difference / preview
/// ```

pub mod astm;
pub mod convert;
pub mod difference;
pub mod lch;
pub mod preview;
pub mod synthetic;
