use std::collections::BTreeMap;

use crate::colorimetry::astm::WeightingKey;
use crate::error::ReferenceError;

use super::model::WeightingRow;

// ---------------------------------------------------------------------------
// Weighting-row selection: which rows belong to which table
// ---------------------------------------------------------------------------

/// Rows grouped by their illuminant/observer/table selector.
pub type RowGroups = BTreeMap<WeightingKey, Vec<WeightingRow>>;

/// Bucket every row by selector.
///
/// Fails on the first row with an unknown illuminant or observer angle.
pub fn group_rows(rows: Vec<WeightingRow>) -> Result<RowGroups, ReferenceError> {
    let mut groups = RowGroups::new();
    for row in rows {
        let key = WeightingKey::from_row(&row)?;
        groups.entry(key).or_default().push(row);
    }
    Ok(groups)
}
