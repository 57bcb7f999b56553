//! ASTM E308 weighting tables and the selectors that identify them.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::data::filter::group_rows;
use crate::data::model::{LabColor, SpectralCurve, WeightingRow, Xyz};
use crate::error::ReferenceError;

// ---------------------------------------------------------------------------
// Illuminant / Observer selectors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Illuminant {
    A,
    C,
    D50,
    D55,
    D65,
    D75,
    F2,
    F7,
    F11,
    F12,
}

impl Illuminant {
    pub const ALL: [Illuminant; 10] = [
        Illuminant::A,
        Illuminant::C,
        Illuminant::D50,
        Illuminant::D55,
        Illuminant::D65,
        Illuminant::D75,
        Illuminant::F2,
        Illuminant::F7,
        Illuminant::F11,
        Illuminant::F12,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Illuminant::A => "A",
            Illuminant::C => "C",
            Illuminant::D50 => "D50",
            Illuminant::D55 => "D55",
            Illuminant::D65 => "D65",
            Illuminant::D75 => "D75",
            Illuminant::F2 => "F2",
            Illuminant::F7 => "F7",
            Illuminant::F11 => "F11",
            Illuminant::F12 => "F12",
        }
    }

    /// Correlated colour temperature in kelvin.
    pub fn nominal_cct(&self) -> f64 {
        match self {
            Illuminant::A => 2856.0,
            Illuminant::C => 6774.0,
            Illuminant::D50 => 5003.0,
            Illuminant::D55 => 5503.0,
            Illuminant::D65 => 6504.0,
            Illuminant::D75 => 7504.0,
            Illuminant::F2 => 4230.0,
            Illuminant::F7 => 6500.0,
            Illuminant::F11 => 4000.0,
            Illuminant::F12 => 3000.0,
        }
    }
}

impl fmt::Display for Illuminant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Illuminant {
    type Err = ReferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase();
        Illuminant::ALL
            .into_iter()
            .find(|ill| ill.name() == wanted)
            .ok_or_else(|| ReferenceError::UnknownIlluminant(s.to_string()))
    }
}

impl TryFrom<String> for Illuminant {
    type Error = ReferenceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Illuminant> for String {
    fn from(value: Illuminant) -> Self {
        value.name().to_string()
    }
}

/// CIE standard observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum Observer {
    TwoDegree,
    TenDegree,
}

impl Observer {
    pub fn degrees(&self) -> u32 {
        match self {
            Observer::TwoDegree => 2,
            Observer::TenDegree => 10,
        }
    }
}

impl fmt::Display for Observer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

impl TryFrom<u32> for Observer {
    type Error = ReferenceError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            2 => Ok(Observer::TwoDegree),
            10 => Ok(Observer::TenDegree),
            other => Err(ReferenceError::UnknownObserver(other.to_string())),
        }
    }
}

impl From<Observer> for u32 {
    fn from(value: Observer) -> Self {
        value.degrees()
    }
}

impl FromStr for Observer {
    type Err = ReferenceError;

    /// Accepts `2`, `2°`, `2deg`, `10`, `10°`, ...
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .trim()
            .trim_end_matches(|c: char| !c.is_ascii_digit());
        digits
            .parse::<u32>()
            .map_err(|_| ReferenceError::UnknownObserver(s.to_string()))
            .and_then(Observer::try_from)
    }
}

// ---------------------------------------------------------------------------
// WeightingKey
// ---------------------------------------------------------------------------

/// Selects one weighting table: illuminant, observer and ASTM table number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WeightingKey {
    pub illuminant: Illuminant,
    pub observer: Observer,
    pub table: u32,
}

impl WeightingKey {
    pub const fn new(illuminant: Illuminant, observer: Observer, table: u32) -> Self {
        Self {
            illuminant,
            observer,
            table,
        }
    }

    /// Parse the selector columns of a raw row.
    pub fn from_row(row: &WeightingRow) -> Result<Self, ReferenceError> {
        Ok(WeightingKey {
            illuminant: row.illuminant.parse()?,
            observer: Observer::try_from(row.observer_angle)?,
            table: row.table_number,
        })
    }
}

impl Default for WeightingKey {
    fn default() -> Self {
        WeightingKey::new(Illuminant::D50, Observer::TwoDegree, 5)
    }
}

impl fmt::Display for WeightingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.illuminant, self.observer, self.table)
    }
}

// ---------------------------------------------------------------------------
// WeightingTable
// ---------------------------------------------------------------------------

/// The rows of a single illuminant/observer/table selection, sorted by
/// wavelength.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeightingTable {
    rows: Vec<WeightingRow>,
}

impl WeightingTable {
    pub fn new(mut rows: Vec<WeightingRow>) -> Self {
        rows.sort_by_key(|r| r.wavelength);
        WeightingTable { rows }
    }

    /// A table with no rows.  Converting against it yields a zero Lab.
    pub fn empty() -> Self {
        WeightingTable::default()
    }

    pub fn rows(&self) -> &[WeightingRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// White point taken from the first row.  All rows of a table carry the
    /// same white point.
    pub fn white_point(&self) -> Option<Xyz> {
        self.rows.first().and_then(WeightingRow::white_point)
    }

    pub fn wavelengths(&self) -> impl Iterator<Item = u32> + '_ {
        self.rows.iter().map(|r| r.wavelength)
    }
}

// ---------------------------------------------------------------------------
// ReferenceData – every loaded table, read-only
// ---------------------------------------------------------------------------

static EMPTY_TABLE: WeightingTable = WeightingTable { rows: Vec::new() };

/// All weighting tables known to the host, keyed by selector.
///
/// Built once and passed explicitly into conversions.
#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    tables: BTreeMap<WeightingKey, WeightingTable>,
}

impl ReferenceData {
    /// Group raw rows into tables, validating each table.
    ///
    /// Every row of a table must share the same white point (all present or
    /// all absent) and wavelengths must be unique.
    pub fn from_rows(rows: Vec<WeightingRow>) -> Result<Self, ReferenceError> {
        let grouped = group_rows(rows)?;
        let mut tables = BTreeMap::new();

        for (key, rows) in grouped {
            validate_table(&key, &rows)?;
            debug!("weighting table {key}: {} wavelengths", rows.len());
            tables.insert(key, WeightingTable::new(rows));
        }

        Ok(ReferenceData { tables })
    }

    pub fn from_tables<I>(tables: I) -> Self
    where
        I: IntoIterator<Item = (WeightingKey, WeightingTable)>,
    {
        ReferenceData {
            tables: tables.into_iter().collect(),
        }
    }

    pub fn table(&self, key: &WeightingKey) -> Option<&WeightingTable> {
        self.tables.get(key)
    }

    /// The table for `key`, or an empty table when it is not loaded.
    pub fn table_or_empty(&self, key: &WeightingKey) -> &WeightingTable {
        match self.tables.get(key) {
            Some(table) => table,
            None => {
                warn!("no weighting table loaded for {key}");
                &EMPTY_TABLE
            }
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &WeightingKey> + '_ {
        self.tables.keys()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Lab of `curve` under the table selected by `key`.
    pub fn lab_for(&self, curve: &SpectralCurve, key: &WeightingKey) -> LabColor {
        super::convert::spectral_to_lab(curve, self.table_or_empty(key))
    }
}

fn validate_table(key: &WeightingKey, rows: &[WeightingRow]) -> Result<(), ReferenceError> {
    let Some(first) = rows.first() else {
        return Ok(());
    };
    let expected = (first.white_point_x, first.white_point_y, first.white_point_z);
    let mut seen = std::collections::BTreeSet::new();

    for row in rows {
        if (row.white_point_x, row.white_point_y, row.white_point_z) != expected {
            return Err(ReferenceError::InconsistentWhitePoint {
                key: key.to_string(),
                wavelength: row.wavelength,
            });
        }
        if !seen.insert(row.wavelength) {
            return Err(ReferenceError::DuplicateWavelength {
                key: key.to_string(),
                wavelength: row.wavelength,
            });
        }
    }
    Ok(())
}
