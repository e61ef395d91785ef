//! Sets of row positions backed by roaring bitmaps.

use roaring::RoaringBitmap;
use rowsift_common::{Result, RowsiftError};

/// Position of a row within the row sequence being filtered.
pub type RowId = u32;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RowSet {
    bitmap: RoaringBitmap,
}

impl RowSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every position in `0..len`.
    pub fn full(len: usize) -> Result<Self> {
        let mut bitmap = RoaringBitmap::new();
        bitmap.insert_range(0..row_id(len)?);
        Ok(Self { bitmap })
    }

    pub fn insert(&mut self, row: RowId) {
        self.bitmap.insert(row);
    }

    #[must_use]
    pub fn contains(&self, row: RowId) -> bool {
        self.bitmap.contains(row)
    }

    pub fn len(&self) -> usize {
        usize::try_from(self.bitmap.len()).unwrap_or(usize::MAX)
    }

    pub fn is_empty(&self) -> bool {
        self.bitmap.is_empty()
    }

    /// Positions in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = RowId> + '_ {
        self.bitmap.iter()
    }

    #[must_use]
    pub fn intersect(&self, other: &Self) -> Self {
        Self { bitmap: &self.bitmap & &other.bitmap }
    }

    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self { bitmap: &self.bitmap | &other.bitmap }
    }

    /// Relative complement (`self \ other`).
    #[must_use]
    pub fn difference(&self, other: &Self) -> Self {
        Self { bitmap: &self.bitmap - &other.bitmap }
    }
}

impl FromIterator<RowId> for RowSet {
    fn from_iter<I: IntoIterator<Item = RowId>>(iter: I) -> Self {
        Self { bitmap: iter.into_iter().collect() }
    }
}

/// Row positions are addressed as `u32`.
pub(crate) fn row_id(position: usize) -> Result<RowId> {
    RowId::try_from(position).map_err(|_| {
        RowsiftError::BadRequest(format!("cannot filter more than {} rows", RowId::MAX))
    })
}
