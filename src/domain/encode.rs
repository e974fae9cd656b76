//! Categorical dummy encoding.
//!
//! Each categorical field expands into one binary indicator column per
//! declared value except the reference level, which is the first value of
//! the declared, ascending value set. Columns are named
//! `<field>_<value>` with the training-time field names. This convention
//! must match the one used at training time exactly: the aligner cannot
//! tell "legitimately zero" apart from "wrong reference level".

use super::features::EncodedVector;
use super::listing::{EncodingVariant, ListingRecord};

/// A categorical field with its declared, ascending value set.
#[derive(Debug, Clone, Copy)]
pub struct CategoricalField {
    /// Training-time field name used as the column prefix.
    pub field: &'static str,
    /// Declared values in ascending order; the first is the reference
    /// level and never gets its own indicator column.
    pub categories: &'static [i64],
}

pub const TYPE_FIELD: CategoricalField = CategoricalField {
    field: "Type",
    categories: &[1, 2, 3],
};

pub const GENRE_FIELD: CategoricalField = CategoricalField {
    field: "Genre",
    categories: &[1, 2, 3, 4, 5, 6, 7],
};

pub const CHANNEL_FIELD: CategoricalField = CategoricalField {
    field: "sale_channel",
    categories: &[1, 2, 3],
};

impl CategoricalField {
    /// The implicit reference level (all indicators zero).
    #[must_use]
    pub fn reference(&self) -> i64 {
        self.categories[0]
    }

    #[must_use]
    pub fn contains(&self, code: i64) -> bool {
        self.categories.contains(&code)
    }

    /// Indicator column name for a category code.
    #[must_use]
    pub fn column(&self, code: i64) -> String {
        format!("{}_{}", self.field, code)
    }

    /// Write this field's indicator columns for the observed code.
    ///
    /// Every declared non-reference value gets a column (0.0 or 1.0). A
    /// code outside the declared set still emits its own column; alignment
    /// drops it when the model was not trained on it.
    fn encode_into(&self, code: i64, out: &mut EncodedVector) {
        for &category in &self.categories[1..] {
            let indicator = if code == category { 1.0 } else { 0.0 };
            out.insert(self.column(category), indicator);
        }
        if code != self.reference() && !self.contains(code) {
            out.insert(self.column(code), 1.0);
        }
    }
}

/// Expand a validated record into the encoded feature map: the (already
/// standardized) continuous features plus all dummy indicator columns.
///
/// The output feature set depends on the deployment variant and is
/// reconciled against the model schema by the aligner, never assumed
/// fixed.
#[must_use]
pub fn encode(
    record: &ListingRecord,
    standardized: &EncodedVector,
    variant: EncodingVariant,
) -> EncodedVector {
    let mut out = standardized.clone();

    TYPE_FIELD.encode_into(record.listing_type, &mut out);
    GENRE_FIELD.encode_into(record.genre, &mut out);

    if variant.uses_channel() {
        if let Some(channel) = record.channel {
            CHANNEL_FIELD.encode_into(channel, &mut out);
        }
    }

    out
}
