#![deny(clippy::all)]

mod decode;
mod lookup;
mod normalize;
mod records;
mod table;
mod torch;

// Re-export for external use
pub use decode::{DecodeError, decode_descriptions, decode_records, decode_table};
pub use lookup::{FeatureData, LookupError};
pub use normalize::normalize_values;
pub use records::{
    DescriptionMap, DescriptionRequest, DescriptionResponse, FeatureKey, FeatureRecord,
    FeatureRecords,
};
pub use table::{FeatureRow, RowTable};
