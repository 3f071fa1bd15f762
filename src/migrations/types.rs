pub use barrel::types::{binary, index, varchar};
use barrel::types::{custom, Type};

pub fn bigint() -> Type {
    custom("BIGINT")
}

/// Timestamps are stored as naive UTC.
pub fn utc_timestamp() -> Type {
    custom("TIMESTAMP WITHOUT TIME ZONE")
}
