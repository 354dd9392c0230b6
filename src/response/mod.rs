//! Response decoding: JSON rows back into typed nested objects.

pub mod decoder;
pub mod errors;
pub mod highlight;

pub use decoder::{decode_row, decode_rows, DecodeContext, DecodedRows};
pub use errors::DecodeError;
pub use highlight::{highlight_terms, HIGHLIGHT_CLOSE, HIGHLIGHT_OPEN};
