mod row_codec;

pub use row_codec::{deserialize_row, serialize_row, ROW_LENGTH_SIZE};
