pub mod delimited;

pub use delimited::{parse_csv, parse_delimited};
