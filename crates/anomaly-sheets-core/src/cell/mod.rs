//! Cell values and addresses

mod address;
mod value;

pub use address::CellAddress;
pub use value::CellValue;
