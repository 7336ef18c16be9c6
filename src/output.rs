//! Report printers.

pub mod printer;
pub mod table;
