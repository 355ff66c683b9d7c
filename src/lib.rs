#![warn(missing_docs)]
//! A toolkit for reading Simrad EK60/EK80 RAW echosounder files
//!
//! Records are read with [`parser::File`], EK60 power samples are
//! calibrated to volume backscattering strength by [`calibration`], and
//! [`echogram`] stacks the pings of one frequency from one or more
//! files into a matrix.
pub mod avro;
pub mod calibration;
pub mod echogram;
pub mod error;
pub mod filetime;
pub mod frame;
pub mod inventory;
pub mod locker;
pub mod model;
pub mod parser;
pub mod primitive;

pub use error::{Error, Result};
pub use filetime::Filetime;
