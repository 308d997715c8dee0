//! Utility modules

pub mod structured_header;
