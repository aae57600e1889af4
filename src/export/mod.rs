//! Report exporters.

pub mod to_pdf;
