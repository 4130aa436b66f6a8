//! Test modules for meshcorr-io
//!
//! Vertex list parsing for each format, and the text tables written after a
//! correspondence run.

pub mod vertex_io_tests;
