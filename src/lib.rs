//! Core library for the merchant-mid-report command line application.
//!
//! The library turns a folder of transaction exports into a single workbook
//! with one sheet per merchant/MID pair. IO adapters live under [`io`], the
//! cell and frame representations inside [`model`], grouping and the summary
//! tables in [`aggregate`], sheet naming in [`layout`], and the end-to-end run
//! under [`pipeline`].

pub mod aggregate;
pub mod config;
pub mod error;
pub mod io;
pub mod layout;
pub mod model;
pub mod pipeline;

pub use config::{Config, SourceMode};
pub use error::{ReportError, Result};
