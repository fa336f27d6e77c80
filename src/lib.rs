// src/lib.rs — Library root for promptsmith

pub mod analyzer;
pub mod cli;
pub mod core;
pub mod infra;
pub mod oracle;
pub mod util;
