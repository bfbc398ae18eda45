//! Domainscope API
//!
//! Flat functions a front end calls; everything returns `Result<_, String>`
//! so errors cross any boundary as plain text.

pub mod analysis_api;
