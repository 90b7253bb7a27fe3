#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::doc_markdown,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::uninlined_format_args,
    clippy::unused_self
)]

pub mod channels;
pub mod config;
pub mod export;
pub mod generator;
pub mod github;
pub mod health;
pub mod providers;
pub mod sanitize;
pub mod session;

pub use config::Config;
