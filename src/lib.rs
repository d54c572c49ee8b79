pub mod batch;
pub mod cli;
pub mod config;
pub mod doctor;
pub mod engine;
pub mod error;
pub mod inspect;
pub mod locator;
pub mod process;
pub mod report;
pub mod runner;
pub mod util;
