// Device commands
pub mod run;

// Offline commands
pub mod check;
pub mod diff;
pub mod rules;

pub mod config;
