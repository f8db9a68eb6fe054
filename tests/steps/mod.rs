//! Step definitions for the behavioural suites.

mod compression_steps;
mod monitor_steps;
mod provider_steps;
