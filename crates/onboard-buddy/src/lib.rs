pub mod config;
pub mod error;
pub mod google;
pub mod telemetry;
pub mod workflows;

#[cfg(test)]
mod test_support;
