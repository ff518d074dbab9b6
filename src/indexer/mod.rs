pub mod batch;
pub mod classifier;
pub mod client;
pub mod cycle;
pub mod decoder;
pub mod partition;
pub mod timestamps;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;
