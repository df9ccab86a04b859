// Adapters layer: concrete implementations of the domain ports.

pub mod notifier;
pub mod smtp;
pub mod storage;
