mod generator;
mod poller;
#[cfg(test)]
mod tests;

pub use generator::*;
pub use poller::StepMode;
