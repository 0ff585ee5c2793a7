pub mod scheduler;

pub use scheduler::{run_once, Scheduler};
