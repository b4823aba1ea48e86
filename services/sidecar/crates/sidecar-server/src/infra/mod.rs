//! Infrastructure layer — production implementations of the application
//! ports.

pub mod command_runner;
pub mod tailnet;

pub use command_runner::TokioCommandRunner;
pub use tailnet::TailscaleCli;
