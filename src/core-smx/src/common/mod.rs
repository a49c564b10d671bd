mod env_flag;
mod logging;

pub use env_flag::env_flag;
pub use logging::setup_logging;
