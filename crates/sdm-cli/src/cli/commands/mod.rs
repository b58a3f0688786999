//! One module per subcommand.

mod check;
mod pause;
mod resume;
mod run;
mod status;
mod threshold;
mod toggle;
mod watch;

pub use check::run_check;
pub use pause::run_pause;
pub use resume::run_resume;
pub use run::run_monitor;
pub use status::run_status;
pub use threshold::run_threshold;
pub use toggle::run_toggle;
pub use watch::run_watch;
