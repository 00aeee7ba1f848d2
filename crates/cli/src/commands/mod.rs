//! Command implementations.

mod check;
mod run;
mod validate;

pub use check::run_check;
pub use run::run_distributor;
pub use validate::run_validate;
