mod check;
mod serve;
mod whitelist;

pub use check::{run_check, run_check_via_socket};
pub use serve::run_serve;
pub use whitelist::run_whitelist;
