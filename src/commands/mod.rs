pub mod networks;
pub mod trace;
pub mod watch;
