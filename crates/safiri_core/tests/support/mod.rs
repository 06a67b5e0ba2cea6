pub mod fleet;
pub mod session;
