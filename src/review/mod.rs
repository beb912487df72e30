pub mod issues;
pub mod session;
