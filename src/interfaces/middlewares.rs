pub mod origin;
pub mod rate_limit;
