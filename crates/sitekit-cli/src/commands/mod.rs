pub mod breakpoint;
pub mod config;
pub mod replay;
