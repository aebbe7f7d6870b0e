pub mod config;
pub mod generate;
pub mod identity;
pub mod inspect;
