pub mod account;
pub mod authority;
