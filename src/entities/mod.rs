pub mod prelude;

pub mod account_authorities;
pub mod accounts;
pub mod authorities;
