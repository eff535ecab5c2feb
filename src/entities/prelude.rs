pub use super::account_authorities::Entity as AccountAuthorities;
pub use super::accounts::Entity as Accounts;
pub use super::authorities::Entity as Authorities;
