pub mod error;
pub use error::IdentityError;

pub mod password;
pub use password::{Argon2Hasher, CredentialHasher};

pub mod session;
pub use session::Session;

pub mod account_service;
pub mod account_service_impl;
pub use account_service::AccountService;
pub use account_service_impl::SeaOrmAccountService;

pub mod authority_service;
pub mod authority_service_impl;
pub use authority_service::AuthorityService;
pub use authority_service_impl::SeaOrmAuthorityService;

pub mod auth_service;
pub mod auth_service_impl;
pub use auth_service::AuthService;
pub use auth_service_impl::SeaOrmAuthService;
