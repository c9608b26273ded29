pub mod credentials;
pub mod totp;

pub mod account_service;
pub mod account_service_impl;
pub use account_service::{AccountError, AccountService, NewUser, ProvisionedUser, UserChanges};
pub use account_service_impl::SeaOrmAccountService;

pub mod auth_service;
pub mod auth_service_impl;
pub use auth_service::{AuthError, AuthService, SignInOutcome};
pub use auth_service_impl::SeaOrmAuthService;

pub mod bank_account_service;
pub mod bank_account_service_impl;
pub use bank_account_service::{
    BankAccountChanges, BankAccountError, BankAccountService, NewBankAccount,
};
pub use bank_account_service_impl::SeaOrmBankAccountService;
