pub mod bank_account;
pub mod family;
pub mod user;
