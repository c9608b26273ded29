pub mod prelude;

pub mod bank_accounts;
pub mod families;
pub mod family_bank_accounts;
pub mod user_bank_accounts;
pub mod users;
