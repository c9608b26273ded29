pub use super::bank_accounts::Entity as BankAccounts;
pub use super::families::Entity as Families;
pub use super::family_bank_accounts::Entity as FamilyBankAccounts;
pub use super::user_bank_accounts::Entity as UserBankAccounts;
pub use super::users::Entity as Users;
