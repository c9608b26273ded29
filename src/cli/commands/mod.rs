mod create_family;
mod init;

pub use create_family::cmd_create_family;
pub use init::cmd_init;
