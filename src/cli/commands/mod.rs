pub mod add;
pub mod copy;
pub mod delete;
pub mod init;
pub mod list;
pub mod shell;
pub mod status;
