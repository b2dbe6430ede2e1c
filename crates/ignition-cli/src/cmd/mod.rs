pub mod checkpoint;
pub mod config;
pub mod init;
pub mod repair;
pub mod route;
pub mod run;
pub mod status;
