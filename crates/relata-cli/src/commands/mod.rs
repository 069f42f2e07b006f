pub mod check;
pub mod init;
pub mod new;
pub mod run;
pub mod schema;
pub mod status;

pub use check::cmd_check;
pub use init::cmd_init;
pub use new::cmd_new;
pub use run::cmd_run;
pub use schema::cmd_schema;
pub use status::cmd_status;
