mod add;
mod clean;
mod download;
mod list;
mod remove;
mod run;
mod update;

pub use add::cmd_add;
pub use clean::cmd_clean;
pub use download::cmd_download;
pub use list::cmd_list;
pub use remove::cmd_remove;
pub use run::cmd_run;
pub use update::cmd_update;
