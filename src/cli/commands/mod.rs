//! Command implementations

mod baseline;
mod init;
mod manifest;
mod project;
mod run;
mod scan;
mod scope;

pub use baseline::baseline;
pub use init::init;
pub use manifest::manifest;
pub use run::run;
pub use scan::scan;
pub use scope::scope;
