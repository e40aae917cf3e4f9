pub mod command;
pub mod error;
pub mod render;

pub use command::report;
pub use error::Error;
pub use render::ReportFormat;

pub type Result<T> = std::result::Result<T, Error>;
