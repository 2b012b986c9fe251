pub mod directory;
pub mod http;

pub use directory::DirectoryPageSource;
pub use http::HttpPageSource;
