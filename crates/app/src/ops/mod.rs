pub mod fetch;
pub mod pack;
pub mod version;

pub use fetch::Fetch;
pub use pack::Pack;
pub use version::Version;
