pub mod addr;
pub mod error;

pub use addr::VirtualHost;
pub use error::{VhostError, VhostErrorKind};
