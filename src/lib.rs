pub mod app;
pub mod common;
pub mod config;
pub mod logging;
pub mod router;

pub use app::dispatcher::{CommandSink, DispatchReport};
pub use app::status::{FsIconLoader, IconLoader, StatusResponse};
pub use app::{ConnectionEvents, JoinOutcome, VhostService};
pub use common::{VhostError, VhostErrorKind, VirtualHost};
pub use router::rules::VhostRule;
pub use router::RuleTable;
