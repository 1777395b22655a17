//! Keeps the identity session and the user's sponsor and builder profiles
//! consistent with the identity provider.

pub mod config;
pub mod effects;
mod handle;
pub mod identity;
mod resolver;
pub mod snapshot;


pub use config::ResolverConfig;
pub use effects::{Effect, Notice, NoticeLevel};
pub use handle::{AuthHandle, RefreshStatus};
pub use resolver::spawn;
pub use snapshot::{AuthSnapshot, Phase, Standing};
