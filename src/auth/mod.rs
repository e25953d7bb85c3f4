mod actor;
pub mod authorizor;
mod platform;

pub use actor::Actor;
pub use platform::Platform;
