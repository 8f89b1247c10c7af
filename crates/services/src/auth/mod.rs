pub mod flow;
pub mod ports;
pub mod store;

pub use flow::AuthFlow;
pub use ports::*;
pub use store::SessionStore;
