//! Networking: configuration, endpoint registry, relay table, handlers,
//! middleware, and lifecycle control.

pub mod config;
pub mod endpoint;
pub mod handlers;
pub mod middleware;
pub mod module;
pub mod relay;
pub mod respond;
pub mod shutdown;

pub use config::*;
pub use endpoint::*;
pub use handlers::AppState;
pub use module::GatewayModule;
pub use relay::{DispatchError, RelayTable};
pub use respond::InterceptError;
pub use shutdown::*;
