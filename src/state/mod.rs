//! State owned by the dispatcher.
//!
//! Neither store synchronizes internally. They are meant to be owned by a
//! single consumer (the [`Dispatcher`](crate::Dispatcher), which in turn is
//! owned by the driver task) so that datagrams are applied in arrival order.

mod registry;
mod session;

pub use registry::DriverRegistry;
pub use session::SessionState;
