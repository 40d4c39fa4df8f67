//! Domain types shared by the driver, the broker port and the runner.

pub mod bar;
pub mod ids;
pub mod order;
pub mod position;

pub use bar::Bar;
pub use ids::OrderId;
pub use order::{OrderHandle, OrderKind, OrderRole, OrderSide, OrderStatus};
pub use position::Position;
