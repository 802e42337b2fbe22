mod batch;
mod client;
mod data_point;
mod metric_name;
mod warm_up;

pub use batch::*;
pub use client::*;
pub use data_point::*;
pub use metric_name::*;
pub use warm_up::*;
