pub mod db;
pub mod iotco1000;
pub mod metrics;
pub mod pipeline;
