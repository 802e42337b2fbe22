//! Serial driver for the SPEC Sensors IOT-CO-1000 carbon monoxide module.
//!
//! Ref: https://www.spec-sensors.com/product/iot-co-1000-digital-co-sensor-module/

mod device;
mod frame;
mod measurement;
mod parser;

pub use device::*;
pub use frame::*;
pub use measurement::*;
pub use parser::*;
