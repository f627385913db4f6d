//! Device command dispatch. Turns an abstract remote-control command for a
//! registered device into the vendor wire message and sends it over TCP, UDP
//! or HTTP, reporting every failure as a result instead of a panic.

pub mod device_control;

#[cfg(test)]
mod test_utils;

pub use device_control::{
    CancelSignal, CommandResult, CommandType, Device, DeviceCommand, DeviceControl,
    DeviceController, DeviceType,
};
