mod cancel;
mod controller;
pub mod error;
mod registry;
mod roku;
pub mod translator;
pub mod transport;
mod types;
pub mod wire;
mod xbox;

pub use cancel::{CancelHandle, CancelSignal};
pub use controller::{DeviceControl, DeviceController};
pub use error::{ControlError, ControlResult, ErrorKind, TransportError};
pub use registry::{ConnectionRecord, ConnectionRegistry};
pub use roku::{RokuConfig, RokuController};
pub use types::{CommandInfo, CommandResult, CommandType, ConnectionType, Device, DeviceCommand, DeviceType};
pub use xbox::{XboxConfig, XboxController};
