use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use super::cancel::CancelSignal;
use super::error::{ControlError, ControlResult};
use super::roku::RokuController;
use super::types::{CommandResult, Device, DeviceCommand, DeviceType};
use super::xbox::XboxController;

/// Capability set every device family implements.
///
/// No method panics or leaks an I/O error; each returns a [`ControlResult`]
/// whose error says why the operation did not happen.
#[async_trait]
pub trait DeviceControl: Send + Sync {
    /// Family tag, e.g. "xbox"
    fn family(&self) -> &'static str;

    async fn connect(&self, device: &Device, cancel: &CancelSignal) -> ControlResult<()>;

    async fn disconnect(&self, device: &Device, cancel: &CancelSignal) -> ControlResult<()>;

    async fn send_command(
        &self,
        device: &Device,
        command: &DeviceCommand,
        cancel: &CancelSignal,
    ) -> ControlResult<()>;

    async fn test_connection(&self, device: &Device, cancel: &CancelSignal) -> ControlResult<()>;

    async fn power_on(&self, device: &Device, cancel: &CancelSignal) -> ControlResult<()>;

    async fn power_off(&self, device: &Device, cancel: &CancelSignal) -> ControlResult<()>;

    async fn send_text(&self, device: &Device, text: &str, cancel: &CancelSignal)
    -> ControlResult<()>;
}

/// Main device controller that routes to the implementation registered for a
/// device's type
pub struct DeviceController {
    controllers: HashMap<DeviceType, Arc<dyn DeviceControl>>,
}

impl DeviceController {
    /// Empty router; see [`DeviceController::default`] for the built-in families
    pub fn new() -> Self {
        Self {
            controllers: HashMap::new(),
        }
    }

    pub fn register(&mut self, device_type: DeviceType, controller: Arc<dyn DeviceControl>) {
        self.controllers.insert(device_type, controller);
    }

    pub fn controller_for(&self, device_type: DeviceType) -> ControlResult<&Arc<dyn DeviceControl>> {
        self.controllers
            .get(&device_type)
            .ok_or_else(|| ControlError::UnknownDeviceType(device_type.to_string()))
    }

    pub fn supports(&self, device_type: DeviceType) -> bool {
        self.controllers.contains_key(&device_type)
    }

    fn finish(device: &Device, what: &str, outcome: ControlResult<()>) -> CommandResult {
        if let Err(ControlError::UnknownDeviceType(t)) = &outcome {
            warn!(device = %device.name, device_type = %t, "No controller for device type");
        }
        CommandResult::from_outcome(outcome, what)
    }

    pub async fn connect(&self, device: &Device, cancel: &CancelSignal) -> CommandResult {
        let outcome = match self.controller_for(device.device_type) {
            Ok(c) => c.connect(device, cancel).await,
            Err(e) => Err(e),
        };
        Self::finish(device, "connect", outcome)
    }

    pub async fn disconnect(&self, device: &Device, cancel: &CancelSignal) -> CommandResult {
        let outcome = match self.controller_for(device.device_type) {
            Ok(c) => c.disconnect(device, cancel).await,
            Err(e) => Err(e),
        };
        Self::finish(device, "disconnect", outcome)
    }

    /// Send a command to a device
    pub async fn send_command(
        &self,
        device: &Device,
        command: &DeviceCommand,
        cancel: &CancelSignal,
    ) -> CommandResult {
        let outcome = match self.controller_for(device.device_type) {
            Ok(c) => c.send_command(device, command, cancel).await,
            Err(e) => Err(e),
        };
        Self::finish(device, &format!("{} command", command.command_type), outcome)
    }

    pub async fn test_connection(&self, device: &Device, cancel: &CancelSignal) -> CommandResult {
        let outcome = match self.controller_for(device.device_type) {
            Ok(c) => c.test_connection(device, cancel).await,
            Err(e) => Err(e),
        };
        Self::finish(device, "connection test", outcome)
    }

    pub async fn power_on(&self, device: &Device, cancel: &CancelSignal) -> CommandResult {
        let outcome = match self.controller_for(device.device_type) {
            Ok(c) => c.power_on(device, cancel).await,
            Err(e) => Err(e),
        };
        Self::finish(device, "power on", outcome)
    }

    pub async fn power_off(&self, device: &Device, cancel: &CancelSignal) -> CommandResult {
        let outcome = match self.controller_for(device.device_type) {
            Ok(c) => c.power_off(device, cancel).await,
            Err(e) => Err(e),
        };
        Self::finish(device, "power off", outcome)
    }

    pub async fn send_text(
        &self,
        device: &Device,
        text: &str,
        cancel: &CancelSignal,
    ) -> CommandResult {
        let outcome = match self.controller_for(device.device_type) {
            Ok(c) => c.send_text(device, text, cancel).await,
            Err(e) => Err(e),
        };
        Self::finish(device, "send text", outcome)
    }
}

impl Default for DeviceController {
    /// Xbox consoles (also when classified as a generic game console) and Roku
    /// players, both talking over real sockets
    fn default() -> Self {
        let xbox: Arc<dyn DeviceControl> = Arc::new(XboxController::new());
        let roku: Arc<dyn DeviceControl> = Arc::new(RokuController::new());

        let mut router = Self::new();
        router.register(DeviceType::Xbox, xbox.clone());
        router.register(DeviceType::GameConsole, xbox);
        router.register(DeviceType::Roku, roku.clone());
        router.register(DeviceType::StreamingDevice, roku);
        router
    }
}
