//! Xbox console controller. Sends JSON button, text, ping and power-on
//! messages to the console command port over TCP or UDP.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use super::cancel::CancelSignal;
use super::controller::DeviceControl;
use super::error::{ControlError, ControlResult, TransportError};
use super::registry::ConnectionRegistry;
use super::translator::{Translation, translate};
use super::transport::{TokioTransportFactory, TransportFactory, bounded};
use super::types::{CommandInfo, Device, DeviceCommand};
use super::wire::{TransportKind, WireMessage};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XboxConfig {
    pub command_port: u16,
    /// Ceiling for one connect+write or one datagram send
    pub timeout_ms: u64,
}

impl Default for XboxConfig {
    fn default() -> Self {
        Self {
            command_port: 5050,
            timeout_ms: 3000,
        }
    }
}

pub struct XboxController {
    transport: Arc<dyn TransportFactory>,
    registry: ConnectionRegistry,
    config: XboxConfig,
}

impl XboxController {
    pub fn new() -> Self {
        Self::with_transport(Arc::new(TokioTransportFactory))
    }

    pub fn with_transport(transport: Arc<dyn TransportFactory>) -> Self {
        Self {
            transport,
            registry: ConnectionRegistry::new(),
            config: XboxConfig::default(),
        }
    }

    pub fn with_config(mut self, config: XboxConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.config.timeout_ms = timeout_ms;
        self
    }

    pub fn config(&self) -> &XboxConfig {
        &self.config
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    fn timeout(&self) -> Duration {
        Duration::from_millis(self.config.timeout_ms)
    }

    fn require_address(device: &Device) -> ControlResult<&str> {
        device.address().ok_or_else(|| {
            warn!(device = %device.name, "Device has no IP address configured");
            ControlError::MissingAddress
        })
    }

    /// Serialize `message` and push it over the transport it calls for
    async fn send_message(
        &self,
        device: &Device,
        address: &str,
        message: WireMessage,
        cancel: &CancelSignal,
    ) -> ControlResult<()> {
        let data = message.to_bytes()?;

        let result = match message.transport() {
            TransportKind::Stream => self.send_stream(address, &data, cancel).await,
            TransportKind::Datagram => self.send_datagram(address, &data, cancel).await,
        };

        match result {
            Ok(()) => {
                debug!(address = %address, action = %message, "Sent command to Xbox");
                self.registry.touch(address);
                Ok(())
            }
            Err(e) => {
                error!(
                    device = %device.name,
                    address = %address,
                    action = %message,
                    "Failed to send command to Xbox: {}",
                    e
                );
                Err(e.into())
            }
        }
    }

    async fn send_stream(
        &self,
        address: &str,
        data: &[u8],
        cancel: &CancelSignal,
    ) -> Result<(), TransportError> {
        let port = self.config.command_port;
        let mut client = self.transport.create_stream_client();

        let result = bounded(
            async {
                client.connect(address, port).await?;
                client.write_all(data).await
            },
            self.timeout(),
            cancel,
        )
        .await;

        client.close().await;
        result
    }

    async fn send_datagram(
        &self,
        address: &str,
        data: &[u8],
        cancel: &CancelSignal,
    ) -> Result<(), TransportError> {
        let port = self.config.command_port;
        let mut client = self.transport.create_datagram_client();

        bounded(client.send_to(address, port, data), self.timeout(), cancel)
            .await
            .map(|_| ())
    }

    /// A console that accepts the ping is treated as on
    async fn toggle_power(&self, device: &Device, cancel: &CancelSignal) -> ControlResult<()> {
        let reachable = self.test_connection(device, cancel).await.is_ok();
        if cancel.is_cancelled() {
            return Err(TransportError::Cancelled.into());
        }

        if reachable {
            self.power_off(device, cancel).await
        } else {
            self.power_on(device, cancel).await
        }
    }

    /// Get all available Xbox commands
    pub fn commands() -> Vec<CommandInfo> {
        let entry = |id: &str, name: &str, icon: &str, category: &str| CommandInfo {
            id: id.into(),
            name: name.into(),
            icon: icon.into(),
            category: category.into(),
        };

        vec![
            entry("power", "Power", "\u{23fb}", "Power"),
            entry("directional_up", "Up", "\u{2b06}\u{fe0f}", "Navigation"),
            entry("directional_down", "Down", "\u{2b07}\u{fe0f}", "Navigation"),
            entry("directional_left", "Left", "\u{2b05}\u{fe0f}", "Navigation"),
            entry("directional_right", "Right", "\u{27a1}\u{fe0f}", "Navigation"),
            entry("ok", "A / Select", "\u{23fa}\u{fe0f}", "Navigation"),
            entry("back", "Back", "\u{21a9}\u{fe0f}", "Navigation"),
            entry("menu", "Guide", "\u{1f3e0}", "Navigation"),
            entry("play_pause", "Play/Pause", "\u{23ef}\u{fe0f}", "Playback"),
            entry("stop", "Stop", "\u{23f9}\u{fe0f}", "Playback"),
            entry("rewind", "Rewind", "\u{23ea}", "Playback"),
            entry("fast_forward", "Fast Forward", "\u{23e9}", "Playback"),
            entry("custom:b", "B", "\u{1f171}\u{fe0f}", "Controller"),
            entry("custom:x", "X", "\u{274e}", "Controller"),
            entry("custom:y", "Y", "\u{1f1fe}", "Controller"),
            entry("custom:lb", "Left Bumper", "LB", "Controller"),
            entry("custom:rb", "Right Bumper", "RB", "Controller"),
            entry("custom:view", "View", "\u{29c9}", "Controller"),
        ]
    }
}

impl Default for XboxController {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DeviceControl for XboxController {
    fn family(&self) -> &'static str {
        "xbox"
    }

    async fn connect(&self, device: &Device, _cancel: &CancelSignal) -> ControlResult<()> {
        let address = Self::require_address(device)?;
        self.registry.connect(address, device.token());
        Ok(())
    }

    async fn disconnect(&self, device: &Device, _cancel: &CancelSignal) -> ControlResult<()> {
        let address = device.address().ok_or(ControlError::MissingAddress)?;
        self.registry.disconnect(address);
        Ok(())
    }

    async fn send_command(
        &self,
        device: &Device,
        command: &DeviceCommand,
        cancel: &CancelSignal,
    ) -> ControlResult<()> {
        let address = Self::require_address(device)?;

        match translate(command) {
            Ok(Translation::PowerToggle) => self.toggle_power(device, cancel).await,
            Ok(Translation::Send(message)) => {
                self.send_message(device, address, message, cancel).await
            }
            Err(e) => {
                warn!(
                    device = %device.name,
                    command = %command.command_type,
                    payload = ?command.payload,
                    "Cannot translate Xbox command: {}",
                    e
                );
                Err(e)
            }
        }
    }

    async fn test_connection(&self, device: &Device, cancel: &CancelSignal) -> ControlResult<()> {
        let address = device.address().ok_or(ControlError::MissingAddress)?;
        self.send_message(device, address, WireMessage::Ping, cancel)
            .await
    }

    async fn power_on(&self, device: &Device, cancel: &CancelSignal) -> ControlResult<()> {
        let (Some(address), Some(live_id)) = (device.address(), device.token()) else {
            warn!(device = %device.name, "Device missing IP or Live ID for power on");
            return Err(if device.address().is_none() {
                ControlError::MissingAddress
            } else {
                ControlError::MissingAuthToken
            });
        };

        info!(device = %device.name, address = %address, "Powering on Xbox");
        let message = WireMessage::PowerOn {
            live_id: live_id.to_string(),
        };
        self.send_message(device, address, message, cancel).await
    }

    async fn power_off(&self, device: &Device, cancel: &CancelSignal) -> ControlResult<()> {
        let address = device.address().ok_or(ControlError::MissingAddress)?;
        self.send_message(device, address, WireMessage::button("power"), cancel)
            .await
    }

    async fn send_text(
        &self,
        device: &Device,
        text: &str,
        cancel: &CancelSignal,
    ) -> ControlResult<()> {
        let address = device.address().ok_or(ControlError::MissingAddress)?;
        let message = WireMessage::Text {
            text: text.to_string(),
        };
        self.send_message(device, address, message, cancel).await
    }
}
