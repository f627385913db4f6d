//! Roku ECP controller. Implements the External Control Protocol on port 8060:
//! keypresses are HTTP POSTs and the device-info query doubles as a ping.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use super::cancel::CancelSignal;
use super::controller::DeviceControl;
use super::error::{ControlError, ControlResult, TransportError};
use super::registry::ConnectionRegistry;
use super::translator::number_button;
use super::transport::bounded;
use super::types::{CommandType, Device, DeviceCommand};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RokuConfig {
    pub port: u16,
    pub timeout_ms: u64,
}

impl Default for RokuConfig {
    fn default() -> Self {
        Self {
            port: 8060,
            timeout_ms: 3000,
        }
    }
}

const CUSTOM_KEYS: &[(&str, &str)] = &[
    ("home", "Home"),
    ("info", "Info"),
    ("search", "Search"),
    ("replay", "InstantReplay"),
    ("backspace", "Backspace"),
    ("enter", "Enter"),
    ("volume_up", "VolumeUp"),
    ("volume_down", "VolumeDown"),
    ("mute", "VolumeMute"),
    ("channel_up", "ChannelUp"),
    ("channel_down", "ChannelDown"),
    ("input_hdmi1", "InputHDMI1"),
    ("input_hdmi2", "InputHDMI2"),
    ("input_hdmi3", "InputHDMI3"),
];

/// Map a command onto an ECP key name
pub fn roku_key(command: &DeviceCommand) -> ControlResult<String> {
    let unmapped = || ControlError::Unmapped {
        kind: command.command_type.clone(),
        payload: command.payload.clone(),
    };

    let key = match &command.command_type {
        CommandType::Power => "Power",
        CommandType::Menu => "Home",
        CommandType::Back => "Back",
        CommandType::DirectionalUp => "Up",
        CommandType::DirectionalDown => "Down",
        CommandType::DirectionalLeft => "Left",
        CommandType::DirectionalRight => "Right",
        CommandType::Ok => "Select",
        CommandType::PlayPause => "Play",
        CommandType::FastForward => "Fwd",
        CommandType::Rewind => "Rev",
        // ECP has no stop key
        CommandType::Stop => return Err(unmapped()),
        CommandType::Number => {
            let digit = number_button(command.payload.as_deref()).ok_or_else(unmapped)?;
            return Ok(format!("Lit_{}", digit));
        }
        CommandType::Custom => {
            let wanted = command.payload.as_deref().ok_or_else(unmapped)?.to_lowercase();
            CUSTOM_KEYS
                .iter()
                .find(|(name, _)| *name == wanted)
                .map(|(_, key)| *key)
                .ok_or_else(unmapped)?
        }
        CommandType::Unknown => {
            return Err(ControlError::UnknownCommand(command.command_type.clone()));
        }
    };

    Ok(key.to_string())
}

/// Roku External Control Protocol implementation
pub struct RokuController {
    registry: ConnectionRegistry,
    config: RokuConfig,
}

impl RokuController {
    pub fn new() -> Self {
        Self {
            registry: ConnectionRegistry::new(),
            config: RokuConfig::default(),
        }
    }

    pub fn with_config(mut self, config: RokuConfig) -> Self {
        self.config = config;
        self
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    fn base_url(&self, ip: &str) -> String {
        if ip.contains(':') {
            format!("http://[{}]:{}", ip, self.config.port)
        } else {
            format!("http://{}:{}", ip, self.config.port)
        }
    }

    fn keypress_url(&self, ip: &str, key: &str) -> Result<reqwest::Url, TransportError> {
        let mut url = reqwest::Url::parse(&self.base_url(ip))
            .map_err(|_| TransportError::Resolve(ip.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| TransportError::Resolve(ip.to_string()))?
            .pop_if_empty()
            .push("keypress")
            .push(key);
        Ok(url)
    }

    fn http_client(&self) -> Result<reqwest::Client, TransportError> {
        Ok(reqwest::Client::builder()
            .timeout(Duration::from_millis(self.config.timeout_ms))
            .build()?)
    }

    async fn post_keypress(
        &self,
        device: &Device,
        ip: &str,
        key: &str,
        cancel: &CancelSignal,
    ) -> ControlResult<()> {
        let request = async {
            let url = self.keypress_url(ip, key)?;
            let response = self.http_client()?.post(url).send().await?;
            if response.status().is_success() {
                Ok(())
            } else {
                Err(TransportError::Status(response.status().as_u16()))
            }
        };

        let limit = Duration::from_millis(self.config.timeout_ms);
        match bounded(request, limit, cancel).await {
            Ok(()) => {
                debug!(address = %ip, key = %key, "Sent keypress to Roku");
                self.registry.touch(ip);
                Ok(())
            }
            Err(e) => {
                error!(device = %device.name, address = %ip, key = %key, "Failed to send keypress to Roku: {}", e);
                Err(e.into())
            }
        }
    }
}

impl Default for RokuController {
    fn default() -> Self {
        Self::new()
    }
}

fn require_address(device: &Device) -> ControlResult<&str> {
    device.address().ok_or_else(|| {
        warn!(device = %device.name, "Device has no IP address configured");
        ControlError::MissingAddress
    })
}

#[async_trait]
impl DeviceControl for RokuController {
    fn family(&self) -> &'static str {
        "roku"
    }

    async fn connect(&self, device: &Device, _cancel: &CancelSignal) -> ControlResult<()> {
        let ip = require_address(device)?;
        self.registry.connect(ip, device.token());
        Ok(())
    }

    async fn disconnect(&self, device: &Device, _cancel: &CancelSignal) -> ControlResult<()> {
        let ip = device.address().ok_or(ControlError::MissingAddress)?;
        self.registry.disconnect(ip);
        Ok(())
    }

    async fn send_command(
        &self,
        device: &Device,
        command: &DeviceCommand,
        cancel: &CancelSignal,
    ) -> ControlResult<()> {
        let ip = require_address(device)?;
        let key = roku_key(command).inspect_err(|e| {
            warn!(device = %device.name, command = %command.command_type, "Cannot translate Roku command: {}", e);
        })?;
        self.post_keypress(device, ip, &key, cancel).await
    }

    async fn test_connection(&self, device: &Device, cancel: &CancelSignal) -> ControlResult<()> {
        let ip = device.address().ok_or(ControlError::MissingAddress)?;
        let url = format!("{}/query/device-info", self.base_url(ip));

        let query = async {
            let response = self.http_client()?.get(&url).send().await?;
            if response.status().is_success() {
                Ok(())
            } else {
                Err(TransportError::Status(response.status().as_u16()))
            }
        };

        let limit = Duration::from_millis(self.config.timeout_ms);
        bounded(query, limit, cancel).await.map_err(|e| {
            error!(device = %device.name, address = %ip, "Roku did not answer device-info: {}", e);
            e.into()
        })
    }

    async fn power_on(&self, device: &Device, cancel: &CancelSignal) -> ControlResult<()> {
        let ip = require_address(device)?;
        self.post_keypress(device, ip, "PowerOn", cancel).await
    }

    async fn power_off(&self, device: &Device, cancel: &CancelSignal) -> ControlResult<()> {
        let ip = require_address(device)?;
        self.post_keypress(device, ip, "PowerOff", cancel).await
    }

    /// Types each character as a `Lit_` keypress
    async fn send_text(
        &self,
        device: &Device,
        text: &str,
        cancel: &CancelSignal,
    ) -> ControlResult<()> {
        let ip = require_address(device)?;
        for ch in text.chars() {
            self.post_keypress(device, ip, &format!("Lit_{}", ch), cancel)
                .await?;
        }
        Ok(())
    }
}
