//! Audio device discovery via cpal.

use cpal::traits::{DeviceTrait, HostTrait};
use cpal::{Device, Host};

use crate::{Error, Result};

const FALLBACK_SAMPLE_RATE: u32 = 48000;

/// Audio device information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioDevice {
    /// Human-readable device name.
    pub name: String,
    /// Whether the device supports audio input.
    pub is_input: bool,
    /// Whether the device supports audio output.
    pub is_output: bool,
    /// Default sample rate in Hz.
    pub default_sample_rate: u32,
}

/// Device name via `description()` (cpal 0.17+).
pub(crate) fn device_name(device: &Device) -> Option<String> {
    device.description().ok().map(|d| d.name().to_string())
}

fn describe(device: &Device) -> Option<AudioDevice> {
    let name = device_name(device)?;
    let input = device.default_input_config().ok();
    let output = device.default_output_config().ok();
    let default_sample_rate = input
        .as_ref()
        .or(output.as_ref())
        .map_or(FALLBACK_SAMPLE_RATE, |c| c.sample_rate());
    Some(AudioDevice {
        name,
        is_input: input.is_some(),
        is_output: output.is_some(),
        default_sample_rate,
    })
}

/// List input and output devices of the default host, each name once.
pub fn list_devices() -> Result<Vec<AudioDevice>> {
    let host = cpal::default_host();
    let mut devices: Vec<AudioDevice> = Vec::new();

    let inputs = host.input_devices().into_iter().flatten();
    let outputs = host.output_devices().into_iter().flatten();
    for device in inputs.chain(outputs) {
        if let Some(info) = describe(&device)
            && !devices.iter().any(|d| d.name == info.name)
        {
            devices.push(info);
        }
    }

    tracing::debug!(count = devices.len(), host = host.id().name(), "devices listed");
    Ok(devices)
}

/// Default `(input, output)` devices, if the host has them.
pub fn default_device() -> Result<(Option<AudioDevice>, Option<AudioDevice>)> {
    let host = cpal::default_host();
    let input = host.default_input_device().as_ref().and_then(describe);
    let output = host.default_output_device().as_ref().and_then(describe);
    Ok((input, output))
}

/// Find a device whose name contains `name` (case-insensitive), or the
/// default device when `name` is `None`.
pub(crate) fn find_device(host: &Host, name: Option<&str>, input: bool) -> Result<Device> {
    let Some(search) = name else {
        let default = if input {
            host.default_input_device()
        } else {
            host.default_output_device()
        };
        return default.ok_or(Error::NoDevice);
    };

    let devices = if input {
        host.input_devices()
    } else {
        host.output_devices()
    }
    .map_err(|e| Error::Stream(e.to_string()))?
    .collect::<Vec<_>>();

    let needle = search.to_lowercase();
    devices
        .into_iter()
        .find(|d| device_name(d).is_some_and(|n| n.to_lowercase().contains(&needle)))
        .ok_or_else(|| {
            Error::DeviceNotFound(format!(
                "no {} device matching '{}'",
                if input { "input" } else { "output" },
                search
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_devices_does_not_fail() {
        // Availability depends on the machine; listing itself must succeed.
        let devices = list_devices().unwrap();
        for d in &devices {
            assert!(d.is_input || d.is_output, "{:?}", d);
        }
    }

    #[test]
    fn test_unknown_device_name() {
        let host = cpal::default_host();
        let result = find_device(&host, Some("no-such-device-xyzzy"), false);
        assert!(matches!(
            result,
            Err(Error::DeviceNotFound(_) | Error::Stream(_))
        ));
    }
}
