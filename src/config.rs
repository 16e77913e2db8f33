use crate::{DeviceId, UserId};
use serde::{Deserialize, Serialize};

/// Local identity the decryption pipeline authenticates payloads against.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineConfig {
    /// Our own user id; decrypted payloads must name it as recipient.
    pub user_id: UserId,
    /// Our own device id, used in logs.
    pub device_id: DeviceId,
}

impl MachineConfig {
    /// Creates a configuration for the given local device.
    pub fn new(user_id: impl Into<UserId>, device_id: impl Into<DeviceId>) -> Self {
        Self {
            user_id: user_id.into(),
            device_id: device_id.into(),
        }
    }
}
