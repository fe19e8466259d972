use bridge_proto::DeviceSettings;

use crate::DeviceAction;

enum Mode {
    Fixed(Vec<u8>),
    EchoPayload,
}

/// Test double standing in for a physical device: either echoes the
/// request payload back unchanged, or always returns a fixed reply.
pub struct EchoDeviceAction {
    mode: Mode,
}

impl EchoDeviceAction {
    /// Reply with `payload` unchanged on every call.
    pub fn echo_payload() -> Self {
        Self {
            mode: Mode::EchoPayload,
        }
    }

    /// Reply with `reply` on every call, ignoring the request payload.
    pub fn fixed_reply(reply: impl Into<Vec<u8>>) -> Self {
        Self {
            mode: Mode::Fixed(reply.into()),
        }
    }
}

impl DeviceAction for EchoDeviceAction {
    async fn act(&mut self, payload: &[u8], _settings: &DeviceSettings) -> Vec<u8> {
        match &self.mode {
            Mode::Fixed(reply) => reply.clone(),
            Mode::EchoPayload => payload.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn echo_payload_returns_the_request_unchanged() {
        let mut action = EchoDeviceAction::echo_payload();
        let reply = action.act(b"PING", &DeviceSettings::empty()).await;
        assert_eq!(reply, b"PING");
    }

    #[tokio::test]
    async fn fixed_reply_ignores_the_request() {
        let mut action = EchoDeviceAction::fixed_reply(b"PONG\r\n".to_vec());
        let reply = action.act(b"anything", &DeviceSettings::empty()).await;
        assert_eq!(reply, b"PONG\r\n");
    }
}
