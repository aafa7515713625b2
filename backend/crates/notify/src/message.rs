//! Queue wire format

use serde::{Deserialize, Serialize};

use crate::error::NotifyResult;

/// One email request as it travels through the queue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub to: String,
    pub template_id: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl EmailMessage {
    pub fn new(
        to: impl Into<String>,
        template_id: impl Into<String>,
        data: serde_json::Value,
    ) -> Self {
        Self {
            to: to.into(),
            template_id: template_id.into(),
            data,
        }
    }

    pub fn encode(&self) -> NotifyResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn decode(body: &[u8]) -> NotifyResult<Self> {
        Ok(serde_json::from_slice(body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_shape() {
        let msg = EmailMessage::new("e@x.com", "user_invitation", json!({ "username": "ann" }));
        let value: serde_json::Value = serde_json::from_slice(&msg.encode().unwrap()).unwrap();
        assert_eq!(value["to"], "e@x.com");
        assert_eq!(value["template_id"], "user_invitation");
        assert_eq!(value["data"]["username"], "ann");
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(EmailMessage::decode(b"not json").is_err());
    }
}
