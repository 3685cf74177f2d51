//! Payload HelloToken attaches to token bridge transfers. It names the wallet that should end up
//! with the tokens once a relayer redeems the transfer on the target chain.

use serde::{Deserialize, Serialize};

use crate::{Address, Error};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HelloTokenMessage {
    #[serde(rename = "1")]
    Hello { recipient: Address },
}

impl HelloTokenMessage {
    pub fn recipient(&self) -> Address {
        match self {
            HelloTokenMessage::Hello { recipient } => *recipient,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, Error> {
        Ok(serde_wormhole::to_vec(self)?)
    }

    pub fn decode(payload: &[u8]) -> Result<Self, Error> {
        Ok(serde_wormhole::from_slice(payload)?)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn hello_layout() {
        let recipient = Address([7u8; 32]);
        let encoded = HelloTokenMessage::Hello { recipient }.encode().unwrap();

        assert_eq!(encoded.len(), 33);
        assert_eq!(encoded[0], 1);
        assert_eq!(&encoded[1..], &[7u8; 32]);
        assert_eq!(
            HelloTokenMessage::decode(&encoded).unwrap().recipient(),
            recipient
        );
    }

    #[test]
    fn rejects_malformed_payloads() {
        let mut buf = [0u8; 34];
        buf[0] = 1;

        assert!(HelloTokenMessage::decode(&buf).is_err());
        assert!(HelloTokenMessage::decode(&buf[..20]).is_err());

        buf[0] = 2;
        assert!(HelloTokenMessage::decode(&buf[..33]).is_err());
    }
}
