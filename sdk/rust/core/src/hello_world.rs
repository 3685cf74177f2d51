//! Payload carried by HelloWorld messages.
//!
//! ```markdown
//! 0 .. 1: payload id (1)
//! 1 .. 3: message length (u16, big-endian)
//! 3 ..  : message
//! ```

use crate::Error;

/// Longest message the HelloWorld programs store in a `Received` account.
pub const MESSAGE_MAX_LENGTH: usize = 1024;

pub const PAYLOAD_ID_HELLO: u8 = 1;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HelloWorldMessage {
    Hello { message: Vec<u8> },
}

impl HelloWorldMessage {
    pub fn hello(message: impl Into<Vec<u8>>) -> Self {
        HelloWorldMessage::Hello {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &[u8] {
        match self {
            HelloWorldMessage::Hello { message } => message,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, Error> {
        let HelloWorldMessage::Hello { message } = self;
        if message.len() > MESSAGE_MAX_LENGTH {
            return Err(Error::MessageTooLarge(message.len()));
        }

        let mut out = Vec::with_capacity(3 + message.len());
        out.push(PAYLOAD_ID_HELLO);
        out.extend_from_slice(&(message.len() as u16).to_be_bytes());
        out.extend_from_slice(message);
        Ok(out)
    }

    /// The declared length has to account for every remaining byte, trailing data is rejected.
    pub fn decode(payload: &[u8]) -> Result<Self, Error> {
        if payload.len() < 3 {
            return Err(Error::PayloadTooShort(payload.len()));
        }

        let declared = u16::from_be_bytes([payload[1], payload[2]]) as usize;
        let body = &payload[3..];
        if declared != body.len() {
            return Err(Error::PayloadLengthMismatch {
                declared,
                actual: body.len(),
            });
        }

        match payload[0] {
            PAYLOAD_ID_HELLO if body.len() > MESSAGE_MAX_LENGTH => {
                Err(Error::MessageTooLarge(body.len()))
            }
            PAYLOAD_ID_HELLO => Ok(HelloWorldMessage::hello(body)),
            id => Err(Error::UnknownPayloadId(id)),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn hello_layout() {
        let encoded = HelloWorldMessage::hello("Hello World!").encode().unwrap();

        assert_eq!(encoded[0], PAYLOAD_ID_HELLO);
        assert_eq!(&encoded[1..3], &[0x00, 0x0c]);
        assert_eq!(&encoded[3..], b"Hello World!");
        assert_eq!(
            HelloWorldMessage::decode(&encoded).unwrap().message(),
            b"Hello World!"
        );
    }

    #[test]
    fn empty_message() {
        let msg = HelloWorldMessage::decode(&[1, 0, 0]).unwrap();
        assert!(msg.message().is_empty());
    }

    #[test]
    fn length_must_match() {
        assert!(matches!(
            HelloWorldMessage::decode(&[1, 0, 2, b'h']),
            Err(Error::PayloadLengthMismatch {
                declared: 2,
                actual: 1
            })
        ));
        assert!(matches!(
            HelloWorldMessage::decode(&[1, 0, 1, b'h', b'i']),
            Err(Error::PayloadLengthMismatch { .. })
        ));
        assert!(matches!(
            HelloWorldMessage::decode(&[1, 0]),
            Err(Error::PayloadTooShort(2))
        ));
    }

    #[test]
    fn unknown_payload_id() {
        assert!(matches!(
            HelloWorldMessage::decode(&[2, 0, 1, b'h']),
            Err(Error::UnknownPayloadId(2))
        ));
    }

    #[test]
    fn message_length_limit() {
        let max = vec![b'a'; MESSAGE_MAX_LENGTH];
        let encoded = HelloWorldMessage::hello(max).encode().unwrap();
        assert_eq!(encoded.len(), MESSAGE_MAX_LENGTH + 3);

        let too_long = HelloWorldMessage::hello(vec![b'a'; MESSAGE_MAX_LENGTH + 1]);
        assert!(matches!(too_long.encode(), Err(Error::MessageTooLarge(1025))));

        let mut raw = vec![1u8];
        raw.extend_from_slice(&1025u16.to_be_bytes());
        raw.extend_from_slice(&[b'a'; 1025]);
        assert!(matches!(
            HelloWorldMessage::decode(&raw),
            Err(Error::MessageTooLarge(1025))
        ));
    }
}
