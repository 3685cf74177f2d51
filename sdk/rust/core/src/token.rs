//! Token bridge payloads and the amount arithmetic HelloToken performs around them.
//!
//! The token bridge only carries 8 decimals of precision. Amounts of tokens with more decimals are
//! truncated on the way out ("normalized") and scaled back up on the way in ("denormalized"), so
//! the dust below the 8th decimal never leaves the sender.

use primitive_types::U256;
use serde::{Deserialize, Serialize};

use crate::{Address, Amount, Chain, Error};

/// Decimals the token bridge keeps when moving amounts across chains.
pub const MAX_DECIMALS: u8 = 8;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Message {
    #[serde(rename = "1")]
    Transfer {
        amount: Amount,
        token_address: Address,
        token_chain: Chain,
        recipient: Address,
        recipient_chain: Chain,
        fee: Amount,
    },
    #[serde(rename = "2")]
    AssetMeta {
        token_address: Address,
        token_chain: Chain,
        decimals: u8,
        symbol: Address,
        name: Address,
    },
    #[serde(rename = "3")]
    TransferWithPayload {
        amount: Amount,
        token_address: Address,
        token_chain: Chain,
        recipient: Address,
        recipient_chain: Chain,
        sender_address: Address,
        // The payload is directly appended to the message.
    },
}

impl Message {
    /// Name or symbol of an `AssetMeta`, with the trailing zero padding removed.
    pub fn fixed_string(raw: &Address) -> String {
        let end = raw.0.iter().rposition(|b| *b != 0).map_or(0, |i| i + 1);
        String::from_utf8_lossy(&raw.0[..end]).into_owned()
    }
}

const PAYLOAD_ID_TRANSFER_WITH_PAYLOAD: u8 = 3;

/// Encoded size of a `TransferWithPayload` message, without the appended payload.
pub const TRANSFER_WITH_PAYLOAD_LEN: usize = 133;

/// Splits a `TransferWithPayload` message from the application payload appended to it.
pub fn parse_transfer_with_payload(bytes: &[u8]) -> Result<(Message, &[u8]), Error> {
    match bytes.first() {
        None => return Err(Error::PayloadTooShort(0)),
        Some(&PAYLOAD_ID_TRANSFER_WITH_PAYLOAD) => {}
        Some(&id) => return Err(Error::UnknownPayloadId(id)),
    }
    if bytes.len() < TRANSFER_WITH_PAYLOAD_LEN {
        return Err(Error::PayloadTooShort(bytes.len()));
    }

    let (message, payload) = bytes.split_at(TRANSFER_WITH_PAYLOAD_LEN);
    Ok((serde_wormhole::from_slice(message)?, payload))
}

pub fn encode_transfer_with_payload(message: &Message, payload: &[u8]) -> Result<Vec<u8>, Error> {
    let mut out = serde_wormhole::to_vec(message)?;
    out.extend_from_slice(payload);
    Ok(out)
}

fn scale(decimals: u8) -> Option<U256> {
    (decimals > MAX_DECIMALS).then(|| U256::exp10((decimals - MAX_DECIMALS) as usize))
}

/// Drops the precision the token bridge cannot carry.
pub fn normalize_amount(amount: U256, decimals: u8) -> U256 {
    match scale(decimals) {
        Some(s) => amount / s,
        None => amount,
    }
}

/// Scales a bridged amount back to the token's native decimals.
pub fn denormalize_amount(amount: U256, decimals: u8) -> Result<U256, Error> {
    match scale(decimals) {
        Some(s) => amount.checked_mul(s).ok_or(Error::AmountOverflow),
        None => Ok(amount),
    }
}

/// The part of `amount` that survives a round trip through the token bridge.
pub fn truncate_dust(amount: U256, decimals: u8) -> Result<U256, Error> {
    denormalize_amount(normalize_amount(amount, decimals), decimals)
}

/// Fee paid to the relayer that redeems a transfer: `floor(amount * fee / precision)`.
pub fn compute_relayer_fee(amount: u64, fee: u32, precision: u32) -> Result<u64, Error> {
    if precision == 0 {
        return Err(Error::ZeroFeePrecision);
    }
    if fee > precision {
        return Err(Error::FeeExceedsPrecision { fee, precision });
    }

    // fee <= precision, so the quotient never exceeds amount.
    Ok((amount as u128 * fee as u128 / precision as u128) as u64)
}

#[cfg(test)]
mod test {
    use super::*;

    fn transfer_with_payload() -> Message {
        Message::TransferWithPayload {
            amount: Amount::from(12_345_678u64),
            token_address: Address([0x11; 32]),
            token_chain: Chain::Solana,
            recipient: Address([0x22; 32]),
            recipient_chain: Chain::Ethereum,
            sender_address: Address([0x33; 32]),
        }
    }

    #[test]
    fn transfer_with_payload_layout() {
        let message = transfer_with_payload();
        let bytes = encode_transfer_with_payload(&message, &[1, 0xaa]).unwrap();

        // id + amount + token + chain + recipient + chain + sender
        assert_eq!(bytes.len(), TRANSFER_WITH_PAYLOAD_LEN + 2);
        assert_eq!(bytes[0], 3);
        assert_eq!(&bytes[65..67], &[0x00, 0x01]);
        assert_eq!(&bytes[99..101], &[0x00, 0x02]);

        let (parsed, payload) = parse_transfer_with_payload(&bytes).unwrap();
        assert_eq!(parsed, message);
        assert_eq!(payload, &[1, 0xaa]);
    }

    #[test]
    fn plain_transfer_is_not_a_transfer_with_payload() {
        let message = Message::Transfer {
            amount: Amount::from(1u64),
            token_address: Address([1; 32]),
            token_chain: Chain::Ethereum,
            recipient: Address([2; 32]),
            recipient_chain: Chain::Solana,
            fee: Amount::default(),
        };
        let bytes = serde_wormhole::to_vec(&message).unwrap();

        assert!(matches!(
            parse_transfer_with_payload(&bytes),
            Err(Error::UnknownPayloadId(1))
        ));
    }

    #[test]
    fn truncated_transfer_with_payload() {
        let bytes = encode_transfer_with_payload(&transfer_with_payload(), &[]).unwrap();

        assert!(matches!(
            parse_transfer_with_payload(&bytes[..100]),
            Err(Error::PayloadTooShort(100))
        ));
        assert!(matches!(
            parse_transfer_with_payload(&[]),
            Err(Error::PayloadTooShort(0))
        ));

        let (_, payload) = parse_transfer_with_payload(&bytes).unwrap();
        assert!(payload.is_empty());
    }

    #[test]
    fn asset_meta_strings() {
        let mut symbol = [0u8; 32];
        symbol[..4].copy_from_slice(b"WETH");
        assert_eq!(Message::fixed_string(&Address(symbol)), "WETH");

        let mut name = [0u8; 32];
        name[..5].copy_from_slice(b"a\0b\0c");
        assert_eq!(Message::fixed_string(&Address(name)), "a\0b\0c");
        assert_eq!(Message::fixed_string(&Address::default()), "");
    }

    #[test]
    fn normalize() {
        let amount = U256::from(1_234_567_891_234_567_890u64);

        assert_eq!(normalize_amount(amount, 18), U256::from(123_456_789u64));
        assert_eq!(normalize_amount(amount, 8), amount);
        assert_eq!(normalize_amount(amount, 6), amount);
        assert_eq!(
            truncate_dust(amount, 18).unwrap(),
            U256::from(1_234_567_890_000_000_000u64)
        );
    }

    #[test]
    fn denormalize() {
        assert_eq!(
            denormalize_amount(U256::from(123_456_789u64), 18).unwrap(),
            U256::from(1_234_567_890_000_000_000u64)
        );
        assert_eq!(denormalize_amount(U256::from(5u64), 6).unwrap(), U256::from(5u64));
        assert!(matches!(
            denormalize_amount(U256::MAX, 18),
            Err(Error::AmountOverflow)
        ));
    }

    #[test]
    fn relayer_fee() {
        assert_eq!(compute_relayer_fee(1_000_000, 10_000, 1_000_000).unwrap(), 10_000);
        assert_eq!(compute_relayer_fee(999, 1, 1_000).unwrap(), 0);
        assert_eq!(compute_relayer_fee(u64::MAX, 1, 1).unwrap(), u64::MAX);
        assert!(matches!(
            compute_relayer_fee(1, 1, 0),
            Err(Error::ZeroFeePrecision)
        ));
        assert!(matches!(
            compute_relayer_fee(1, 2, 1),
            Err(Error::FeeExceedsPrecision { .. })
        ));
    }
}
