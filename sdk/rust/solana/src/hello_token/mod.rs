//! Client side of the HelloToken program: it sends tokens through the token bridge with a
//! payload naming the recipient, and redeems the transfers other HelloToken contracts send it,
//! paying the relayer a configurable share.

mod accounts;
mod instructions;

pub use {
    accounts::{
        tmp_token_account,
        wormhole_message,
        ForeignContract,
        InboundTokenBridgeAddresses,
        OutboundTokenBridgeAddresses,
        RedeemerConfig,
        SenderConfig,
    },
    instructions::{
        initialize,
        redeem_native_transfer_with_payload,
        redeem_wrapped_transfer_with_payload,
        register_foreign_contract,
        send_native_tokens_with_payload,
        send_wrapped_tokens_with_payload,
        update_relayer_fee,
        ProgramIds,
        Redemption,
        SendTokens,
    },
};
