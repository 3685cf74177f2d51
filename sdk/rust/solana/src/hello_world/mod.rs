//! Client side of the HelloWorld program: it sends a message through the core bridge and
//! stores the messages it receives from the HelloWorld contracts registered on other chains.

mod accounts;
mod instructions;

pub use {
    accounts::{
        wormhole_message,
        Config,
        ForeignEmitter,
        Received,
        WormholeAddresses,
        WormholeEmitter,
    },
    instructions::{
        initialize,
        receive_message,
        register_emitter,
        send_message,
    },
};
