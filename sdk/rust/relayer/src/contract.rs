use scaffolding_core::{
    Address,
    Chain,
};

/// A HelloWorld contract deployed on some chain, as seen by the relayer.
#[allow(async_fn_in_trait)]
pub trait HelloWorldContract {
    /// Chain the contract lives on.
    fn chain(&self) -> Chain;

    /// Makes sure the contract is deployed and initialized. Returns the address it emits Wormhole
    /// messages from.
    async fn deploy(&mut self) -> anyhow::Result<Address>;

    /// Trusts messages from the HelloWorld contract emitting from `address` on `chain`.
    async fn register_emitter(&mut self, chain: Chain, address: Address) -> anyhow::Result<()>;

    /// Sends `message` through Wormhole. Returns the sequence of the emitted message.
    async fn send(&mut self, message: &[u8]) -> anyhow::Result<u64>;

    /// Redeems a signed VAA. Returns the message the contract stored for it.
    async fn receive(&mut self, signed_vaa: &[u8]) -> anyhow::Result<Vec<u8>>;
}
