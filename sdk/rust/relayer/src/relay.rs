use {
    crate::{
        contract::HelloWorldContract,
        guardian::VaaSource,
    },
    anyhow::Context,
    log::info,
};

/// Sends `message` from the HelloWorld contract on `source` to the one on `target`.
///
/// Both contracts are deployed and registered with each other first, so this works against
/// freshly started chains and repeated runs alike. Returns the message as stored by `target`.
pub async fn relay<S, T, V>(
    source: &mut S,
    target: &mut T,
    vaas: &V,
    message: &[u8],
) -> anyhow::Result<Vec<u8>>
where
    S: HelloWorldContract,
    T: HelloWorldContract,
    V: VaaSource,
{
    let (source_chain, target_chain) = (source.chain(), target.chain());

    info!("Deploying HelloWorld on {source_chain}");
    let source_emitter = source
        .deploy()
        .await
        .with_context(|| format!("failed to deploy on {source_chain}"))?;
    info!("Deploying HelloWorld on {target_chain}");
    let target_emitter = target
        .deploy()
        .await
        .with_context(|| format!("failed to deploy on {target_chain}"))?;

    info!("Registering {source_chain} emitter {source_emitter} on {target_chain}");
    target
        .register_emitter(source_chain, source_emitter)
        .await
        .with_context(|| format!("failed to register the {source_chain} emitter"))?;
    info!("Registering {target_chain} emitter {target_emitter} on {source_chain}");
    source
        .register_emitter(target_chain, target_emitter)
        .await
        .with_context(|| format!("failed to register the {target_chain} emitter"))?;

    info!("Sending message: {}", String::from_utf8_lossy(message));
    let sequence = source
        .send(message)
        .await
        .with_context(|| format!("failed to send the message on {source_chain}"))?;

    info!("Fetching VAA for sequence {sequence}");
    let signed_vaa = vaas
        .fetch_vaa(source_chain, source_emitter, sequence)
        .await
        .context("failed to fetch the signed VAA")?;

    info!("Redeeming VAA on {target_chain}");
    let received = target
        .receive(&signed_vaa)
        .await
        .with_context(|| format!("failed to redeem the VAA on {target_chain}"))?;
    info!("Message redeemed: {}", String::from_utf8_lossy(&received));

    Ok(received)
}
