//! Fetching signed VAAs from the guardian network.

use {
    anyhow::{
        bail,
        Context,
    },
    base64::Engine,
    log::{
        debug,
        warn,
    },
    reqwest::StatusCode,
    scaffolding_core::{
        Address,
        Chain,
    },
    serde::Deserialize,
    std::time::Duration,
};

/// Anything that can hand out the signed VAA for an emitted message.
#[allow(async_fn_in_trait)]
pub trait VaaSource {
    async fn fetch_vaa(
        &self,
        chain: Chain,
        emitter: Address,
        sequence: u64,
    ) -> anyhow::Result<Vec<u8>>;
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignedVaaResponse {
    vaa_bytes: String,
}

/// Client of the guardians' public REST API.
#[derive(Debug, Clone)]
pub struct GuardianClient {
    client:         reqwest::Client,
    hosts:          Vec<String>,
    retry_interval: Duration,
    max_attempts:   usize,
}

impl GuardianClient {
    pub fn new(hosts: Vec<String>, retry_interval: Duration, max_attempts: usize) -> Self {
        GuardianClient {
            client: reqwest::Client::new(),
            hosts,
            retry_interval,
            max_attempts,
        }
    }

    fn url(host: &str, chain: Chain, emitter: &Address, sequence: u64) -> String {
        format!(
            "{}/v1/signed_vaa/{}/{}/{}",
            host.trim_end_matches('/'),
            u16::from(chain),
            emitter,
            sequence
        )
    }

    /// One request to one host. `Ok(None)` means the guardians have not signed the VAA yet.
    async fn try_fetch(&self, url: &str) -> anyhow::Result<Option<Vec<u8>>> {
        let response = self.client.get(url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let body: SignedVaaResponse = response.error_for_status()?.json().await?;
        let vaa = base64::engine::general_purpose::STANDARD
            .decode(body.vaa_bytes)
            .context("vaaBytes is not valid base64")?;
        Ok(Some(vaa))
    }
}

impl VaaSource for GuardianClient {
    /// Polls the hosts in turn until one of them returns the VAA, waiting `retry_interval` between
    /// attempts.
    async fn fetch_vaa(
        &self,
        chain: Chain,
        emitter: Address,
        sequence: u64,
    ) -> anyhow::Result<Vec<u8>> {
        if self.hosts.is_empty() {
            bail!("no guardian hosts configured");
        }

        for attempt in 0..self.max_attempts {
            if attempt > 0 {
                tokio::time::sleep(self.retry_interval).await;
            }

            let host = &self.hosts[attempt % self.hosts.len()];
            let url = Self::url(host, chain, &emitter, sequence);
            match self.try_fetch(&url).await {
                Ok(Some(vaa)) => {
                    debug!("fetched VAA {chain}/{emitter}/{sequence} from {host}");
                    return Ok(vaa);
                }
                Ok(None) => debug!("VAA {chain}/{emitter}/{sequence} not signed yet ({host})"),
                Err(e) => warn!("fetching {url} failed: {e:#}"),
            }
        }

        bail!(
            "VAA {chain}/{emitter}/{sequence} not available after {} attempts",
            self.max_attempts
        )
    }
}
