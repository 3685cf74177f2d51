use {
    base64::Engine,
    scaffolding_core::{
        Address,
        Chain,
    },
    scaffolding_relayer::{
        GuardianClient,
        VaaSource,
    },
    serde_json::json,
    std::time::Duration,
    wiremock::{
        matchers::{
            method,
            path,
        },
        Mock,
        MockServer,
        ResponseTemplate,
    },
};

const VAA: &[u8] = b"\x01signed vaa bytes";

fn emitter() -> Address {
    Address([0x11; 32])
}

fn vaa_path(sequence: u64) -> String {
    format!("/v1/signed_vaa/1/{}/{sequence}", "11".repeat(32))
}

fn vaa_body() -> serde_json::Value {
    json!({ "vaaBytes": base64::engine::general_purpose::STANDARD.encode(VAA) })
}

fn client(hosts: Vec<String>, max_attempts: usize) -> GuardianClient {
    GuardianClient::new(hosts, Duration::from_millis(10), max_attempts)
}

#[tokio::test]
async fn fetches_and_decodes_vaa() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(vaa_path(7)))
        .respond_with(ResponseTemplate::new(200).set_body_json(vaa_body()))
        .expect(1)
        .mount(&server)
        .await;

    let vaa = client(vec![server.uri()], 3)
        .fetch_vaa(Chain::Solana, emitter(), 7)
        .await
        .unwrap();
    assert_eq!(vaa, VAA);
}

#[tokio::test]
async fn retries_while_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(vaa_path(8)))
        .respond_with(ResponseTemplate::new(404))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(vaa_path(8)))
        .respond_with(ResponseTemplate::new(200).set_body_json(vaa_body()))
        .mount(&server)
        .await;

    let vaa = client(vec![server.uri()], 5)
        .fetch_vaa(Chain::Solana, emitter(), 8)
        .await
        .unwrap();
    assert_eq!(vaa, VAA);
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn falls_over_to_the_next_host() {
    let down = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&down)
        .await;

    let up = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(vaa_path(9)))
        .respond_with(ResponseTemplate::new(200).set_body_json(vaa_body()))
        .mount(&up)
        .await;

    let vaa = client(vec![down.uri(), up.uri()], 2)
        .fetch_vaa(Chain::Solana, emitter(), 9)
        .await
        .unwrap();
    assert_eq!(vaa, VAA);
}

#[tokio::test]
async fn gives_up_after_max_attempts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = client(vec![server.uri()], 3)
        .fetch_vaa(Chain::Solana, emitter(), 10)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("3 attempts"));
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn rejects_invalid_base64() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "vaaBytes": "***" })))
        .mount(&server)
        .await;

    assert!(client(vec![server.uri()], 1)
        .fetch_vaa(Chain::Solana, emitter(), 11)
        .await
        .is_err());
}

#[tokio::test]
async fn requires_hosts() {
    assert!(client(Vec::new(), 3)
        .fetch_vaa(Chain::Solana, emitter(), 0)
        .await
        .is_err());
}
