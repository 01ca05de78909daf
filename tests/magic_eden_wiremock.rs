use anyhow::Result;
use cardfolio::market_data::providers::MagicEdenInventory;
use cardfolio::market_data::{InventorySource, PageRequest};
use cardfolio::models::TraitFilter;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn pokemon_slabs() -> TraitFilter {
    TraitFilter::new()
        .one_of("Category", ["Pokemon"])
        .one_of("Grading Company", ["PSA", "Beckett", "BGS"])
}

#[tokio::test]
async fn fetch_page_sends_collection_paging_and_attributes() -> Result<()> {
    let server = MockServer::start().await;
    let inventory = MagicEdenInventory::new("collector_crypt")
        .with_base_url(server.uri())
        .with_filter(pokemon_slabs());

    let attributes = r#"[[{"traitType":"Category","value":"Pokemon"}],[{"traitType":"Grading Company","value":"PSA"},{"traitType":"Grading Company","value":"Beckett"},{"traitType":"Grading Company","value":"BGS"}]]"#;

    let body = r#"[
        {
            "mintAddress": "MintA",
            "name": "Charizard Base Set",
            "image": "https://img/charizard.png",
            "attributes": [
                {"trait_type": "Category", "value": "Pokemon"},
                {"trait_type": "Grading Company", "value": "PSA"},
                {"trait_type": "The Grade", "value": "GEM MT 10"},
                {"trait_type": "GradeNum", "value": 10},
                {"trait_type": "Grading ID", "value": "55501234"}
            ]
        },
        {
            "name": "Token without a mint"
        },
        {
            "mintAddress": "MintB",
            "name": "Blastoise",
            "attributes": []
        }
    ]"#;

    Mock::given(method("GET"))
        .and(path("/wallets/Wallet1/tokens"))
        .and(query_param("collection_symbol", "collector_crypt"))
        .and(query_param("limit", "5"))
        .and(query_param("offset", "10"))
        .and(query_param("attributes", attributes))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/json"))
        .expect(1)
        .mount(&server)
        .await;

    let tokens = inventory
        .fetch_page("Wallet1", PageRequest::new(10, 5))
        .await?;

    assert_eq!(tokens.len(), 3);
    assert_eq!(tokens[0].mint.as_deref(), Some("MintA"));
    assert_eq!(tokens[0].grading.grade.as_deref(), Some("GEM MT 10"));
    assert_eq!(tokens[0].grading.grade_number.as_deref(), Some("10"));
    assert_eq!(tokens[0].grading.cert_id.as_deref(), Some("55501234"));
    assert!(tokens[0].grading.graded_asset().is_some());
    assert_eq!(tokens[1].mint, None);
    assert_eq!(tokens[1].name.as_deref(), Some("Token without a mint"));
    assert_eq!(tokens[2].mint.as_deref(), Some("MintB"));
    assert!(tokens[2].grading.graded_asset().is_none());

    Ok(())
}

#[tokio::test]
async fn empty_filter_omits_attributes_param() -> Result<()> {
    let server = MockServer::start().await;
    let inventory = MagicEdenInventory::new("collector_crypt").with_base_url(server.uri());

    Mock::given(method("GET"))
        .and(path("/wallets/Wallet1/tokens"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("[]", "application/json"))
        .mount(&server)
        .await;

    let tokens = inventory.fetch_page("Wallet1", PageRequest::default()).await?;
    assert!(tokens.is_empty());

    let requests = server.received_requests().await.unwrap_or_default();
    assert_eq!(requests.len(), 1);
    let query = requests[0].url.query().unwrap_or_default();
    assert!(query.contains("limit=20"));
    assert!(!query.contains("attributes"));
    Ok(())
}

#[tokio::test]
async fn http_error_is_reported() -> Result<()> {
    let server = MockServer::start().await;
    let inventory = MagicEdenInventory::new("collector_crypt").with_base_url(server.uri());

    Mock::given(method("GET"))
        .and(path("/wallets/Wallet1/tokens"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
        .mount(&server)
        .await;

    let err = inventory
        .fetch_page("Wallet1", PageRequest::default())
        .await
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("429"), "{message}");
    assert!(message.contains("rate limited"), "{message}");
    Ok(())
}
