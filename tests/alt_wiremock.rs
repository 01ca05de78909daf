use std::sync::Arc;

use chrono::{TimeZone, Utc};
use cardfolio::clock::FixedClock;
use cardfolio::market_data::providers::AltValuationSource;
use cardfolio::market_data::ValuationSource;
use cardfolio::models::GradedAsset;
use secrecy::SecretString;
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn source_for(server: &MockServer) -> AltValuationSource {
    AltValuationSource::new()
        .with_endpoint(format!("{}/graphql/", server.uri()))
        .with_credentials(
            SecretString::from("test-token".to_string()),
            SecretString::from("session=abc".to_string()),
        )
        .with_clock(Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2024, 6, 20, 12, 0, 0).unwrap(),
        )))
}

async fn mount_operation(server: &MockServer, operation: &str, body: Value) {
    Mock::given(method("POST"))
        .and(path("/graphql/"))
        .and(body_partial_json(json!({ "operationName": operation })))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

fn cert_response(asset_id: &str) -> Value {
    json!({
        "data": {
            "cert": {
                "asset": { "id": asset_id, "name": "Charizard", "__typename": "Asset" },
                "__typename": "Cert"
            }
        }
    })
}

fn details_response(grade: &str, supply: i64) -> Value {
    json!({
        "data": {
            "asset": {
                "altValueInfo": {
                    "currentAltValue": 1250.0,
                    "confidenceData": {
                        "currentConfidenceMetric": 0.82,
                        "currentErrorLowerBound": 1100.0,
                        "currentErrorUpperBound": 1400.0
                    }
                },
                "cardPops": [
                    { "gradingCompany": "BGS", "gradeNumber": grade, "count": 3 },
                    { "gradingCompany": "PSA", "gradeNumber": grade, "count": supply }
                ]
            }
        }
    })
}

fn transactions_response(sales: Value) -> Value {
    json!({ "data": { "asset": { "marketTransactions": sales } } })
}

#[tokio::test]
async fn resolves_scarce_card_from_recent_sales() -> anyhow::Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/graphql/"))
        .and(header("authorization", "Bearer test-token"))
        .and(header("cookie", "session=abc"))
        .and(body_partial_json(json!({
            "operationName": "Cert",
            "variables": { "certNumber": "55501234" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(cert_response("asset-77")))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/graphql/"))
        .and(body_partial_json(json!({
            "operationName": "AssetDetails",
            "variables": {
                "id": "asset-77",
                "tsFilter": { "gradeNumber": "10.0", "gradingCompany": "PSA" }
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(details_response("10.0", 250)))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/graphql/"))
        .and(body_partial_json(json!({
            "operationName": "AssetMarketTransactions",
            "variables": {
                "id": "asset-77",
                "marketTransactionFilter": {
                    "gradingCompany": "PSA",
                    "gradeNumber": "10.0",
                    "showSkipped": true
                }
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(transactions_response(json!([
            { "date": "2024-06-19T10:00:00Z", "price": "1200" },
            { "date": "2024-06-11T10:00:00Z", "price": 1300 },
            { "date": "2024-05-02T10:00:00Z", "price": 1250.0 },
            { "date": "2024-04-01T10:00:00Z", "price": 1210 },
            { "date": "2024-03-01T10:00:00Z", "price": 5000 }
        ]))))
        .expect(1)
        .mount(&server)
        .await;

    let valuation = source_for(&server)
        .resolve(&GradedAsset::new("55501234", "10", "PSA"))
        .await
        .expect("expected a valuation");

    assert_eq!(valuation.asset_id, "asset-77");
    assert_eq!(valuation.value, 1250.0);
    assert_eq!(valuation.supply, 250);
    assert_eq!(valuation.average_price, 1240.0);
    assert_eq!(valuation.confidence_range(None), "1100 - 1400");
    assert_eq!(valuation.confidence, 0.82);

    Ok(())
}

#[tokio::test]
async fn liquid_card_averages_daily_means_inside_window() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    mount_operation(&server, "Cert", cert_response("asset-9")).await;
    mount_operation(&server, "AssetDetails", details_response("9.0", 4000)).await;
    mount_operation(
        &server,
        "AssetMarketTransactions",
        transactions_response(json!([
            { "date": "2024-06-18T09:00:00Z", "price": 10 },
            { "date": "2024-06-18T17:00:00Z", "price": 12 },
            { "date": "2024-06-10T12:00:00Z", "price": 20 },
            { "date": "2024-05-01T12:00:00Z", "price": 999 }
        ])),
    )
    .await;

    let valuation = source_for(&server)
        .resolve(&GradedAsset::new("1", "9", "PSA"))
        .await
        .expect("expected a valuation");

    assert_eq!(valuation.supply, 4000);
    assert_eq!(valuation.average_price, 15.5);
    Ok(())
}

#[tokio::test]
async fn unknown_certificate_stops_before_detail_calls() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    mount_operation(&server, "Cert", json!({ "data": { "cert": null } })).await;

    Mock::given(method("POST"))
        .and(path("/graphql/"))
        .and(body_partial_json(json!({ "operationName": "AssetDetails" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(details_response("10.0", 1)))
        .expect(0)
        .mount(&server)
        .await;

    let result = source_for(&server)
        .resolve(&GradedAsset::new("404", "10", "PSA"))
        .await;
    assert!(result.is_none());
    Ok(())
}

#[tokio::test]
async fn upstream_error_resolves_to_nothing() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql/"))
        .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
        .mount(&server)
        .await;

    let result = source_for(&server)
        .resolve(&GradedAsset::new("55501234", "10", "PSA"))
        .await;
    assert!(result.is_none());
    Ok(())
}

#[tokio::test]
async fn failing_detail_call_resolves_to_nothing() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    mount_operation(&server, "Cert", cert_response("asset-77")).await;
    mount_operation(
        &server,
        "AssetMarketTransactions",
        transactions_response(json!([])),
    )
    .await;
    Mock::given(method("POST"))
        .and(path("/graphql/"))
        .and(body_partial_json(json!({ "operationName": "AssetDetails" })))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let result = source_for(&server)
        .resolve(&GradedAsset::new("55501234", "10", "PSA"))
        .await;
    assert!(result.is_none());
    Ok(())
}

#[tokio::test]
async fn failing_transactions_call_resolves_to_nothing() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    mount_operation(&server, "Cert", cert_response("asset-77")).await;
    mount_operation(&server, "AssetDetails", details_response("10.0", 250)).await;
    Mock::given(method("POST"))
        .and(path("/graphql/"))
        .and(body_partial_json(json!({ "operationName": "AssetMarketTransactions" })))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let result = source_for(&server)
        .resolve(&GradedAsset::new("55501234", "10", "PSA"))
        .await;
    assert!(result.is_none());
    Ok(())
}

#[tokio::test]
async fn non_numeric_grade_makes_no_requests() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    let result = source_for(&server)
        .resolve(&GradedAsset::new("55501234", "AUTHENTIC", "PSA"))
        .await;
    assert!(result.is_none());

    let requests = server.received_requests().await.unwrap_or_default();
    assert!(requests.is_empty(), "expected no HTTP requests");
    Ok(())
}

#[tokio::test]
async fn missing_values_default_to_zero() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    mount_operation(&server, "Cert", cert_response("asset-1")).await;
    mount_operation(
        &server,
        "AssetDetails",
        json!({ "data": { "asset": { "altValueInfo": null, "cardPops": null } } }),
    )
    .await;
    mount_operation(
        &server,
        "AssetMarketTransactions",
        json!({ "data": { "asset": { "marketTransactions": null } } }),
    )
    .await;

    let valuation = source_for(&server)
        .resolve(&GradedAsset::new("1", "8.5", "BGS"))
        .await
        .expect("expected a valuation");

    assert_eq!(valuation.value, 0.0);
    assert_eq!(valuation.supply, 0);
    assert_eq!(valuation.average_price, 0.0);
    assert_eq!(valuation.confidence_range(None), "0 - 0");
    Ok(())
}
