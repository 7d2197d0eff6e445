//! Integration test for the JSON-RPC client against a mock fullnode

#[cfg(test)]
mod sui_rpc_tests {
    use datapact_client::chain::sui_rpc::SuiRpcSettings;
    use datapact_client::chain::{ChainClient, ChainError, FinalityOptions, SuiRpcClient};
    use mockito::{Matcher, Server};
    use serde_json::json;
    use std::time::Duration;

    fn client(url: String) -> SuiRpcClient {
        SuiRpcClient::new(SuiRpcSettings {
            url,
            request_timeout: Duration::from_secs(5),
            rate_limit_rps: 0,
            poll_interval: Duration::from_millis(10),
            wait_timeout: Duration::from_millis(500),
        })
        .unwrap()
    }

    fn rpc_result(result: serde_json::Value) -> String {
        json!({"jsonrpc": "2.0", "id": 1, "result": result}).to_string()
    }

    fn rpc_error(code: i64, message: &str) -> String {
        json!({"jsonrpc": "2.0", "id": 1, "error": {"code": code, "message": message}}).to_string()
    }

    #[tokio::test]
    async fn test_get_object_decodes_move_fields() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({
                "method": "sui_getObject",
                "params": ["0xb1", {"showContent": true, "showType": true}]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(rpc_result(json!({
                "data": {
                    "objectId": "0xb1",
                    "version": "12",
                    "digest": "abc",
                    "type": "0xfeed::datapact::DatasetBounty",
                    "content": {
                        "dataType": "moveObject",
                        "type": "0xfeed::datapact::DatasetBounty",
                        "fields": {"id": {"id": "0xb1"}, "name": "Pets"}
                    }
                }
            })))
            .create_async()
            .await;

        let response = client(server.url()).get_object("0xb1").await.unwrap();
        let data = response.data.unwrap();
        assert_eq!(data.object_id, "0xb1");
        let fields = data.content.as_ref().unwrap().move_fields().unwrap();
        assert_eq!(fields["name"], "Pets");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_http_statuses_map_to_chain_errors() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({"method": "sui_getObject"})))
            .with_status(429)
            .create_async()
            .await;
        server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({"method": "suix_getDynamicFields"})))
            .with_status(503)
            .create_async()
            .await;

        let client = client(server.url());

        let limited = client.get_object("0xb1").await.unwrap_err();
        assert_eq!(limited, ChainError::RateLimited);
        assert!(limited.is_retryable());

        let unavailable = client.get_dynamic_fields("0x7ab", None, None).await.unwrap_err();
        assert_eq!(unavailable, ChainError::Unavailable { status: 503 });
        assert!(unavailable.is_retryable());
    }

    #[tokio::test]
    async fn test_rpc_error_object() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(rpc_error(-32602, "Invalid params"))
            .create_async()
            .await;

        let err = client(server.url()).get_object("nope").await.unwrap_err();
        assert_eq!(
            err,
            ChainError::Rpc {
                code: -32602,
                message: "Invalid params".into()
            }
        );
        assert!(!err.is_retryable());
        assert_eq!(err.category(), "rpc");
    }

    #[tokio::test]
    async fn test_wait_for_transaction_polls_until_indexed() {
        let mut server = Server::new_async().await;
        let pending = server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({"method": "sui_getTransactionBlock", "id": 1})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(rpc_error(
                -32602,
                "Could not find the referenced transaction [TransactionDigest(D1)].",
            ))
            .create_async()
            .await;
        let indexed = server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({
                "method": "sui_getTransactionBlock",
                "id": 2,
                "params": ["D1", {"showEffects": true, "showEvents": true, "showObjectChanges": true}]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(rpc_result(json!({
                "digest": "D1",
                "effects": {
                    "status": {"status": "success"},
                    "created": [{"owner": "Shared", "reference": {"objectId": "0xnew", "version": 1, "digest": "x"}}]
                },
                "events": []
            })))
            .create_async()
            .await;

        let response = client(server.url())
            .wait_for_transaction("D1", &FinalityOptions::default())
            .await
            .unwrap();

        assert_eq!(response.digest, "D1");
        assert_eq!(response.effects.unwrap().created[0].reference.object_id, "0xnew");
        pending.assert_async().await;
        indexed.assert_async().await;
    }

    #[tokio::test]
    async fn test_wait_for_transaction_gives_up_after_budget() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(rpc_error(-32602, "Could not find the referenced transaction"))
            .expect_at_least(2)
            .create_async()
            .await;

        let err = client(server.url())
            .wait_for_transaction("D9", &FinalityOptions::default())
            .await
            .unwrap_err();

        match err {
            ChainError::FinalityTimeout { digest, .. } => assert_eq!(digest, "D9"),
            other => panic!("expected finality timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_query_events_pages() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({
                "method": "suix_queryEvents",
                "params": [{"MoveEventType": "0xfeed::datapact::CreateBountyEvent"}, null, 50, false]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(rpc_result(json!({
                "data": [{
                    "id": {"txDigest": "T1", "eventSeq": "0"},
                    "packageId": "0xfeed",
                    "transactionModule": "datapact",
                    "sender": "0xa11ce",
                    "type": "0xfeed::datapact::CreateBountyEvent",
                    "parsedJson": {"id": "0xb1", "name": "Pets"}
                }],
                "nextCursor": {"txDigest": "T1", "eventSeq": "0"},
                "hasNextPage": true
            })))
            .create_async()
            .await;

        let page = client(server.url())
            .query_events("0xfeed::datapact::CreateBountyEvent", None, Some(50), false)
            .await
            .unwrap();

        assert_eq!(page.data.len(), 1);
        assert_eq!(page.data[0].sender.as_deref(), Some("0xa11ce"));
        assert!(page.has_next_page);
        assert_eq!(page.next_cursor, Some(json!({"txDigest": "T1", "eventSeq": "0"})));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_balance() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({
                "method": "suix_getBalance",
                "params": ["0xa11ce", "0x2::sui::SUI"]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(rpc_result(json!({
                "coinType": "0x2::sui::SUI",
                "coinObjectCount": 2,
                "totalBalance": "1500000000",
                "lockedBalance": {}
            })))
            .create_async()
            .await;

        let balance = client(server.url())
            .get_balance("0xa11ce", "0x2::sui::SUI")
            .await
            .unwrap();

        assert_eq!(balance.coin_object_count, 2);
        assert_eq!(balance.total(), Ok(1_500_000_000));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_error() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/")
            .with_status(200)
            .with_body("<html>oops</html>")
            .create_async()
            .await;

        let err = client(server.url()).get_object("0xb1").await.unwrap_err();
        assert!(matches!(err, ChainError::Decode(_)), "{:?}", err);
    }
}
