//! Bounty list, detail and file queries over an in-memory chain

#[cfg(test)]
mod bounty_read_tests {
    use async_trait::async_trait;
    use datapact_client::bounty::{get_bounty, list_bounties, list_bounty_files, BountyError};
    use datapact_client::chain::{
        Balance, ChainClient, ChainError, DynamicFieldInfo, DynamicFieldName, EventCursor, FinalityOptions, ObjectContent,
        ObjectData, ObjectResponse, Page,
    };
    use datapact_client::config::ContractConfig;
    use datapact_client::response::{SuiEvent, TransactionBlockResponse};
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Objects by id, events in pages of two, dynamic fields in pages of one
    #[derive(Default)]
    struct InMemoryChain {
        objects: HashMap<String, Value>,
        events: Vec<SuiEvent>,
        fields: Vec<DynamicFieldInfo>,
        event_queries: Mutex<Vec<(String, Option<EventCursor>)>>,
    }

    impl InMemoryChain {
        fn with_object(mut self, id: &str, fields: Value) -> Self {
            self.objects.insert(id.to_string(), fields);
            self
        }
    }

    #[async_trait]
    impl ChainClient for InMemoryChain {
        async fn execute_transaction_block(
            &self,
            _tx_bytes: &str,
            _signatures: &[String],
            _options: &FinalityOptions,
        ) -> Result<TransactionBlockResponse, ChainError> {
            unreachable!("read-only test chain")
        }

        async fn wait_for_transaction(
            &self,
            _digest: &str,
            _options: &FinalityOptions,
        ) -> Result<TransactionBlockResponse, ChainError> {
            unreachable!("read-only test chain")
        }

        async fn get_balance(&self, _owner: &str, _coin_type: &str) -> Result<Balance, ChainError> {
            unreachable!("read-only test chain")
        }

        async fn get_object(&self, object_id: &str) -> Result<ObjectResponse, ChainError> {
            let Some(fields) = self.objects.get(object_id) else {
                return Ok(ObjectResponse {
                    data: None,
                    error: Some(json!({"code": "notExists", "object_id": object_id})),
                });
            };
            Ok(ObjectResponse {
                data: Some(ObjectData {
                    object_id: object_id.to_string(),
                    version: json!("1"),
                    digest: String::new(),
                    object_type: None,
                    content: Some(ObjectContent {
                        data_type: "moveObject".into(),
                        object_type: None,
                        fields: Some(fields.clone()),
                    }),
                }),
                error: None,
            })
        }

        async fn get_dynamic_fields(
            &self,
            _parent_id: &str,
            cursor: Option<&str>,
            _limit: Option<usize>,
        ) -> Result<Page<DynamicFieldInfo>, ChainError> {
            let start = cursor.map(|c| c.parse::<usize>().unwrap()).unwrap_or(0);
            let has_next_page = start + 1 < self.fields.len();
            Ok(Page {
                data: self.fields.iter().skip(start).take(1).cloned().collect(),
                next_cursor: has_next_page.then(|| (start + 1).to_string()),
                has_next_page,
            })
        }

        async fn query_events(
            &self,
            event_type: &str,
            cursor: Option<&EventCursor>,
            _limit: Option<usize>,
            descending: bool,
        ) -> Result<Page<SuiEvent, EventCursor>, ChainError> {
            assert!(!descending);
            self.event_queries
                .lock()
                .unwrap()
                .push((event_type.to_string(), cursor.cloned()));

            let start = cursor.and_then(|c| c["eventSeq"].as_u64()).unwrap_or(0) as usize;
            let end = (start + 2).min(self.events.len());
            let has_next_page = end < self.events.len();
            Ok(Page {
                data: self.events[start..end].to_vec(),
                next_cursor: has_next_page.then(|| json!({"txDigest": "T", "eventSeq": end})),
                has_next_page,
            })
        }
    }

    fn contract() -> ContractConfig {
        ContractConfig {
            package_id: "0xfeed".into(),
            ..ContractConfig::default()
        }
    }

    fn bounty_event(id: &str, name: &str) -> SuiEvent {
        SuiEvent {
            event_type: "0xfeed::datapact::CreateBountyEvent".into(),
            parsed_json: Some(json!({
                "id": id,
                "name": name,
                "allowed_labels": ["cat", "dog"],
                "total_images": "2"
            })),
            ..SuiEvent::default()
        }
    }

    fn field_info(name: &str, object_id: &str) -> DynamicFieldInfo {
        DynamicFieldInfo {
            name: DynamicFieldName {
                name_type: "0x1::string::String".into(),
                value: json!(name),
            },
            object_id: object_id.into(),
            object_type: "0x1::string::String".into(),
            field_type: Some("DynamicField".into()),
        }
    }

    #[tokio::test]
    async fn test_list_bounties_follows_cursor() {
        let chain = InMemoryChain {
            events: vec![
                bounty_event("0xb1", "Pets"),
                bounty_event("0xb2", "Cars"),
                SuiEvent {
                    event_type: "0xfeed::datapact::CreateBountyEvent".into(),
                    parsed_json: None,
                    ..SuiEvent::default()
                },
                bounty_event("0xb3", "Trees"),
            ],
            ..InMemoryChain::default()
        };

        let bounties = list_bounties(&chain, &contract()).await.unwrap();

        let names: Vec<_> = bounties.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["Pets", "Cars", "Trees"]);
        assert_eq!(bounties[0].total_images, 2);

        let queries = chain.event_queries.lock().unwrap();
        assert_eq!(queries.len(), 2);
        assert_eq!(queries[0].0, "0xfeed::datapact::CreateBountyEvent");
        assert!(queries[0].1.is_none());
        assert_eq!(queries[1].1, Some(json!({"txDigest": "T", "eventSeq": 2})));
    }

    #[tokio::test]
    async fn test_get_bounty_reads_fields() {
        let chain = InMemoryChain::default().with_object(
            "0xb1",
            json!({
                "id": {"id": "0xb1"},
                "name": "Pets",
                "allowed_labels": ["cat", "dog"],
                "walrus_bolb_ids": {"fields": {"id": {"id": "0x7ab"}, "size": "2"}},
                "reward_pool": {"value": "1000000000"},
                "total_images": "2",
                "completed_counts": "0"
            }),
        );

        let bounty = get_bounty(&chain, "0xb1").await.unwrap();
        assert_eq!(bounty.name, "Pets");
        assert_eq!(bounty.blob_table.id, "0x7ab");
        assert_eq!(bounty.reward_pool, 1_000_000_000);

        let missing = get_bounty(&chain, "0xgone").await.unwrap_err();
        assert_eq!(missing, BountyError::ContentNotFound);
        assert_eq!(missing.to_string(), "Bounty content not found");
    }

    #[tokio::test]
    async fn test_list_bounty_files_with_unreadable_entry() {
        let chain = InMemoryChain {
            fields: vec![field_info("a.jpg", "0xf1"), field_info("b.jpg", "0xf2")],
            ..InMemoryChain::default()
        }
        .with_object(
            "0xf1",
            json!({"id": {"id": "0xf1"}, "name": "a.jpg", "value": "B1"}),
        );

        let files = list_bounty_files(&chain, "0x7ab").await.unwrap();

        assert_eq!(files.len(), 2);
        assert_eq!(files[0].file_name, "a.jpg");
        assert_eq!(files[0].blob_id.as_deref(), Some("B1"));
        assert_eq!(files[1].file_name, "b.jpg");
        assert_eq!(files[1].blob_id, None);
        assert_eq!(files[1].field_id, "0xf2");
    }
}
