//! Behavioral tests for the compiler.
//!
//! These tests drive the public API the way the connector editor does,
//! without a live completion capability or network.

mod compile_tests {
    use cds_compiler::abi::{parse_abi, AbiEntryKind};
    use cds_compiler::cds::{FieldType, OperationType};
    use cds_compiler::compiler::{compile, ConnectorMeta, ADDRESS_PLACEHOLDER};
    use cds_compiler::CdsError;
    use serde_json::{json, Value};

    fn erc20() -> Value {
        json!([
            {"type": "constructor", "inputs": [{"name": "supply", "type": "uint256"}]},
            {
                "anonymous": false,
                "type": "event",
                "name": "Transfer",
                "inputs": [
                    {"indexed": true, "name": "from", "type": "address"},
                    {"indexed": true, "name": "to", "type": "address"},
                    {"indexed": false, "name": "value", "type": "uint256"}
                ]
            },
            {
                "type": "function",
                "name": "balanceOf",
                "constant": true,
                "stateMutability": "view",
                "inputs": [{"name": "who", "type": "address"}],
                "outputs": [{"name": "", "type": "uint256"}]
            },
            {
                "type": "function",
                "name": "withdraw",
                "constant": false,
                "payable": true,
                "inputs": [{"name": "amount", "type": "uint256"}],
                "outputs": [{"name": "", "type": "bool"}]
            },
            {
                "type": "function",
                "name": "batchSend",
                "inputs": [
                    {"name": "", "type": "address[]"},
                    {"name": "", "type": "uint8[]"}
                ],
                "outputs": []
            },
            {"type": "fallback"}
        ])
    }

    #[test]
    fn test_compile_is_byte_for_byte_deterministic() {
        let meta = ConnectorMeta::named("ERC20 Token").with_description("Fungible token");
        let first = serde_json::to_vec(&compile(&erc20(), &meta).unwrap()).unwrap();
        let second = serde_json::to_vec(&compile(&erc20(), &meta).unwrap()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_input_fields_round_trip_abi_inputs() {
        let raw = erc20();
        let entries = parse_abi(&raw).unwrap();
        let doc = compile(&raw, &ConnectorMeta::named("t")).unwrap();

        let compiled = doc.triggers.iter().chain(doc.actions.iter());
        let sources = entries
            .iter()
            .filter(|e| matches!(e.kind, AbiEntryKind::Event | AbiEntryKind::Function));
        for (operation, entry) in compiled.zip(sources) {
            assert_eq!(operation.operation.input_fields.len(), entry.inputs.len());
            for (index, (field, input)) in operation
                .operation
                .input_fields
                .iter()
                .zip(&entry.inputs)
                .enumerate()
            {
                assert_eq!(field.key, input.name_or_default(index));
            }
        }
    }

    #[test]
    fn test_document_json_shape() {
        let doc = compile(&erc20(), &ConnectorMeta::named("ERC20 Token")).unwrap();
        let value = serde_json::to_value(&doc).unwrap();

        assert_eq!(value["key"], "erc20-token");
        assert_eq!(value["version"], "1.0.0");
        assert_eq!(value["platformVersion"], "1.0.0");
        assert_eq!(value["type"], "web3");
        assert!(value.get("icon").is_none());
        assert_eq!(value["triggers"].as_array().unwrap().len(), 1);
        assert_eq!(value["actions"].as_array().unwrap().len(), 3);

        let trigger = &value["triggers"][0];
        assert_eq!(trigger["key"], "TransferTrigger");
        assert_eq!(trigger["operation"]["type"], "blockchain:event");
        assert_eq!(trigger["operation"]["sample"], json!({}));
        assert_eq!(
            trigger["operation"]["inputFields"][0],
            json!({
                "key": "from",
                "label": "From",
                "type": "address",
                "placeholder": ADDRESS_PLACEHOLDER,
                "list": false
            })
        );
    }

    #[test]
    fn test_view_function_output_field() {
        let doc = compile(&erc20(), &ConnectorMeta::named("t")).unwrap();
        let balance_of = &doc.actions[0];

        assert_eq!(balance_of.display.label, "Balance of (View function)");
        assert_eq!(balance_of.operation.ty, OperationType::Call);
        assert_eq!(
            serde_json::to_value(&balance_of.operation.output_fields).unwrap(),
            json!([{"key": "returnValue", "label": "Return value of Balance of", "type": "string"}])
        );
        assert_eq!(
            balance_of.operation.signature,
            "function balanceOf(address who) view returns (uint256)"
        );
    }

    #[test]
    fn test_payable_signature() {
        let doc = compile(&erc20(), &ConnectorMeta::named("t")).unwrap();
        assert_eq!(
            doc.actions[1].operation.signature,
            "function withdraw(uint256 amount) payable returns (bool)"
        );
        assert!(doc.actions[1].operation.output_fields.is_empty());
    }

    #[test]
    fn test_unnamed_list_inputs() {
        let doc = compile(&erc20(), &ConnectorMeta::named("t")).unwrap();
        let batch_send = &doc.actions[2];
        let fields = &batch_send.operation.input_fields;

        assert_eq!(fields[0].key, "param0");
        assert_eq!(fields[0].label, "Param 0");
        assert_eq!(fields[0].ty, FieldType::Address);
        assert_eq!(fields[0].list, Some(true));
        assert_eq!(fields[1].key, "param1");
        assert_eq!(fields[1].ty, FieldType::Number);
        assert_eq!(fields[1].placeholder.as_deref(), Some(""));
        assert!(fields.iter().all(|f| f.required == Some(true)));
        assert_eq!(
            batch_send.operation.signature,
            "function batchSend(address[] param0, uint8[] param1)"
        );
    }

    #[test]
    fn test_abi_given_as_string() {
        let as_string = Value::String(erc20().to_string());
        let meta = ConnectorMeta::named("t");
        assert_eq!(
            compile(&as_string, &meta).unwrap(),
            compile(&erc20(), &meta).unwrap()
        );
    }

    #[test]
    fn test_malformed_abi() {
        let err = compile(&json!("{not-json"), &ConnectorMeta::named("t")).unwrap_err();
        assert!(matches!(err, CdsError::InvalidAbi(_)));

        let err = compile(&json!({"abi": []}), &ConnectorMeta::named("t")).unwrap_err();
        assert!(matches!(err, CdsError::InvalidAbi(_)));
    }

    #[test]
    fn test_ignored_entries_never_fail_compilation() {
        let abi = json!([
            {"type": "constructor", "inputs": [{"name": "x"}]},
            null,
            {"type": "function", "name": "pause"},
            {
                "type": "event",
                "name": "Paused",
                "inputs": [{"indexed": null, "name": "account", "type": "address"}]
            }
        ]);
        let doc = compile(&abi, &ConnectorMeta::named("t")).unwrap();

        assert_eq!(doc.actions.len(), 1);
        assert_eq!(doc.actions[0].key, "pauseAction");
        assert_eq!(doc.triggers.len(), 1);
        assert_eq!(
            doc.triggers[0].operation.signature,
            "event Paused(address account)"
        );
    }

    #[test]
    fn test_address_list_input_has_no_placeholder() {
        let doc = compile(&erc20(), &ConnectorMeta::named("t")).unwrap();
        let recipients = &doc.actions[2].operation.input_fields[0];
        assert_eq!(recipients.ty, FieldType::Address);
        assert_eq!(recipients.placeholder.as_deref(), Some(""));
    }
}

mod humanize_tests {
    use cds_compiler::compiler::{humanize, slugify};

    #[test]
    fn test_labels() {
        let cases = [
            ("transferFrom", "Transfer from"),
            ("getABI2Count", "Get ABI2 count"),
            ("R2D2", "R2D2"),
            ("ABCs", "ABCs"),
            ("balanceOf", "Balance of"),
            ("totalSupply", "Total supply"),
            ("tokenURI", "Token URI"),
            ("_owner", "Owner"),
            ("DOMAIN_SEPARATOR", "DOMAIN SEPARATOR"),
            ("param0", "Param 0"),
        ];
        for (identifier, label) in cases {
            assert_eq!(humanize(identifier), label, "{identifier}");
        }
    }

    #[test]
    fn test_slugs() {
        assert_eq!(slugify("My Token"), "my-token");
        assert_eq!(slugify("  Uniswap V3: Router!  "), "uniswap-v3-router");
    }
}

mod service_tests {
    use async_trait::async_trait;
    use cds_compiler::enrich::{ResponseSchema, StructuredCompletion};
    use cds_compiler::external::{IconResolver, InMemoryKeyRegistry, InlineOnlyIconResolver};
    use cds_compiler::{CdsError, ConnectorService, ConvertRequest};
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};
    use url::Url;

    /// Answers every batch with a description per operation and records
    /// the prompts it received.
    #[derive(Default)]
    struct EchoCompletion {
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl StructuredCompletion for EchoCompletion {
        async fn complete_structured(
            &self,
            prompt: &str,
            schema: &ResponseSchema,
        ) -> anyhow::Result<Value> {
            let mut prompts = self.prompts.lock().unwrap();
            prompts.push(prompt.to_string());
            let call = prompts.len();
            if schema.name == "describe_connector" {
                return Ok(json!({"description": "Generated connector description"}));
            }
            // The prompt states how many results are expected.
            let count = prompt
                .split("Return exactly ")
                .nth(1)
                .and_then(|rest| rest.split(' ').next())
                .and_then(|n| n.parse::<usize>().ok())
                .unwrap_or(0);
            let result: Vec<Value> = (0..count)
                .map(|i| json!({"description": format!("call {call} item {i}"), "helperTextInputs": ["first input"]}))
                .collect();
            Ok(json!({ "result": result }))
        }
    }

    struct FailingCompletion;

    #[async_trait]
    impl StructuredCompletion for FailingCompletion {
        async fn complete_structured(
            &self,
            _prompt: &str,
            _schema: &ResponseSchema,
        ) -> anyhow::Result<Value> {
            anyhow::bail!("upstream timeout")
        }
    }

    struct PngResolver;

    #[async_trait]
    impl IconResolver for PngResolver {
        async fn to_data_uri(&self, url: &Url) -> anyhow::Result<String> {
            Ok(format!("data:image/png;base64,{}", url.path().len()))
        }
    }

    fn abi() -> Value {
        let mut entries = vec![json!({
            "type": "event",
            "name": "Transfer",
            "inputs": [{"indexed": true, "name": "from", "type": "address"}]
        })];
        for i in 0..5 {
            entries.push(json!({
                "type": "function",
                "name": format!("action{i}"),
                "inputs": [{"name": "to", "type": "address"}],
                "outputs": []
            }));
        }
        Value::Array(entries)
    }

    fn service() -> ConnectorService {
        ConnectorService::new(
            Arc::new(InMemoryKeyRegistry::with_keys(["existing-connector"])),
            Arc::new(InlineOnlyIconResolver),
        )
    }

    #[tokio::test]
    async fn test_enhanced_conversion_in_batches() {
        let completion = Arc::new(EchoCompletion::default());
        let service = service().with_completion(completion.clone());

        let doc = service
            .convert(
                ConvertRequest::new(abi())
                    .with_name("Batch Demo")
                    .enhanced(Some(2)),
            )
            .await
            .unwrap();

        // 1 trigger batch, 3 action batches of 2/2/1, 1 description call.
        assert_eq!(completion.prompts.lock().unwrap().len(), 5);
        assert_eq!(doc.triggers[0].display.description, "call 1 item 0");
        assert_eq!(doc.actions[0].display.description, "call 2 item 0");
        assert_eq!(doc.actions[1].display.description, "call 2 item 1");
        assert_eq!(doc.actions[2].display.description, "call 3 item 0");
        assert_eq!(doc.actions[4].display.description, "call 4 item 0");
        assert_eq!(
            doc.actions[4].operation.input_fields[0].help_text.as_deref(),
            Some("first input")
        );
        assert_eq!(doc.description, "Generated connector description");
        // Labels are never rewritten.
        assert_eq!(doc.actions[4].display.label, "Action 4");
    }

    #[tokio::test]
    async fn test_plain_conversion_skips_completion() {
        let completion = Arc::new(EchoCompletion::default());
        let service = service().with_completion(completion.clone());

        let doc = service
            .convert(ConvertRequest::new(abi()).with_name("Plain").with_description("Mine"))
            .await
            .unwrap();
        assert!(completion.prompts.lock().unwrap().is_empty());
        assert_eq!(doc.description, "Mine");
        assert_eq!(doc.actions[0].display.description, "Action 0");
    }

    #[tokio::test]
    async fn test_failed_enrichment_returns_no_document() {
        let service = service().with_completion(Arc::new(FailingCompletion));
        let err = service
            .convert(ConvertRequest::new(abi()).with_name("Fails").enhanced(None))
            .await
            .unwrap_err();
        assert!(matches!(err, CdsError::Enrichment(_)));
        assert!(err.to_string().contains("upstream timeout"));
    }

    #[tokio::test]
    async fn test_duplicate_key_rejected_before_compilation() {
        let err = service()
            .convert(ConvertRequest::new(abi()).with_name("Existing Connector"))
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Connector name already used: existing-connector"
        );
    }

    #[tokio::test]
    async fn test_icon_handling() {
        let resolving = ConnectorService::new(
            Arc::new(InMemoryKeyRegistry::new()),
            Arc::new(PngResolver),
        );
        let doc = resolving
            .convert(
                ConvertRequest::new(abi())
                    .with_name("Icons")
                    .with_icon("https://example.com/logo.png"),
            )
            .await
            .unwrap();
        assert_eq!(doc.icon.as_deref(), Some("data:image/png;base64,9"));

        let err = service()
            .convert(
                ConvertRequest::new(abi())
                    .with_name("Icons")
                    .with_icon("https://example.com/logo.png"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CdsError::IconResolution(_)));
    }

    #[tokio::test]
    async fn test_request_from_editor_json() {
        let request: ConvertRequest = serde_json::from_value(json!({
            "abi": abi().to_string(),
            "name": "From Json",
            "icon": "data:image/svg+xml;base64,PHN2Zz4=",
            "enhancedByOpenAI": false
        }))
        .unwrap();
        let doc = service().convert(request).await.unwrap();
        assert_eq!(doc.key, "from-json");
        assert_eq!(doc.icon.as_deref(), Some("data:image/svg+xml;base64,PHN2Zz4="));
    }

    #[tokio::test]
    async fn test_clone_of_converted_connector() {
        let service = service();
        let doc = service
            .convert(ConvertRequest::new(abi()).with_name("Original"))
            .await
            .unwrap();
        let clone = service.clone_connector(&doc).unwrap();
        let again = service.clone_connector(&clone).unwrap();

        assert!(clone.key.starts_with("original_clone_"));
        assert_eq!(again.key.matches("_clone_").count(), 1);
        assert_eq!(again.name, "Original clone clone");
        assert_eq!(clone.actions, doc.actions);
    }
}

mod explorer_tests {
    use cds_compiler::api::AbiExplorerClient;
    use cds_compiler::config::{ChainExplorer, ExplorerConfig};
    use cds_compiler::external::{InMemoryKeyRegistry, InlineOnlyIconResolver};
    use cds_compiler::{ConnectorService, ConvertRequest};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use wiremock::{
        matchers::{method, path, query_param},
        Mock, MockServer, ResponseTemplate,
    };

    #[tokio::test]
    async fn test_fetch_then_convert() {
        let server = MockServer::start().await;
        let abi = json!([
            {"type": "event", "name": "Approval", "inputs": [
                {"indexed": true, "name": "owner", "type": "address"},
                {"indexed": true, "name": "spender", "type": "address"},
                {"indexed": false, "name": "value", "type": "uint256"}
            ]},
            {"type": "function", "name": "decimals", "constant": true, "inputs": [],
             "outputs": [{"name": "", "type": "uint8"}]}
        ]);

        Mock::given(method("GET"))
            .and(path("/api"))
            .and(query_param("action", "getabi"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "1",
                "message": "OK",
                "result": abi.to_string()
            })))
            .expect(1)
            .mount(&server)
            .await;

        let config = ExplorerConfig::new()
            .with_chain(
                "eip155:1",
                ChainExplorer::etherscan(&format!("{}/api", server.uri()), Some("KEY".into()))
                    .unwrap(),
            )
            .without_retry();
        let client = AbiExplorerClient::new(config).unwrap();
        let fetched = client
            .fetch_abi("eip155:1", "0x6B175474E89094C44Da98b954EedeAC495271d0F")
            .await
            .unwrap();

        let service = ConnectorService::new(
            Arc::new(InMemoryKeyRegistry::new()),
            Arc::new(InlineOnlyIconResolver),
        );
        let doc = service
            .convert(ConvertRequest::new(Value::String(fetched)).with_name("Dai"))
            .await
            .unwrap();

        assert_eq!(doc.triggers[0].key, "ApprovalTrigger");
        assert_eq!(
            doc.triggers[0].operation.signature,
            "event Approval(address indexed owner, address indexed spender, uint256 value)"
        );
        assert_eq!(doc.actions[0].display.label, "Decimals (View function)");
        assert_eq!(
            doc.actions[0].operation.output_fields[0].label,
            "Return value of Decimals"
        );
    }
}
