use layer_ledger_registry::{
    Layer, LayerContract, LayerRegistry, MemoryStateStore, Page, RegistryError,
    TransactionFailure,
};

fn contract() -> LayerContract<MemoryStateStore> {
    LayerContract::new(LayerRegistry::new(MemoryStateStore::new()))
}

fn call(contract: &LayerContract<MemoryStateStore>, function: &str, args: &[&str]) -> Result<String, RegistryError> {
    let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
    contract.invoke(function, &args)
}

#[test]
fn test_layer_lifecycle_through_string_calls() {
    let contract = contract();

    let created = call(
        &contract,
        "addLayer",
        &["L1", "", r#"{"id":"L1","parentId":null}"#],
    )
    .unwrap();
    let created: Layer = serde_json::from_str(&created).unwrap();
    assert!(created.is_root());

    call(&contract, "addLayer", &["L2", "L1", r#"{"id":"L2","parentId":"L1"}"#]).unwrap();
    let updated = call(&contract, "addVulnerabilityToLayer", &["L1", "CVE-2023-44487"]).unwrap();
    let updated: Layer = serde_json::from_str(&updated).unwrap();
    assert_eq!(updated.vulnerability_ids, ["CVE-2023-44487"]);

    let chain = call(&contract, "queryLayerWithParents", &["L2"]).unwrap();
    let chain: Vec<Layer> = serde_json::from_str(&chain).unwrap();
    assert_eq!(chain.len(), 2);
    assert_eq!(chain[1], updated);
}

#[test]
fn test_paged_query_returns_page_json() {
    let contract = contract();
    for id in ["a", "b", "c"] {
        let payload = format!(r#"{{"id":"{id}"}}"#);
        call(&contract, "addLayer", &[id, "", &payload]).unwrap();
    }

    let raw = call(&contract, "queryPagedLayers", &["", "2"]).unwrap();
    let page: Page = serde_json::from_str(&raw).unwrap();
    assert_eq!(page.page_size, 2);
    assert_eq!(page.next_page_id.as_deref(), Some("c"));

    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert!(json.get("items").is_some());
    assert!(json.get("pageId").is_some());
}

#[test]
fn test_malformed_page_size_fails_before_reading() {
    let contract = contract();
    let err = call(&contract, "queryPagedLayers", &["", "two"]).unwrap_err();
    let failure = TransactionFailure::from(&err);
    assert_eq!(failure.code, "INVALID_ARGUMENT");
    assert!(failure.message.contains("malformed page size"));
}

#[test]
fn test_failures_carry_stable_codes() {
    let contract = contract();
    call(&contract, "addLayer", &["L1", "", r#"{"id":"L1"}"#]).unwrap();
    call(&contract, "addVulnerabilityToLayer", &["L1", "CVE-1"]).unwrap();

    let cases = [
        ("queryLayer", vec!["nope"], "LAYER_NOT_FOUND"),
        ("addLayer", vec!["L1", "", r#"{"id":"L1"}"#], "LAYER_ALREADY_EXISTS"),
        ("addLayer", vec!["L2", "ghost", r#"{"id":"L2"}"#], "LAYER_NOT_FOUND"),
        ("addVulnerabilityToLayer", vec!["L1", "CVE-1"], "VULNERABILITY_ID_ALREADY_ADDED"),
        ("removeLayer", vec!["L1"], "UNKNOWN_TRANSACTION"),
    ];

    for (function, args, code) in cases {
        let err = call(&contract, function, &args).unwrap_err();
        assert_eq!(err.code(), code, "{function}");
    }
    assert_eq!(contract.registry().store().len(), 1);
}
