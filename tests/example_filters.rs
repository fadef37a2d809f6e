use requisition_scout::filters::{Filter, FilterSet};
use requisition_scout::schemas::listings_response::ListingsPayload;
use serde_json::json;

fn listing(id: &str, grade: &str, rate: f64, destination: &str, term: u32) -> serde_json::Value {
    json!({
        "id": id,
        "url": format!("https://app.example.com/requisitions/{}", id),
        "grade": grade,
        "interest_rate": rate,
        "score": 700,
        "destination": destination,
        "term": term,
        "amount": 30000.0,
        "remaining_funding_amount": 8000.0,
        "loan_number": 1
    })
}

#[test]
fn example_filter_file_selects_from_wrapped_listings() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/filters.example.yaml");
    let filters: FilterSet<Filter> = FilterSet::from_path(path).unwrap();
    assert_eq!(filters.len(), 2);

    let payload = ListingsPayload::from(json!({
        "requisitions": [
            listing("safe-short", "A2", 9.0, "Negocio", 6),
            listing("mid-debt", "B1", 16.0, "Pagar Deudas", 24),
            listing("mid-car", "B2", 15.0, "Automóvil", 36),
            listing("risky", "C4", 29.0, "Negocio", 12),
        ]
    }));

    let (requisitions, skipped) = payload.requisitions();
    assert_eq!(skipped, 0);

    let ids: Vec<_> = filters
        .select(&requisitions)
        .iter()
        .map(|r| r.id.as_str())
        .collect();
    assert_eq!(ids, vec!["safe-short", "mid-car"]);
}
