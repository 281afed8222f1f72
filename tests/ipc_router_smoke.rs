mod test_support;

use serde_json::json;
use test_support::{request, send_line, spawn_sidecar};

#[test]
fn router_dispatch_smoke_covers_handler_families() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let methods: Vec<(&str, serde_json::Value)> = vec![
        ("health", json!({})),
        ("norms.list", json!({})),
        (
            "norms.get",
            json!({ "grade": 4, "term": "winter", "subject": "reading" }),
        ),
        (
            "map.percentile",
            json!({ "score": 200, "grade": 4, "term": "fall", "subject": "reading" }),
        ),
        (
            "map.percentileRange",
            json!({ "score": 200, "grade": 4, "term": "fall", "subject": "reading" }),
        ),
        (
            "map.expectedGrowth",
            json!({
                "startScore": 200,
                "grade": 4,
                "subject": "reading",
                "period": "fallToSpring"
            }),
        ),
        (
            "map.growthPercentile",
            json!({
                "startScore": 200,
                "endScore": 207,
                "grade": 4,
                "subject": "reading",
                "period": "fallToSpring"
            }),
        ),
        ("map.achievement", json!({ "score": 200, "norm": 196.67 })),
        (
            "map.projection",
            json!({ "projectedScore": 210, "springNorm": 204.83 }),
        ),
        ("lexile.parse", json!({ "text": "BR100L" })),
        ("lexile.format", json!({ "value": 640 })),
        ("lexile.band", json!({ "value": 640 })),
        ("lexile.bands", json!({})),
        ("lexile.distribution", json!({ "values": [100, 640, null] })),
        ("lexile.stats", json!({ "values": [100, 640, null] })),
        ("records.classify", json!({ "records": [] })),
    ];

    for (i, (method, params)) in methods.into_iter().enumerate() {
        let id = format!("{}", i + 1);
        let resp = request(&mut stdin, &mut reader, &id, method, params);
        assert_eq!(
            resp.get("ok").and_then(|v| v.as_bool()),
            Some(true),
            "{} failed: {}",
            method,
            resp
        );
    }

    let unknown = request(&mut stdin, &mut reader, "99", "classes.list", json!({}));
    assert_eq!(unknown["ok"], json!(false));
    assert_eq!(unknown["error"]["code"], json!("not_implemented"));

    let bad = send_line(&mut stdin, &mut reader, "{not json");
    assert_eq!(bad["ok"], json!(false));
    assert_eq!(bad["error"]["code"], json!("bad_json"));
    assert!(bad.get("id").is_none());

    // The loop keeps serving after a malformed line.
    let health = request(&mut stdin, &mut reader, "100", "health", json!({}));
    assert_eq!(health["ok"], json!(true));
    assert_eq!(
        health["result"]["academicYears"],
        json!(["2024-2025", "2025-2026"])
    );
    assert_eq!(health["result"]["fallbackAcademicYear"], json!("2025-2026"));
    assert!(health["result"]["workspacePath"].is_null());

    drop(stdin);
    let _ = child.wait();
}
