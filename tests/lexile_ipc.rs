mod test_support;

use serde_json::json;
use test_support::{approx, request_err, request_ok, spawn_sidecar};

#[test]
fn lexile_text_codes_and_bands() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let br = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "lexile.parse",
        json!({ "text": " br150 " }),
    );
    assert_eq!(br["value"], json!(-150));
    assert_eq!(br["formatted"], json!("BR150L"));

    let junk = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "lexile.parse",
        json!({ "text": "about 900" }),
    );
    assert!(junk["value"].is_null());

    let formatted = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "lexile.format",
        json!({ "value": 1050 }),
    );
    assert_eq!(formatted["formatted"], json!("1050L"));

    for (i, (value, key)) in [
        (json!(-1), "br"),
        (json!(0), "0-199"),
        (json!(199), "0-199"),
        (json!(200), "200-399"),
        (json!("999L"), "800-999"),
        (json!(1000), "1000+"),
        (json!(2400), "1000+"),
    ]
    .into_iter()
    .enumerate()
    {
        let band = request_ok(
            &mut stdin,
            &mut reader,
            &format!("band-{}", i),
            "lexile.band",
            json!({ "value": value }),
        );
        assert_eq!(band["band"]["key"], json!(key), "value {}", value);
    }

    let unparsed = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "lexile.band",
        json!({ "value": "BRL" }),
    );
    assert!(unparsed["band"].is_null());

    let bands = request_ok(&mut stdin, &mut reader, "5", "lexile.bands", json!({}));
    let keys: Vec<&str> = bands["bands"]
        .as_array()
        .expect("bands")
        .iter()
        .filter_map(|b| b["key"].as_str())
        .collect();
    assert_eq!(
        keys,
        vec!["br", "0-199", "200-399", "400-599", "600-799", "800-999", "1000+"]
    );

    let missing = request_err(&mut stdin, &mut reader, "6", "lexile.format", json!({}));
    assert_eq!(missing, "bad_params");

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn lexile_cohort_summaries_skip_missing_values() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let values = json!([null, 300, "BR100L", "620L", 640, "unknown"]);
    let dist = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "lexile.distribution",
        json!({ "values": values }),
    );
    assert_eq!(dist["total"], json!(4));
    let pct: Vec<f64> = dist["bands"]
        .as_array()
        .expect("bands")
        .iter()
        .map(|b| b["percentage"].as_f64().expect("percentage"))
        .collect();
    assert_eq!(pct, vec![25.0, 0.0, 25.0, 0.0, 50.0, 0.0, 0.0]);

    let stats = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "lexile.stats",
        json!({ "values": values }),
    );
    assert_eq!(stats["count"], json!(4));
    assert!(approx(&stats["mean"], 365.0, 1e-9));
    assert!(approx(&stats["median"], 460.0, 1e-9));
    assert_eq!(stats["min"], json!(-100));
    assert_eq!(stats["max"], json!(640));
    assert!(stats["stdDev"].as_f64().expect("stdDev") > 0.0);

    let bad = request_err(
        &mut stdin,
        &mut reader,
        "3",
        "lexile.stats",
        json!({ "values": "300L" }),
    );
    assert_eq!(bad, "bad_params");

    drop(stdin);
    let _ = child.wait();
}
