mod test_support;

use serde_json::json;
use test_support::{approx, request_err, request_ok, spawn_sidecar, temp_dir};

fn pilot_norm_set() -> serde_json::Value {
    json!({
        "format": "mapnorms-v1",
        "academicYear": "2026-2027",
        "source": "district pilot",
        "norms": [
            { "grade": 7, "term": "fall", "subject": "reading", "mean": 214.0, "sd": 15.5 },
            { "grade": 7, "term": "spring", "subject": "reading", "mean": 218.0, "sd": 15.9 }
        ],
        "growthCorrelations": [
            { "subject": "reading", "period": "fallToSpring", "correlation": 0.8 }
        ]
    })
}

#[test]
fn norms_import_persists_across_workspace_reopen() {
    let workspace = temp_dir("mapnorms-import-roundtrip");

    {
        let (mut child, mut stdin, mut reader) = spawn_sidecar();

        let no_ws = request_err(
            &mut stdin,
            &mut reader,
            "1",
            "norms.import",
            json!({ "document": pilot_norm_set() }),
        );
        assert_eq!(no_ws, "no_workspace");

        let _ = request_ok(
            &mut stdin,
            &mut reader,
            "2",
            "workspace.select",
            json!({ "path": workspace.path().to_string_lossy() }),
        );
        let imported = request_ok(
            &mut stdin,
            &mut reader,
            "3",
            "norms.import",
            json!({ "document": pilot_norm_set() }),
        );
        assert_eq!(imported["academicYear"], json!("2026-2027"));
        assert_eq!(imported["entryCount"], json!(2));
        assert_eq!(imported["replaced"], json!(false));
        let fingerprint = imported["fingerprint"].as_str().expect("fingerprint").to_string();
        assert_eq!(fingerprint.len(), 64);

        // Same document, same fingerprint, replaces in place.
        let again = request_ok(
            &mut stdin,
            &mut reader,
            "4",
            "norms.import",
            json!({ "document": pilot_norm_set() }),
        );
        assert_eq!(again["fingerprint"], json!(fingerprint));
        assert_eq!(again["replaced"], json!(true));

        drop(stdin);
        let _ = child.wait();
    }

    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.path().to_string_lossy() }),
    );
    let listed = request_ok(&mut stdin, &mut reader, "2", "norms.list", json!({}));
    let sets = listed["normSets"].as_array().expect("normSets");
    assert_eq!(sets.len(), 3);
    let pilot = sets
        .iter()
        .find(|s| s["academicYear"] == json!("2026-2027"))
        .expect("imported set listed");
    assert_eq!(pilot["origin"]["kind"], json!("imported"));
    assert_eq!(pilot["origin"]["source"], json!("district pilot"));
    assert_eq!(pilot["grades"], json!([7]));
    assert!(pilot["importedAt"].is_string());

    let pct = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "map.percentile",
        json!({
            "score": 214,
            "grade": 7,
            "term": "fall",
            "subject": "reading",
            "academicYear": "2026-2027"
        }),
    );
    assert_eq!(pct["percentile"], json!(50));
    assert_eq!(pct["source"], json!("norm"));

    let growth = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "map.expectedGrowth",
        json!({
            "startScore": 214,
            "grade": 7,
            "subject": "reading",
            "period": "fallToSpring",
            "academicYear": "2026-2027"
        }),
    );
    assert!(approx(&growth["expectedGrowth"], 4.0, 1e-9));

    // Without a winter entry the other periods have no norms.
    let winter = request_err(
        &mut stdin,
        &mut reader,
        "5",
        "map.expectedGrowth",
        json!({
            "startScore": 214,
            "grade": 7,
            "subject": "reading",
            "period": "fallToWinter",
            "academicYear": "2026-2027"
        }),
    );
    assert_eq!(winter, "missing_norm");

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn invalid_norm_sets_are_rejected_without_side_effects() {
    let workspace = temp_dir("mapnorms-import-invalid");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.path().to_string_lossy() }),
    );

    let mut wrong_format = pilot_norm_set();
    wrong_format["format"] = json!("mapnorms-v0");
    let mut bad_sd = pilot_norm_set();
    bad_sd["norms"][0]["sd"] = json!(0.0);
    let mut bad_year = pilot_norm_set();
    bad_year["academicYear"] = json!("2026-2028");
    let mut bad_correlation = pilot_norm_set();
    bad_correlation["growthCorrelations"][0]["correlation"] = json!(1.0);
    let mut duplicate = pilot_norm_set();
    let first = duplicate["norms"][0].clone();
    duplicate["norms"][1] = first;

    for (i, doc) in [wrong_format, bad_sd, bad_year, bad_correlation, duplicate]
        .into_iter()
        .enumerate()
    {
        let code = request_err(
            &mut stdin,
            &mut reader,
            &format!("bad-{}", i),
            "norms.import",
            json!({ "document": doc }),
        );
        assert_eq!(code, "invalid_norm_set");
    }

    let listed = request_ok(&mut stdin, &mut reader, "2", "norms.list", json!({}));
    assert_eq!(listed["normSets"].as_array().map(|a| a.len()), Some(2));

    let missing = request_err(
        &mut stdin,
        &mut reader,
        "3",
        "norms.importFile",
        json!({ "path": workspace.path().join("absent.json").to_string_lossy() }),
    );
    assert_eq!(missing, "io_failed");

    let file = workspace.path().join("pilot.json");
    std::fs::write(&file, pilot_norm_set().to_string()).expect("write norm file");
    let from_file = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "norms.importFile",
        json!({ "path": file.to_string_lossy() }),
    );
    assert_eq!(from_file["academicYear"], json!("2026-2027"));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn settings_update_moves_the_fallback_year() {
    let workspace = temp_dir("mapnorms-settings");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let no_ws = request_err(&mut stdin, &mut reader, "1", "settings.get", json!({}));
    assert_eq!(no_ws, "no_workspace");

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "workspace.select",
        json!({ "path": workspace.path().to_string_lossy() }),
    );
    let defaults = request_ok(&mut stdin, &mut reader, "3", "settings.get", json!({}));
    assert_eq!(
        defaults["analytics"],
        json!({
            "fallbackAcademicYear": "2025-2026",
            "percentileStdError": 3.0,
            "academicYearStartMonth": 8
        })
    );

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "norms.import",
        json!({ "document": pilot_norm_set() }),
    );
    let updated = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "settings.update",
        json!({ "patch": { "fallbackAcademicYear": "2026-2027", "percentileStdError": 5 } }),
    );
    assert_eq!(updated["analytics"]["fallbackAcademicYear"], json!("2026-2027"));

    // No academicYear now resolves to the imported set.
    let pct = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "map.percentile",
        json!({ "score": 214, "grade": 7, "term": "fall", "subject": "reading", "strict": true }),
    );
    assert_eq!(pct["percentile"], json!(50));

    let range = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "map.percentileRange",
        json!({ "score": 214, "grade": 7, "term": "fall", "subject": "reading" }),
    );
    assert!(approx(&range["stdError"], 5.0, 1e-12));

    let rejected = request_err(
        &mut stdin,
        &mut reader,
        "8",
        "settings.update",
        json!({ "patch": { "academicYearStartMonth": 13 } }),
    );
    assert_eq!(rejected, "bad_params");
    drop(stdin);
    let _ = child.wait();

    // Settings survive a reopen.
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.path().to_string_lossy() }),
    );
    let health = request_ok(&mut stdin, &mut reader, "2", "health", json!({}));
    assert_eq!(health["fallbackAcademicYear"], json!("2026-2027"));
    let reloaded = request_ok(&mut stdin, &mut reader, "3", "settings.get", json!({}));
    assert_eq!(reloaded["analytics"]["percentileStdError"], json!(5.0));

    drop(stdin);
    let _ = child.wait();
}
