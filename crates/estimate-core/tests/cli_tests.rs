#![cfg(feature = "cli_api")]

use assert_cmd::Command;
use predicates::str::contains as str_contains;
use std::io::Write;
use tempfile::NamedTempFile;

#[allow(deprecated)]
fn run_cli(script: &str) -> assert_cmd::assert::Assert {
    let mut cmd = Command::cargo_bin("cli").expect("cli binary");
    cmd.write_stdin(script.to_string()).assert()
}

#[test]
fn cli_adds_and_prices_line_item() {
    run_cli("add 1 40 10 FT 4 3.1 Copper pipe\nquit\n")
        .success()
        .stdout(str_contains("Copper pipe"))
        .stdout(str_contains("312.40"))
        .stdout(str_contains("cost $312.40"));
}

#[test]
fn cli_wastage_is_entered_as_percent() {
    let assert = run_cli("add 1 40 0 FT 4 3.1 Copper pipe\nset 1 wastage 10\nquit\n").success();
    let output = String::from_utf8_lossy(&assert.get_output().stdout);
    let after_set = output.split("wastage set.").last().unwrap_or_default();
    assert!(after_set.contains("| 10%"), "unexpected table:\n{after_set}");
    assert!(!after_set.contains("1000%"));
    assert!(after_set.contains("cost $312.40"));
}

#[test]
fn cli_set_rejects_bad_number() {
    run_cli("new\nset 1 qty lots\nquit\n")
        .success()
        .stdout(str_contains("Invalid value for quantity"));
}

#[test]
fn cli_delete_command_removes_item() {
    run_cli("new\nnew\ndelete 2\ndelete 9\nquit\n")
        .success()
        .stdout(str_contains("Deleted line item 2."))
        .stdout(str_contains("Line item 9 not found."));
}

#[test]
fn cli_tag_breakdown_and_bid() {
    run_cli(
        "add 1 40 10 FT 4 3.1 Copper pipe\ntag add 1 Copper 40\ntag list\nbreakdown\nbreakdown Copper\nbid\nquit\n",
    )
    .success()
    .stdout(str_contains("Tag 'Copper' added to line item 1."))
    .stdout(str_contains("total_with_overhead_and_tax"))
    .stdout(str_contains("Total bid          : $481.71"));
}

#[test]
fn cli_rates_and_summary() {
    run_cli("rates avg\nsummary\nquit\n")
        .success()
        .stdout(str_contains("Overhead markup    : 42%"))
        .stdout(str_contains("items=0, tags=0, cost=$0.00, bid=$0.00, margin=0.00%"));
}

#[test]
fn cli_save_and_load_json_round_trip() {
    let tmp = NamedTempFile::new().expect("create temp file");
    let path = tmp.path().to_string_lossy().replace('\\', "\\\\");
    let script = format!(
        "add 1 10 0 EA 1 1 Persisted\nsave json {}\nadd 2 1 0 EA 1 1 Temporary\nload json {}\nshow\nquit\n",
        path, path
    );
    let assert = run_cli(&script).success();
    let output = String::from_utf8_lossy(&assert.get_output().stdout);
    assert!(output.contains("Estimate loaded from"));
    let after_reload = output
        .split("Estimate loaded from")
        .last()
        .unwrap_or_default();
    assert!(after_reload.contains("Persisted"));
    assert!(
        !after_reload.contains("Temporary"),
        "temporary item should not appear after reload:\n{}",
        after_reload
    );
}

#[test]
fn cli_imports_csv() {
    let mut tmp = NamedTempFile::new().expect("create temp file");
    writeln!(
        tmp,
        "description,quantity,unit_labor_cost,unit_material_cost,tags\nConduit,100,0.5,0.25,Electrical\nBreaker,4,15,22,Electrical:2"
    )
    .unwrap();
    let path = tmp.path().to_string_lossy().to_string();
    run_cli(&format!("new\nimport {}\ntag list\nquit\n", path))
        .success()
        .stdout(str_contains("Imported 2 line items"))
        .stdout(str_contains("Conduit"))
        .stdout(str_contains("  Electrical"));
}

#[test]
fn cli_import_refuses_existing_ids() {
    let mut tmp = NamedTempFile::new().expect("create temp file");
    writeln!(
        tmp,
        "id,description,quantity,unit_labor_cost,unit_material_cost\n1,Replacement,1,1,1\n,Extra,1,1,1"
    )
    .unwrap();
    let path = tmp.path().to_string_lossy().to_string();
    let assert = run_cli(&format!(
        "add 1 40 10 FT 4 3.1 Copper pipe\ntag add 1 Copper 40\nimport {}\nshow\ntag list\nquit\n",
        path
    ))
    .success()
    .stdout(str_contains("Import aborted: line item ids already in use: 1."));
    let output = String::from_utf8_lossy(&assert.get_output().stdout);
    let after_import = output.split("Import aborted").last().unwrap_or_default();
    assert!(after_import.contains("Copper pipe"));
    assert!(after_import.contains("  Copper"));
    assert!(!after_import.contains("Replacement"));
    assert!(!after_import.contains("Extra"));
}

#[test]
fn cli_unknown_command() {
    run_cli("frobnicate\nquit\n")
        .success()
        .stdout(str_contains("Unknown command. Type 'help'."));
}
