use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;
use tempfile::TempDir;

struct Ledger {
    home: TempDir,
}

impl Ledger {
    fn new() -> Self {
        Self { home: tempfile::tempdir().unwrap() }
    }

    fn data_dir(&self) -> std::path::PathBuf {
        self.home.path().join("books")
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("ledgerbook").unwrap();
        cmd.env("HOME", self.home.path())
            .env("LEDGERBOOK_DATA_DIR", self.data_dir())
            .env("NO_COLOR", "1")
            .env_remove("RUST_LOG");
        cmd
    }

    fn run(&self, args: &[&str]) {
        self.cmd().args(args).assert().success();
    }
}

fn seeded() -> Ledger {
    let ledger = Ledger::new();
    ledger.run(&["init"]);
    ledger.run(&["sales", "add", "1000", "--date", "2024-01-15", "--type", "fiscal"]);
    ledger.run(&["sales", "add", "200", "--date", "2024-01-20", "--type", "non-fiscal"]);
    ledger.run(&["sales", "add", "500", "--date", "2024-02-10", "--type", "fiscal"]);
    ledger.run(&[
        "invoices", "add", "--number", "P-1", "--date", "2024-01-05", "--type", "product",
        "--item", "2:100", "--item", "50",
    ]);
    ledger.run(&[
        "invoices", "add", "--number", "S-1", "--date", "2024-02-03", "--type", "service",
        "--item", "80",
    ]);
    ledger.run(&["expenses", "add", "300", "--date", "2024-01-31", "--type-id", "rent"]);
    ledger.run(&["expenses", "add", "40", "--date", "2024-02-14", "--type-id", "utilities"]);
    ledger
}

#[test]
fn test_init_creates_database() {
    let ledger = Ledger::new();
    ledger
        .cmd()
        .args(["init", "--business-name", "Corner Shop"])
        .assert()
        .success()
        .stdout(contains("Initialized ledgerbook"));
    assert!(ledger.data_dir().join("ledgerbook.db").exists());

    ledger
        .cmd()
        .arg("status")
        .assert()
        .success()
        .stdout(contains("Corner Shop"))
        .stdout(contains("Expense types:  5"));
}

#[test]
fn test_pnl_export_to_stdout() {
    let ledger = seeded();
    ledger
        .cmd()
        .args(["export", "pnl", "--year", "2024", "--output", "-"])
        .assert()
        .success()
        .stdout(contains("Category,2024-01,2024-02"))
        .stdout(contains("Sales,1200.00,500.00,"))
        .stdout(contains("COGS,250.00,0.00,"))
        .stdout(contains("Invoice Expenses,0.00,80.00,"))
        .stdout(contains("Rent,300.00,0.00,"))
        .stdout(contains("Net Earnings,650.00,380.00,"));
}

#[test]
fn test_pnl_report_renders_table() {
    let ledger = seeded();
    ledger
        .cmd()
        .args(["report", "pnl", "--year", "2024"])
        .assert()
        .success()
        .stdout(contains("Gross Profit"))
        .stdout(contains("Net earnings: $1,030.00"));
}

#[test]
fn test_drilldown_lists_contributing_records() {
    let ledger = seeded();
    ledger
        .cmd()
        .args(["report", "drilldown", "--year", "2024", "--month", "1", "--row", "sales"])
        .assert()
        .success()
        .stdout(contains("2024-01-15"))
        .stdout(contains("2024-01-20"))
        .stdout(contains("2 record(s), total $1,200.00"));
}

#[test]
fn test_drilldown_unknown_row_fails() {
    let ledger = seeded();
    ledger
        .cmd()
        .args(["report", "drilldown", "--year", "2024", "--month", "1", "--row", "Marketing"])
        .assert()
        .failure()
        .stderr(contains("Unknown report row"));
}

#[test]
fn test_pnl_export_default_path_matches_help() {
    let ledger = seeded();
    let today = chrono::Local::now().format("%Y-%m-%d").to_string();
    let expected = ledger.data_dir().join("exports").join(format!("pnl-2024-{today}.csv"));
    ledger
        .cmd()
        .args(["export", "pnl", "--year", "2024"])
        .assert()
        .success()
        .stdout(contains(format!("pnl-2024-{today}.csv")));
    assert!(expected.exists());

    ledger
        .cmd()
        .args(["export", "pnl", "--help"])
        .assert()
        .success()
        .stdout(contains("pnl-<year>-<today>.csv"));
}

#[test]
fn test_list_rejects_out_of_range_year() {
    let ledger = seeded();
    ledger
        .cmd()
        .args(["sales", "list", "--year", "300000"])
        .assert()
        .failure()
        .stderr(contains("year 300000 is out of range"));
    ledger
        .cmd()
        .args(["expenses", "list", "--year", "300000"])
        .assert()
        .failure();
}

#[test]
fn test_drilldown_unmatched_other_by_alias() {
    let ledger = Ledger::new();
    ledger.run(&["init"]);
    ledger.run(&["expense-types", "add", "Other", "--id", "misc"]);
    ledger.run(&["expenses", "add", "12", "--date", "2024-04-02", "--type-id", "misc"]);
    let file = ledger.home.path().join("orphans.json");
    std::fs::write(
        &file,
        r#"{"otherExpenses": [{"id": "orphan-1", "date": "2024-04-09", "typeId": "gone", "amount": 7}]}"#,
    )
    .unwrap();
    ledger.run(&["import", file.to_str().unwrap()]);

    ledger
        .cmd()
        .args(["report", "drilldown", "--month", "2024-04", "--row", "other:unmatched"])
        .assert()
        .success()
        .stdout(contains("orphan-1"))
        .stdout(contains("1 record(s), total $7.00"));
    ledger
        .cmd()
        .args(["report", "drilldown", "--month", "2024-04", "--row", "Other"])
        .assert()
        .success()
        .stdout(contains("1 record(s), total $12.00"))
        .stdout(contains("orphan-1").not());
}

#[test]
fn test_dashboard_respects_range() {
    let ledger = seeded();
    ledger
        .cmd()
        .args(["export", "series", "--from", "2024-02-01", "--output", "-"])
        .assert()
        .success()
        .stdout(contains("Month,Fiscal Sales,Non-fiscal Sales,Purchases,Other Expenses"))
        .stdout(contains("2024-02,500.00,0.00,80.00,40.00"))
        .stdout(contains("2024-01").not());

    ledger
        .cmd()
        .args(["report", "dashboard", "--from", "2024-01-01", "--to", "2024-12-31"])
        .assert()
        .success()
        .stdout(contains("$1,700.00"));
}

#[test]
fn test_invalid_input_is_rejected() {
    let ledger = seeded();
    ledger
        .cmd()
        .args(["sales", "add", "10", "--date", "15/01/2024"])
        .assert()
        .failure()
        .stderr(contains("Invalid date"));
    ledger
        .cmd()
        .args(["expenses", "add", "10", "--date", "2024-01-01", "--type-id", "nope"])
        .assert()
        .failure()
        .stderr(contains("Unknown expense type"));
    ledger
        .cmd()
        .args(["expense-types", "delete", "rent"])
        .assert()
        .failure()
        .stderr(contains("still referenced"));
}

#[test]
fn test_import_then_audit() {
    let ledger = Ledger::new();
    ledger.run(&["init"]);
    let file = ledger.home.path().join("export.json");
    std::fs::write(
        &file,
        r#"{
            "sales": [
                {"id": "s1", "date": "2024-03-01", "type": "fiscal", "amount": 90},
                {"id": "s2", "date": "someday", "type": "fiscal", "amount": 10}
            ],
            "otherExpenses": [
                {"id": "e1", "date": "2024-03-02", "typeId": "gone", "amount": 15}
            ]
        }"#,
    )
    .unwrap();
    let path = file.to_str().unwrap();

    ledger
        .cmd()
        .args(["import", path])
        .assert()
        .success()
        .stdout(contains("Imported 2 sale(s)"))
        .stdout(contains("data problem(s) found"));
    ledger
        .cmd()
        .args(["import", path])
        .assert()
        .success()
        .stdout(contains("already been imported"));

    ledger
        .cmd()
        .args(["report", "audit"])
        .assert()
        .success()
        .stdout(contains("unreadable date"))
        .stdout(contains("unknown expense type"));

    ledger
        .cmd()
        .args(["export", "pnl", "--year", "2024", "--output", "-"])
        .assert()
        .success()
        .stdout(contains("Other,0.00,0.00,15.00,"));
}

#[test]
fn test_import_tolerates_null_fields() {
    let ledger = Ledger::new();
    ledger.run(&["init"]);
    let file = ledger.home.path().join("nulls.json");
    std::fs::write(
        &file,
        r#"{"sales": [
            {"id": "s1", "date": null, "type": "fiscal", "amount": 30},
            {"date": "2024-06-01", "type": "fiscal", "amount": 20}
        ]}"#,
    )
    .unwrap();

    ledger
        .cmd()
        .args(["import", file.to_str().unwrap()])
        .assert()
        .success()
        .stdout(contains("Imported 2 sale(s)"));
    ledger
        .cmd()
        .args(["report", "audit"])
        .assert()
        .success()
        .stdout(contains("missing date"));
    ledger
        .cmd()
        .args(["export", "series", "--output", "-"])
        .assert()
        .success()
        .stdout(contains("2024-06,20.00,"))
        .stdout(contains("Unknown,30.00,"));
}

#[test]
fn test_demo_is_idempotent() {
    let ledger = Ledger::new();
    ledger.run(&["init"]);
    ledger
        .cmd()
        .arg("demo")
        .assert()
        .success()
        .stdout(contains("Demo data loaded!"));
    ledger
        .cmd()
        .arg("demo")
        .assert()
        .success()
        .stdout(contains("already loaded"));
}
