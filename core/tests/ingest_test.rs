//! End-to-end ingestion tests: CSV upload through to the typed table

mod common;

use common::{seeded_session, write_csv};
use opsdesk_core::ingest::{ingest, read_upload};
use opsdesk_core::schema::IngestMode;
use opsdesk_core::{OpsdeskError, Value};
use tempfile::TempDir;

const ALL_LEVEL_CSV: &str = "\
No,Creator Name,Username,Post,Redemption GMV,Status,Hadiah,Level
1,Alpha Creator,alpha.creator,20,\"Rp334.022.643\",Dapat Hadiah,\"Rp150.000\",2
2,Zee Travels,zee.travels,5,\"Rp1.500.000\",Belum,-,1
3,Ghost,,3,\"Rp100.000\",Belum,-,0
";

#[test]
fn test_all_level_upload_lands_typed() {
    let dir = TempDir::new().unwrap();
    let path = write_csv(dir.path(), "all_level.csv", ALL_LEVEL_CSV);

    let mut session = seeded_session();
    let mode = IngestMode::find("all-level").unwrap();
    let (columns, records) = read_upload(session.store(), &path).unwrap();
    let result = ingest(session.store_mut(), &mode, &columns, &records, true).unwrap();

    // Row 3 has no username, which is the one required field
    assert_eq!(result.rows_inserted, 2);
    assert_eq!(result.rejected.len(), 1);
    assert_eq!(result.rejected[0].field, "Username");
    assert!(result.warnings.is_empty());

    let rows = session
        .store()
        .query(
            "SELECT username, post_count, redemption_gmv_idr, hadiah_idr \
             FROM leaderboard.creator_leaderboard_all_level ORDER BY rank_no",
            &[],
        )
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get("username"), Some(&Value::text("alpha.creator")));
    assert_eq!(rows[0].get("redemption_gmv_idr"), Some(&Value::Int(334022643)));
    assert_eq!(rows[0].get("post_count"), Some(&Value::Int(20)));
    // "-" is a placeholder, stored as null without a warning
    assert_eq!(rows[1].get("hadiah_idr"), Some(&Value::Null));
}

#[test]
fn test_replace_is_idempotent_append_is_not() {
    let dir = TempDir::new().unwrap();
    let path = write_csv(dir.path(), "all_level.csv", ALL_LEVEL_CSV);

    let mut session = seeded_session();
    let mode = IngestMode::find("all-level").unwrap();

    for _ in 0..2 {
        let (columns, records) = read_upload(session.store(), &path).unwrap();
        ingest(session.store_mut(), &mode, &columns, &records, true).unwrap();
    }
    let count = session
        .store()
        .query_one(
            "SELECT count(*) AS n FROM leaderboard.creator_leaderboard_all_level",
            &[],
        )
        .unwrap();
    assert_eq!(count.get("n"), Some(&Value::Int(2)));

    let (columns, records) = read_upload(session.store(), &path).unwrap();
    ingest(session.store_mut(), &mode, &columns, &records, false).unwrap();
    let count = session
        .store()
        .query_one(
            "SELECT count(*) AS n FROM leaderboard.creator_leaderboard_all_level",
            &[],
        )
        .unwrap();
    assert_eq!(count.get("n"), Some(&Value::Int(4)));
}

#[test]
fn test_missing_column_rejects_whole_upload() {
    let dir = TempDir::new().unwrap();
    let path = write_csv(
        dir.path(),
        "truncated.csv",
        "Username,GMV\nalpha.creator,\"Rp1.000\"\n",
    );

    let mut session = seeded_session();
    let mode = IngestMode::find("all-industry").unwrap();
    let (columns, records) = read_upload(session.store(), &path).unwrap();
    let err = ingest(session.store_mut(), &mode, &columns, &records, true).unwrap_err();

    match err {
        OpsdeskError::MissingColumns { columns } => {
            assert!(columns.contains(&"Order Accommodation".to_string()));
            assert!(columns.contains(&"Bonus".to_string()));
        }
        other => panic!("unexpected error: {other}"),
    }

    let tables = session
        .store()
        .query(
            "SELECT table_name FROM information_schema.tables WHERE table_schema = 'leaderboard'",
            &[],
        )
        .unwrap();
    assert!(tables.is_empty(), "nothing should have been created");
}

#[test]
fn test_header_match_is_case_insensitive() {
    let dir = TempDir::new().unwrap();
    let path = write_csv(
        dir.path(),
        "industry.csv",
        "\
USERNAME,gmv,Order Accommodation,Order Dining,Order Things To Do,Syarat Penjualan,Kurang Penjualan,status,Bonus
zee.travels,\"Rp75.000.000\",3,12,1,\"Rp50.000.000\",0,Tercapai,\"Rp2.000.000\"
",
    );

    let mut session = seeded_session();
    let mode = IngestMode::find("all-industry").unwrap();
    let (columns, records) = read_upload(session.store(), &path).unwrap();
    let result = ingest(session.store_mut(), &mode, &columns, &records, true).unwrap();
    assert_eq!(result.rows_inserted, 1);

    let row = session
        .store()
        .query_one(
            "SELECT username, gmv_idr, order_dining, bonus_idr \
             FROM leaderboard.creator_leaderboard_all_industry_bonus",
            &[],
        )
        .unwrap();
    assert_eq!(row.get("username"), Some(&Value::text("zee.travels")));
    assert_eq!(row.get("gmv_idr"), Some(&Value::Int(75_000_000)));
    assert_eq!(row.get("order_dining"), Some(&Value::Int(12)));
    assert_eq!(row.get("bonus_idr"), Some(&Value::Int(2_000_000)));
}
