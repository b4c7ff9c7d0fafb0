//! Offline unit tests for viewpulse-db pool configuration and row types.
//! These tests do not require a live database connection.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use chrono::{TimeZone, Utc};
use uuid::Uuid;
use viewpulse_core::{AppConfig, ClickEvent, Embed, Environment, Milestone, Snapshot};
use viewpulse_db::{ClickEventRow, EmbedRow, MilestoneRow, PoolConfig, SnapshotRow};
use viewpulse_engine::ExportRow;

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let app_config = AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000),
        log_level: "info".to_string(),
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
        poll_interval_ms: 5_000,
        tick_interval_ms: 1_000,
        snapshot_limit: 6_000,
        dismissal_path: PathBuf::from("./.viewpulse/state.json"),
        watch_url: None,
        video_id: None,
        milestone_watch_cron: "0 * * * * *".to_string(),
        api_keys: Vec::new(),
    };

    let pool_config = PoolConfig::from_app_config(&app_config);
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

#[test]
fn snapshot_row_converts_to_domain_and_export_rows() {
    let captured_at = Utc.with_ymd_and_hms(2026, 5, 1, 8, 0, 0).unwrap();
    let row = SnapshotRow {
        id: 7,
        captured_at,
        views: Some(1_000),
        likes: None,
        comments: Some(3),
        views_per_hour: Some(250),
    };

    let export = ExportRow::from(row.clone());
    assert_eq!(export.views_per_hour, Some(250));

    let snapshot = Snapshot::from(row);
    assert_eq!(snapshot.captured_at, captured_at);
    assert_eq!(snapshot.views, Some(1_000));
    assert_eq!(snapshot.likes, None);
    assert_eq!(snapshot.comments, Some(3));
}

#[test]
fn milestone_row_drops_bookkeeping_columns() {
    let id = Uuid::new_v4();
    let row = MilestoneRow {
        id,
        title: "1M views".to_string(),
        target_count: 1_000_000,
        current_count: 0,
        sort_order: 2,
        is_active: true,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    let milestone = Milestone::from(row);
    assert_eq!(milestone.id, id);
    assert_eq!(milestone.target_count, 1_000_000);
    assert_eq!(milestone.sort_order, 2);
}

#[test]
fn embed_and_click_rows_convert() {
    let id = Uuid::new_v4();
    let embed = Embed::from(EmbedRow {
        id,
        title: "Channel".to_string(),
        url: "https://example.com".to_string(),
        thumbnail_url: None,
        sort_order: 0,
        is_active: true,
        created_at: Utc::now(),
    });
    assert_eq!(embed.id, id);

    let clicked_at = Utc::now();
    let click = ClickEvent::from(ClickEventRow {
        id: 1,
        embed_id: id,
        clicked_at,
    });
    assert_eq!(click.item_id, id);
    assert_eq!(click.clicked_at, clicked_at);
}
