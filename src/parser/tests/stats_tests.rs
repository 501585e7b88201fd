//! Tests for parsing statistics

use super::super::stats::{ParseResult, ParseStats};

#[test]
fn test_success_rate() {
    let stats = ParseStats {
        rows_collected: 20,
        rows_dropped: 5,
        ..ParseStats::new()
    };
    assert_eq!(stats.success_rate(), 75.0);
}

#[test]
fn test_empty_stats() {
    let stats = ParseStats::default();
    assert_eq!(stats.success_rate(), 0.0);
    assert_eq!(stats.rows_repaired(), 0);
    assert!(!stats.header_found);
    assert!(stats.rejection.is_none());
}

#[test]
fn test_rows_repaired() {
    let stats = ParseStats {
        rows_folded: 2,
        rows_padded: 3,
        ..ParseStats::new()
    };
    assert_eq!(stats.rows_repaired(), 5);
}

#[test]
fn test_empty_result() {
    let result = ParseResult::empty();
    assert!(result.table.is_empty());
    assert_eq!(result.stats, ParseStats::new());
}
