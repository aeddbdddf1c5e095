//! Reference results of the lead-generation dashboard run.

use crate::core::{
    FilterResult, QualificationResult, QualityResult, ReportResult, ScrapeResult, StageKind,
    StageResult, SyncResult,
};
use std::collections::BTreeMap;

/// Returns the reference result for a stage kind.
///
/// The simulated collaborators produce exactly these values.
#[must_use]
pub fn reference_result(kind: StageKind) -> StageResult {
    match kind {
        StageKind::Scrape => StageResult::Scrape(ScrapeResult {
            total_leads: 2847,
            sources: vec![
                "LinkedIn".to_string(),
                "Company Websites".to_string(),
                "Industry Directories".to_string(),
            ],
        }),
        StageKind::Filter => StageResult::Filter(FilterResult {
            filtered_leads: 1234,
            removed_leads: 1613,
            applied_filters: vec![
                "Healthcare Industry".to_string(),
                "100+ Employees".to_string(),
                "$5M+ Revenue".to_string(),
            ],
        }),
        StageKind::Qualify => StageResult::Qualify(QualificationResult {
            qualified_leads: 342,
            high_priority: 89,
            medium_priority: 156,
            low_priority: 97,
        }),
        StageKind::Sync => StageResult::Sync(SyncResult {
            synced_leads: 298,
            per_destination_counts: BTreeMap::from([
                ("salesforce".to_string(), 189),
                ("hubspot".to_string(), 109),
            ]),
            failed_sync: 44,
        }),
        StageKind::Quality => StageResult::Quality(QualityResult {
            quality_score: 94,
            duplicates_found: 23,
            missing_data: 12,
            enriched_records: 267,
            invalid_emails: 0,
        }),
        StageKind::Report => StageResult::Report(ReportResult {
            reports_generated: 5,
            dashboard_updated: true,
            alerts_sent: 3,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_results_match_kind() {
        for kind in StageKind::ALL {
            assert_eq!(reference_result(kind).kind(), kind);
        }
    }

    #[test]
    fn test_reference_sync_counts_add_up() {
        let result = reference_result(StageKind::Sync);
        let sync = result.as_sync().unwrap();
        assert_eq!(sync.per_destination_counts.values().sum::<u64>(), sync.synced_leads);
    }
}
