//! Result composition: report first, then one outcome per entry

use crate::model::{EntryOperation, EntryOutcome, TransactionOutcome, TransactionReport};
use std::time::Duration;

pub fn compose(elapsed: Duration, entries: Vec<EntryOutcome>) -> TransactionOutcome {
    let count = |op: EntryOperation| entries.iter().filter(|e| e.operation == op).count();

    let creations = count(EntryOperation::Create);
    let deletions = count(EntryOperation::Delete);
    let updates = count(EntryOperation::Update) + deletions;
    let noops = count(EntryOperation::Noop);
    let elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);

    let report = TransactionReport {
        elapsed_ms,
        creations,
        updates,
        deletions,
        noops,
        summary: format!(
            "Transaction completed in {}ms with {} creations and {} updates",
            elapsed_ms, creations, updates
        ),
    };

    TransactionOutcome { report, entries }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::OutcomeRecord;

    fn outcome(operation: EntryOperation) -> EntryOutcome {
        EntryOutcome {
            operation,
            resource_id: None,
            resource: None,
        }
    }

    #[test]
    fn test_deletes_count_as_updates() {
        let composed = compose(
            Duration::from_millis(12),
            vec![
                outcome(EntryOperation::Create),
                outcome(EntryOperation::Delete),
                outcome(EntryOperation::Update),
                outcome(EntryOperation::Noop),
            ],
        );

        assert_eq!(composed.report.creations, 1);
        assert_eq!(composed.report.updates, 2);
        assert_eq!(composed.report.deletions, 1);
        assert_eq!(composed.report.noops, 1);
        assert_eq!(
            composed.report.summary,
            "Transaction completed in 12ms with 1 creations and 2 updates"
        );
    }

    #[test]
    fn test_report_precedes_entries_in_order() {
        let composed = compose(
            Duration::ZERO,
            vec![outcome(EntryOperation::Update), outcome(EntryOperation::Create)],
        );
        let records: Vec<_> = composed.records().collect();

        assert_eq!(composed.record_count(), 3);
        assert!(matches!(records[0], OutcomeRecord::Report(_)));
        assert!(matches!(
            records[2],
            OutcomeRecord::Entry(EntryOutcome {
                operation: EntryOperation::Create,
                ..
            })
        ));
    }
}
