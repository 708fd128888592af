use super::types::{MissingEntry, MissingTable};
use crate::services::dataset::Dataset;

/// Missing counts per column, highest share first.
///
/// A dataset without rows yields an empty table rather than a table of
/// zeros: there is nothing to assess.
pub fn missing_table(dataset: &Dataset) -> MissingTable {
    let row_count = dataset.row_count();
    if row_count == 0 {
        return MissingTable::default();
    }

    let mut entries: Vec<MissingEntry> = dataset
        .columns()
        .map(|col| {
            let missing_count = col.missing_count();
            MissingEntry {
                column: col.name().to_string(),
                missing_count,
                missing_share: missing_count as f64 / row_count as f64,
            }
        })
        .collect();

    // sort_by is stable, so equal shares keep column order
    entries.sort_by(|a, b| b.missing_share.total_cmp(&a.missing_share));

    MissingTable { entries }
}
