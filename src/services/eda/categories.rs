use std::collections::HashMap;

use super::types::*;
use crate::error::AppError;
use crate::services::dataset::{ColumnView, Dataset};

/// Top-`top_k` value frequencies for the first `max_columns` text columns.
///
/// `share` is relative to the rows kept in the table, so each table sums to
/// one. Columns without any non-missing value are left out.
pub fn top_categories(
    dataset: &Dataset,
    max_columns: usize,
    top_k: usize,
) -> Result<CategoryTables, AppError> {
    let mut tables = Vec::new();

    let candidates = dataset
        .columns()
        .filter(|col| col.kind() == ColumnKind::Text)
        .take(max_columns);

    for col in candidates {
        match rank_column(&col, top_k)? {
            Some(table) => tables.push(table),
            None => tracing::debug!("Column {} has no values, skipping", col.name()),
        }
    }

    Ok(CategoryTables { tables })
}

fn rank_column(col: &ColumnView<'_>, top_k: usize) -> Result<Option<CategoryTable>, AppError> {
    // value -> (count, first row seen)
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
    for (idx, value) in col.text_values()?.into_iter().enumerate() {
        if let Some(value) = value {
            counts.entry(value).or_insert((0, idx)).0 += 1;
        }
    }
    if counts.is_empty() || top_k == 0 {
        return Ok(None);
    }

    let mut ranked: Vec<(String, usize, usize)> = counts
        .into_iter()
        .map(|(value, (count, first))| (value, count, first))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
    ranked.truncate(top_k);

    let kept: usize = ranked.iter().map(|r| r.1).sum();
    let rows = ranked
        .into_iter()
        .map(|(value, count, _)| CategoryRow {
            value,
            count,
            share: count as f64 / kept as f64,
        })
        .collect();

    Ok(Some(CategoryTable {
        column: col.name().to_string(),
        rows,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    fn sample() -> Dataset {
        df!(
            "age" => &[Some(10i64), Some(20), Some(30), None],
            "height" => &[140i64, 150, 160, 170],
            "city" => &[Some("A"), Some("B"), Some("A"), None],
        )
        .unwrap()
        .into()
    }

    #[test]
    fn ranks_city_values() {
        let tables = top_categories(&sample(), 5, 2).unwrap();
        assert_eq!(tables.len(), 1);
        assert!(tables.contains("city"));
        assert!(!tables.contains("age"));

        let city = tables.get("city").unwrap();
        assert!(city.rows.len() <= 2);
        assert_eq!(city.rows[0].value, "A");
        assert_eq!(city.rows[0].count, 2);
        assert!((city.rows[0].share - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(city.rows[1].value, "B");
        assert_eq!(city.rows[1].count, 1);
        assert!((city.rows[1].share - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn shares_are_relative_to_kept_rows() {
        let df = df!("v" => &["a", "a", "a", "b", "b", "c", "d"]).unwrap();
        let tables = top_categories(&df.into(), 5, 2).unwrap();
        let v = tables.get("v").unwrap();
        assert_eq!(v.rows.len(), 2);
        let total: f64 = v.rows.iter().map(|r| r.share).sum();
        assert!((total - 1.0).abs() < 1e-12);
        assert!((v.rows[0].share - 0.6).abs() < 1e-12);
    }

    #[test]
    fn ties_keep_first_seen_order() {
        let df = df!("v" => &["z", "y", "x", "y", "z", "x"]).unwrap();
        let tables = top_categories(&df.into(), 5, 5).unwrap();
        let values: Vec<_> = tables.get("v").unwrap().rows.iter().map(|r| r.value.as_str()).collect();
        assert_eq!(values, vec!["z", "y", "x"]);
    }

    #[test]
    fn caps_number_of_columns() {
        let df = df!(
            "a" => &["x", "y"],
            "n" => &[1i64, 2],
            "b" => &["x", "y"],
            "c" => &["x", "y"],
        )
        .unwrap();
        let tables = top_categories(&df.into(), 2, 5).unwrap();
        let names: Vec<_> = tables.iter().map(|t| t.column.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn all_missing_columns_are_omitted() {
        let df = df!(
            "empty" => &[None::<&str>, None],
            "full" => &[Some("x"), Some("x")],
        )
        .unwrap();
        let tables = top_categories(&df.into(), 5, 5).unwrap();
        assert!(!tables.contains("empty"));
        assert_eq!(tables.get("full").unwrap().rows[0].share, 1.0);
    }
}
