use std::io::Write;

use eda_services::services::{
    eda::{self, AnalysisOptions, Stat},
    file_processor::{self, LoadOptions},
};

fn write_csv(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn sample_csv_end_to_end() {
    let file = write_csv("age,height,city\n10,140,A\n20,150,B\n30,160,A\n,170,\n");
    let dataset = file_processor::load_path(file.path(), &LoadOptions::default()).unwrap();
    let options = AnalysisOptions {
        top_k: 2,
        ..AnalysisOptions::default()
    };
    let analysis = eda::analyze(&dataset, &options).unwrap();

    assert_eq!(analysis.summary.row_count, 4);
    assert_eq!(analysis.summary.column_count, 3);

    let age = analysis.summary.column("age").unwrap();
    assert_eq!(age.missing, 1);
    assert!((age.missing_share - 0.25).abs() < 1e-12);
    assert_eq!(age.mean, Stat::Present(20.0));

    let city = analysis.categories.get("city").unwrap();
    assert_eq!(city.rows.len(), 2);
    assert_eq!((city.rows[0].value.as_str(), city.rows[0].count), ("A", 2));
    assert_eq!((city.rows[1].value.as_str(), city.rows[1].count), ("B", 1));

    assert_eq!(analysis.missing.entries[0].missing_share, 0.25);
    assert!((0.0..=1.0).contains(&analysis.quality.quality_score));
}

#[test]
fn every_column_accounts_for_every_row() {
    let file = write_csv("a,b,c\n1,,x\n,2,\n3,3,y\n,,\n5,5,z\n");
    let dataset = file_processor::load_path(file.path(), &LoadOptions::default()).unwrap();
    let analysis = eda::analyze(&dataset, &AnalysisOptions::default()).unwrap();

    let rows = analysis.summary.row_count;
    for col in &analysis.summary.columns {
        assert_eq!(col.non_null + col.missing, rows);
        assert!((col.missing_share - col.missing as f64 / rows as f64).abs() < 1e-12);
    }
    for pair in analysis.missing.entries.windows(2) {
        assert!(pair[0].missing_share >= pair[1].missing_share);
    }
    for table in analysis.categories.iter() {
        let total: f64 = table.rows.iter().map(|r| r.share).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }
}

#[test]
fn max_rows_limits_the_analysis() {
    let mut csv = String::from("n,label\n");
    for i in 0..50 {
        csv.push_str(&format!("{},l{}\n", i, i % 3));
    }
    let file = write_csv(&csv);
    let options = LoadOptions::default().with_max_rows(10);
    let dataset = file_processor::load_path(file.path(), &options).unwrap();
    let analysis = eda::analyze(&dataset, &AnalysisOptions::default()).unwrap();
    assert_eq!(analysis.summary.row_count, 10);
    assert!(analysis.quality.too_few_rows);
}

#[test]
fn header_only_file_is_empty_not_an_error() {
    let file = write_csv("a,b\n");
    let dataset = file_processor::load_path(file.path(), &LoadOptions::default()).unwrap();
    let analysis = eda::analyze(&dataset, &AnalysisOptions::default()).unwrap();

    assert_eq!(analysis.summary.row_count, 0);
    assert!(analysis.missing.is_empty());
    assert_eq!(analysis.quality.max_missing_share, 0.0);
    for col in &analysis.summary.columns {
        assert_eq!(col.missing_share, 0.0);
    }
}
