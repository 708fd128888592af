use std::fs;

use bytes::Bytes;
use eda_services::services::{
    eda::{self, AnalysisOptions},
    file_processor::{self, LoadOptions},
    report::{self, ReportOptions},
};

fn sample_analysis(csv: &'static str) -> eda::Analysis {
    let dataset = file_processor::load_csv_bytes(Bytes::from(csv), &LoadOptions::default()).unwrap();
    eda::analyze(&dataset, &AnalysisOptions::default()).unwrap()
}

fn options(dir: &tempfile::TempDir) -> ReportOptions {
    ReportOptions {
        out_dir: dir.path().join("out"),
        title: "Sample report".to_string(),
        source_name: "sample.csv".to_string(),
        top_k: 5,
    }
}

#[test]
fn writes_all_artifacts() {
    let analysis = sample_analysis("age,height,city\n10,140,A\n20,150,B\n30,160,A\n,170,\n");
    let dir = tempfile::tempdir().unwrap();
    let artifacts = report::write_report(&analysis, &options(&dir)).unwrap();

    assert!(artifacts.summary.exists());
    assert!(artifacts.quality.exists());
    assert!(artifacts.missing.as_ref().unwrap().exists());
    assert!(artifacts.correlation.as_ref().unwrap().exists());
    assert_eq!(artifacts.categories.len(), 1);
    assert!(artifacts.categories[0].ends_with("top_categories/city.csv"));

    let summary = fs::read_to_string(&artifacts.summary).unwrap();
    assert!(summary.starts_with("name,dtype,non_null,missing,missing_share"));
    assert_eq!(summary.lines().count(), 4);

    let markdown = fs::read_to_string(&artifacts.markdown).unwrap();
    assert!(markdown.starts_with("# Sample report"));
    assert!(markdown.contains("Source file: `sample.csv`"));
    assert!(markdown.contains("Rows: **4**, columns: **3**"));
    assert!(markdown.contains("Too few rows: **true**"));
    assert!(markdown.contains("| A | 2 |"));

    let quality: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&artifacts.quality).unwrap()).unwrap();
    assert_eq!(quality["too_few_rows"], true);
}

#[test]
fn skips_empty_tables() {
    let analysis = sample_analysis("x\n1\n2\n");
    let dir = tempfile::tempdir().unwrap();
    let artifacts = report::write_report(&analysis, &options(&dir)).unwrap();

    assert!(artifacts.correlation.is_none());
    assert!(artifacts.categories.is_empty());
    // zero missing cells still produce a table; only an empty dataset does not
    assert!(artifacts.missing.is_some());

    let markdown = fs::read_to_string(&artifacts.markdown).unwrap();
    assert!(markdown.contains("Not enough numeric columns for correlation."));
    assert!(markdown.contains("No categorical/text columns found."));
}

#[test]
fn non_ascii_columns_get_separate_category_files() {
    let analysis = sample_analysis("город,страна\nМосква,Россия\nКазань,Россия\nМинск,Беларусь\n");
    let dir = tempfile::tempdir().unwrap();
    let artifacts = report::write_report(&analysis, &options(&dir)).unwrap();

    assert_eq!(artifacts.categories.len(), 2);
    assert_ne!(artifacts.categories[0], artifacts.categories[1]);
    assert!(artifacts.categories[0].ends_with("top_categories/город.csv"));
    assert!(artifacts.categories[1].ends_with("top_categories/страна.csv"));

    let cities = fs::read_to_string(&artifacts.categories[0]).unwrap();
    assert!(cities.contains("Москва"));
    let countries = fs::read_to_string(&artifacts.categories[1]).unwrap();
    assert!(countries.contains("Россия"));
}

#[test]
fn colliding_stems_are_numbered() {
    let analysis = sample_analysis("a/b,a_b\nx,y\nz,w\n");
    let dir = tempfile::tempdir().unwrap();
    let artifacts = report::write_report(&analysis, &options(&dir)).unwrap();

    assert_eq!(artifacts.categories.len(), 2);
    assert!(artifacts.categories[0].ends_with("top_categories/a_b.csv"));
    assert!(artifacts.categories[1].ends_with("top_categories/a_b_1.csv"));
    assert!(artifacts.categories.iter().all(|p| p.exists()));
}

#[test]
fn pipes_in_category_values_are_escaped() {
    let analysis = sample_analysis("tag\na|b\na|b\nc\n");
    let dir = tempfile::tempdir().unwrap();
    let artifacts = report::write_report(&analysis, &options(&dir)).unwrap();

    let markdown = fs::read_to_string(&artifacts.markdown).unwrap();
    assert!(markdown.contains("| a\\|b | 2 |"));
}
