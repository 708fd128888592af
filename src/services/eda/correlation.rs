use super::types::CorrelationMatrix;
use crate::error::AppError;
use crate::services::dataset::Dataset;

/// Pearson correlation between numeric columns using pairwise-complete rows.
///
/// Each pair only drops the rows where one of its two columns is missing;
/// missing cells elsewhere in the table do not matter. Fewer than two
/// numeric columns give an empty matrix.
pub fn correlation_matrix(dataset: &Dataset) -> Result<CorrelationMatrix, AppError> {
    let mut columns = Vec::new();
    let mut data: Vec<Vec<Option<f64>>> = Vec::new();
    for col in dataset.columns() {
        if let Some(values) = col.numeric_values()? {
            columns.push(col.name().to_string());
            data.push(values);
        }
    }

    if columns.len() < 2 {
        tracing::debug!("{} numeric column(s), skipping correlation", columns.len());
        return Ok(CorrelationMatrix::default());
    }

    let n = columns.len();
    let mut values = vec![vec![None; n]; n];
    for i in 0..n {
        values[i][i] = pearson(&data[i], &data[i]).map(|_| 1.0);
        for j in (i + 1)..n {
            let r = pearson(&data[i], &data[j]);
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    Ok(CorrelationMatrix { columns, values })
}

fn pearson(x: &[Option<f64>], y: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y)
        .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
        .collect();
    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (a, b) in &pairs {
        let dx = a - mean_x;
        let dy = b - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let denom = (var_x * var_y).sqrt();
    if denom == 0.0 || !denom.is_finite() {
        return None;
    }
    Some((cov / denom).clamp(-1.0, 1.0))
}
