//! Sample statistics used by the fee oracle.
//!
//! Every statistic starts by cropping anomalies: the samples are sorted and the
//! single smallest and single largest value are dropped.

use crate::OracleError;
use alloy_primitives::U256;

/// Reduction applied to a cropped sample set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Statistic {
	Minimum,
	/// Floor of the arithmetic mean.
	Mean,
	/// Middle value; the floor of the mean of the two middle values for even counts.
	Median,
	Maximum,
}

/// Sorts `data` and drops its smallest and largest value.
///
/// Returns `None` for fewer than two samples. Two samples crop to an empty set.
pub fn crop_anomaly_values(data: &[U256]) -> Option<Vec<U256>> {
	if data.len() <= 1 {
		return None;
	}
	let mut sorted = data.to_vec();
	sorted.sort_unstable();
	Some(sorted[1..sorted.len() - 1].to_vec())
}

/// Floor of the arithmetic mean.
pub fn mean(data: &[U256]) -> Option<U256> {
	if data.is_empty() {
		return None;
	}
	let sum = data
		.iter()
		.fold(U256::ZERO, |acc, value| acc.saturating_add(*value));
	Some(sum / U256::from(data.len()))
}

/// Median of `data`, which need not be sorted.
pub fn median(data: &[U256]) -> Option<U256> {
	if data.is_empty() {
		return None;
	}
	let mut sorted = data.to_vec();
	sorted.sort_unstable();
	let middle = sorted.len() / 2;
	if sorted.len() % 2 == 1 {
		return Some(sorted[middle]);
	}
	let (low, high) = (sorted[middle - 1], sorted[middle]);
	// Halve first so the sum cannot overflow
	let two = U256::from(2);
	Some(low / two + high / two + (low % two + high % two) / two)
}

/// Picks the sample at index `floor(len / percentile / 10)` of sorted data.
///
/// The index is clamped to the last sample. Percentiles must be finite and
/// strictly positive.
pub fn percentile(sorted: &[U256], percentile: f64) -> Result<U256, OracleError> {
	if !percentile.is_finite() || percentile <= 0.0 {
		return Err(OracleError::InvalidPercentile(percentile));
	}
	if sorted.is_empty() {
		return Err(OracleError::InsufficientData(0));
	}
	let index = (sorted.len() as f64 / percentile / 10.0).floor() as usize;
	Ok(sorted[index.min(sorted.len() - 1)])
}

/// Crops `data` and samples it at each requested percentile.
pub fn cropped_percentiles(data: &[U256], percentiles: &[f64]) -> Result<Vec<U256>, OracleError> {
	let cropped = crop_anomaly_values(data)
		.filter(|cropped| !cropped.is_empty())
		.ok_or(OracleError::InsufficientData(data.len()))?;
	percentiles
		.iter()
		.map(|p| percentile(&cropped, *p))
		.collect()
}

/// Turns block-major rows into percentile-major columns.
///
/// `rows[block][percentile]` becomes `columns[percentile][block]`. Rows are
/// expected to have equal lengths; shorter rows simply contribute fewer samples.
pub fn transpose(rows: &[Vec<U256>]) -> Vec<Vec<U256>> {
	let width = rows.iter().map(Vec::len).max().unwrap_or(0);
	(0..width)
		.map(|column| rows.iter().filter_map(|row| row.get(column).copied()).collect())
		.collect()
}

/// Reduces each column to the mean of its cropped samples.
pub fn soft(columns: &[Vec<U256>]) -> Result<Vec<U256>, OracleError> {
	columns
		.iter()
		.map(|column| calculate_statistic(column, Statistic::Mean))
		.collect()
}

/// Crops `data` and applies `statistic` to what remains.
pub fn calculate_statistic(data: &[U256], statistic: Statistic) -> Result<U256, OracleError> {
	let cropped = crop_anomaly_values(data).ok_or(OracleError::InsufficientData(data.len()))?;
	let value = match statistic {
		Statistic::Minimum => cropped.iter().min().copied(),
		Statistic::Mean => mean(&cropped),
		Statistic::Median => median(&cropped),
		Statistic::Maximum => cropped.iter().max().copied(),
	};
	value.ok_or(OracleError::InsufficientData(data.len()))
}

#[cfg(test)]
mod tests {
	use super::*;

	fn values(raw: &[u64]) -> Vec<U256> {
		raw.iter().map(|v| U256::from(*v)).collect()
	}

	#[test]
	fn test_crop_drops_exactly_min_and_max() {
		assert_eq!(crop_anomaly_values(&values(&[5, 1, 9, 3])), Some(values(&[3, 5])));
		assert_eq!(crop_anomaly_values(&values(&[1, 1, 1])), Some(values(&[1])));
		assert_eq!(crop_anomaly_values(&values(&[4, 2])), Some(vec![]));
		assert_eq!(crop_anomaly_values(&values(&[4])), None);
		assert_eq!(crop_anomaly_values(&[]), None);
	}

	#[test]
	fn test_mean_floors() {
		assert_eq!(mean(&values(&[1, 2])), Some(U256::from(1)));
		assert_eq!(mean(&values(&[10, 20, 31])), Some(U256::from(20)));
		assert_eq!(mean(&[]), None);
	}

	#[test]
	fn test_median() {
		assert_eq!(median(&values(&[9, 1, 5])), Some(U256::from(5)));
		assert_eq!(median(&values(&[1, 2, 4, 9])), Some(U256::from(3)));
		assert_eq!(median(&values(&[3, 4])), Some(U256::from(3)));
		assert_eq!(median(&[U256::MAX, U256::MAX]), Some(U256::MAX));
		assert_eq!(median(&[]), None);
	}

	#[test]
	fn test_percentile_index_formula() {
		let sorted = values(&(1..=100).collect::<Vec<_>>());
		// floor(100 / 1 / 10) = 10
		assert_eq!(percentile(&sorted, 1.0).unwrap(), U256::from(11));
		// floor(100 / 50 / 10) = 0
		assert_eq!(percentile(&sorted, 50.0).unwrap(), U256::from(1));
		// floor(100 / 0.01 / 10) = 1000, clamped to the last sample
		assert_eq!(percentile(&sorted, 0.01).unwrap(), U256::from(100));
	}

	#[test]
	fn test_percentile_rejects_invalid_input() {
		let sorted = values(&[1, 2, 3]);
		assert!(matches!(
			percentile(&sorted, 0.0),
			Err(OracleError::InvalidPercentile(_))
		));
		assert!(matches!(
			percentile(&sorted, -5.0),
			Err(OracleError::InvalidPercentile(_))
		));
		assert!(matches!(
			percentile(&sorted, f64::NAN),
			Err(OracleError::InvalidPercentile(_))
		));
		assert!(matches!(
			percentile(&[], 50.0),
			Err(OracleError::InsufficientData(0))
		));
	}

	#[test]
	fn test_cropped_percentiles_excludes_outlier() {
		let mut base_fees = vec![U256::from(100); 20];
		base_fees.push(U256::from(1000));

		let suggestions = cropped_percentiles(&base_fees, &[10.0, 50.0, 90.0]).unwrap();
		assert_eq!(suggestions.len(), 3);
		assert_eq!(suggestions.iter().max(), Some(&U256::from(100)));
	}

	#[test]
	fn test_cropped_percentiles_needs_three_samples() {
		assert!(matches!(
			cropped_percentiles(&values(&[1, 2]), &[50.0]),
			Err(OracleError::InsufficientData(2))
		));
		assert!(cropped_percentiles(&values(&[1, 2, 3]), &[50.0]).is_ok());
	}

	#[test]
	fn test_transpose_and_soft() {
		let rows = vec![
			values(&[1, 10]),
			values(&[2, 20]),
			values(&[3, 30]),
			values(&[100, 1000]),
		];
		let columns = transpose(&rows);
		assert_eq!(columns, vec![values(&[1, 2, 3, 100]), values(&[10, 20, 30, 1000])]);

		// [2, 3] -> 2 and [20, 30] -> 25
		assert_eq!(soft(&columns).unwrap(), values(&[2, 25]));
	}

	#[test]
	fn test_soft_on_single_block_is_insufficient() {
		let columns = transpose(&[values(&[7, 8])]);
		assert!(matches!(soft(&columns), Err(OracleError::InsufficientData(1))));
	}

	#[test]
	fn test_statistics_on_cropped_data() {
		let data = values(&[1, 4, 6, 8, 50]);
		assert_eq!(calculate_statistic(&data, Statistic::Minimum).unwrap(), U256::from(4));
		assert_eq!(calculate_statistic(&data, Statistic::Mean).unwrap(), U256::from(6));
		assert_eq!(calculate_statistic(&data, Statistic::Median).unwrap(), U256::from(6));
		assert_eq!(calculate_statistic(&data, Statistic::Maximum).unwrap(), U256::from(8));
		assert!(calculate_statistic(&values(&[1]), Statistic::Mean).is_err());
	}
}
