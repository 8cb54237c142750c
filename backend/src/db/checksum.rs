//! Checksum calculation for dataset deduplication.

use sha2::{Digest, Sha256};

use crate::error::CleaningResult;
use crate::models::Dataset;
use crate::parsing::dataset_to_csv;

/// Calculate SHA-256 checksum of string content as lowercase hex.
pub fn calculate_checksum(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    hex::encode(result)
}

/// Checksum of a dataset under a file name.
///
/// Hashes the canonical CSV rendering, so a CSV upload and a JSON upload of
/// the same records produce the same checksum.
pub fn dataset_checksum(file_name: &str, dataset: &Dataset) -> CleaningResult<String> {
    let csv = dataset_to_csv(dataset)?;
    Ok(calculate_checksum(&format!("{}\n{}", file_name, csv)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Record;
    use chrono::NaiveDate;

    fn dataset(gi: f64) -> Dataset {
        let ts = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        Dataset::new(Vec::new(), vec![Record::new(ts, gi, 20.0, 3.0)])
    }

    #[test]
    fn test_checksum_consistency() {
        let content = "timestamp,GI,TM,EAC";
        assert_eq!(calculate_checksum(content), calculate_checksum(content));
        assert_eq!(calculate_checksum(content).len(), 64);
    }

    #[test]
    fn test_dataset_checksum_depends_on_name_and_data() {
        let a = dataset_checksum("a.csv", &dataset(1.0)).unwrap();
        let b = dataset_checksum("b.csv", &dataset(1.0)).unwrap();
        let c = dataset_checksum("a.csv", &dataset(2.0)).unwrap();
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_eq!(a, dataset_checksum("a.csv", &dataset(1.0)).unwrap());
    }
}
