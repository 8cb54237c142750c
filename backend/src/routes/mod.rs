pub mod cleaning;
pub mod datasets;
pub mod health;
pub mod units;
pub mod visualize;

#[cfg(test)]
mod tests {
    #[test]
    fn test_module_structure() {
        assert_eq!(super::visualize::VISUALIZE_PATH, "/visualize");
        assert_eq!(
            super::visualize::VISUALIZE_SITE_DATA_PATH,
            "/visualize/site-data"
        );
        assert_eq!(super::cleaning::SAVE_CLEANED_DATA_PATH, "/save-cleaned-data");
        assert_eq!(
            super::units::CONVERT_IRRADIANCE_PATH,
            "/units/irradiance/convert"
        );
        assert_eq!(super::datasets::DATASETS_PATH, "/datasets");
        assert_eq!(super::health::HEALTH_PATH, "/health");
    }
}
