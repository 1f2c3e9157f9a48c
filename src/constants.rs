pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000/api";
pub const DEFAULT_OVERPASS_URL: &str = "https://overpass-api.de/api/interpreter";
pub const DEFAULT_CASES_URL: &str = "http://localhost:3000/dengue_cases.csv";
pub const CASES_FILE_NAME: &str = "dengue_cases.csv";

pub const DEFAULT_SEARCH_RADIUS_M: u32 = 5000;
pub const DEFAULT_HOSPITAL_LIMIT: usize = 5;
pub const HTTP_TIMEOUT_SECS: u64 = 30;

/// Offered when the alert service cannot list its locations.
pub const FALLBACK_LOCATIONS: [&str; 5] = ["Bangalore", "Mumbai", "Delhi", "Chennai", "Kolkata"];
