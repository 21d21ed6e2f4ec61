use serde::{Deserialize, Serialize};

pub const DEFAULT_SCREEN_COUNT: usize = 20;
pub const DEFAULT_ANALYZE_COUNT: usize = 5;

fn default_screen_count() -> usize {
    DEFAULT_SCREEN_COUNT
}

fn default_analyze_count() -> usize {
    DEFAULT_ANALYZE_COUNT
}

/// Filters for the primary bulk search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchCriteria {
    /// City/state, county, or ZIP.
    pub location: String,
    pub min_price: Option<u64>,
    pub max_price: Option<u64>,
    pub beds_min: Option<u32>,
    pub baths_min: Option<u32>,
    /// How many search results are passed on to the pipeline.
    #[serde(default = "default_screen_count")]
    pub screen_count: usize,
    /// How many of the top results get a property details lookup to fill
    /// in a missing ARV, rent estimate, size or description. 0 disables it.
    #[serde(default = "default_analyze_count")]
    pub analyze_count: usize,
    /// Fetch value history for each listing (one extra call per listing).
    #[serde(default)]
    pub include_trends: bool,
}

impl SearchCriteria {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            min_price: None,
            max_price: None,
            beds_min: None,
            baths_min: None,
            screen_count: DEFAULT_SCREEN_COUNT,
            analyze_count: DEFAULT_ANALYZE_COUNT,
            include_trends: false,
        }
    }

    /// Natural language prompt understood by the search endpoint, e.g.
    /// "3+ bedroom homes for sale in Atlanta, GA under $100,000 with 2+ bathrooms".
    pub fn to_prompt(&self) -> String {
        let mut parts = Vec::new();

        if let Some(beds) = self.beds_min {
            parts.push(format!("{beds}+ bedroom"));
        }

        parts.push("homes for sale in".to_string());
        parts.push(self.location.trim().to_string());

        match (self.min_price, self.max_price) {
            (Some(min), Some(max)) => {
                parts.push(format!("between ${} and ${}", thousands(min), thousands(max)))
            }
            (None, Some(max)) => parts.push(format!("under ${}", thousands(max))),
            (Some(min), None) => parts.push(format!("over ${}", thousands(min))),
            (None, None) => {}
        }

        if let Some(baths) = self.baths_min {
            parts.push(format!("with {baths}+ bathrooms"));
        }

        parts.join(" ")
    }
}

fn thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_includes_all_filters() {
        let criteria = SearchCriteria {
            beds_min: Some(3),
            baths_min: Some(2),
            max_price: Some(100_000),
            ..SearchCriteria::new("Atlanta, GA")
        };
        assert_eq!(
            criteria.to_prompt(),
            "3+ bedroom homes for sale in Atlanta, GA under $100,000 with 2+ bathrooms"
        );
    }

    #[test]
    fn prompt_price_range() {
        let criteria = SearchCriteria {
            min_price: Some(50_000),
            max_price: Some(1_250_000),
            ..SearchCriteria::new("30008")
        };
        assert_eq!(
            criteria.to_prompt(),
            "homes for sale in 30008 between $50,000 and $1,250,000"
        );
    }

    #[test]
    fn screen_count_defaults_when_missing_from_json() {
        let criteria: SearchCriteria =
            serde_json::from_str(r#"{"location":"Georgia","max_price":90000}"#).unwrap();
        assert_eq!(criteria.screen_count, DEFAULT_SCREEN_COUNT);
        assert_eq!(criteria.analyze_count, DEFAULT_ANALYZE_COUNT);
        assert!(!criteria.include_trends);
    }
}
