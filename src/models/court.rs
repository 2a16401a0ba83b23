use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Court {
    pub id: String,
    pub name: String,
    pub color: String,
    pub is_original: bool,
    pub pricing: CourtPricing,
}

/// Rate table over the five fixed hour buckets. Extending coverage to new
/// hours means extending this enumeration, not adding data rows.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CourtPricing {
    #[serde(default)]
    pub six_am: f64,
    #[serde(default)]
    pub seven_to_fifteen: f64,
    #[serde(default)]
    pub sixteen_to_twenty_one: f64,
    #[serde(default)]
    pub twenty_two: f64,
    #[serde(default)]
    pub twenty_three: f64,
}

impl CourtPricing {
    /// Prices are clamped to >= 0 at write time.
    pub fn clamped(self) -> Self {
        Self {
            six_am: self.six_am.max(0.0),
            seven_to_fifteen: self.seven_to_fifteen.max(0.0),
            sixteen_to_twenty_one: self.sixteen_to_twenty_one.max(0.0),
            twenty_two: self.twenty_two.max(0.0),
            twenty_three: self.twenty_three.max(0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamping_zeroes_negative_prices() {
        let pricing = CourtPricing {
            six_am: -5.0,
            seven_to_fifteen: 150.0,
            sixteen_to_twenty_one: -0.01,
            twenty_two: 0.0,
            twenty_three: 80.0,
        }
        .clamped();

        assert_eq!(pricing.six_am, 0.0);
        assert_eq!(pricing.seven_to_fifteen, 150.0);
        assert_eq!(pricing.sixteen_to_twenty_one, 0.0);
        assert_eq!(pricing.twenty_three, 80.0);
    }
}
