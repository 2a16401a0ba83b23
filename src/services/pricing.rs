use crate::models::CourtPricing;
use crate::services::scheduling::slot_hour;

/// Resolves the price of an hour against a court's rate table. The buckets
/// are fixed: 6, 7-15, 16-21, 22, 23. Any other hour prices at zero.
pub fn price_for_hour(hour: u32, pricing: &CourtPricing) -> f64 {
    match hour {
        6 => pricing.six_am,
        7..=15 => pricing.seven_to_fifteen,
        16..=21 => pricing.sixteen_to_twenty_one,
        22 => pricing.twenty_two,
        23 => pricing.twenty_three,
        _ => 0.0,
    }
}

pub fn price_for_slot(time_slot: &str, pricing: &CourtPricing) -> f64 {
    slot_hour(time_slot)
        .map(|hour| price_for_hour(hour, pricing))
        .unwrap_or(0.0)
}
