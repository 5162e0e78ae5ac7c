//! Delivery fee schedule

use shared::order::DeliveryTime;
use shared::order::money;
use shared::util::same_text;

/// Flat delivery fees by destination and speed
#[derive(Debug, Clone, PartialEq)]
pub struct FeeSchedule {
    /// City served at the inside-city rate
    pub home_city: String,
    pub inside_city_fee: f64,
    pub outside_city_fee: f64,
    /// Added on top of the base fee for express delivery
    pub express_surcharge: f64,
    /// Subtotal from which delivery is free
    pub free_delivery_threshold: f64,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            home_city: "Dhaka".to_string(),
            inside_city_fee: 60.0,
            outside_city_fee: 120.0,
            express_surcharge: 50.0,
            free_delivery_threshold: 2000.0,
        }
    }
}

impl FeeSchedule {
    /// Deterministic fee for a subtotal, destination city and speed
    pub fn delivery_fee(&self, subtotal: f64, city: &str, delivery_time: DeliveryTime) -> f64 {
        if subtotal >= self.free_delivery_threshold {
            return 0.0;
        }
        let base = if same_text(city, &self.home_city) {
            self.inside_city_fee
        } else {
            self.outside_city_fee
        };
        let surcharge = match delivery_time {
            DeliveryTime::Standard => 0.0,
            DeliveryTime::Express => self.express_surcharge,
        };
        money::round2(base + surcharge)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inside_and_outside_city() {
        let fees = FeeSchedule::default();
        assert_eq!(fees.delivery_fee(1500.0, "Gazipur", DeliveryTime::Standard), 120.0);
        assert_eq!(fees.delivery_fee(1500.0, " dhaka ", DeliveryTime::Standard), 60.0);
        assert_eq!(fees.delivery_fee(1500.0, "Dhaka", DeliveryTime::Express), 110.0);
        assert_eq!(fees.delivery_fee(10.0, "Sylhet", DeliveryTime::Express), 170.0);
    }

    #[test]
    fn test_free_delivery_threshold() {
        let fees = FeeSchedule::default();
        assert_eq!(fees.delivery_fee(2000.0, "Sylhet", DeliveryTime::Express), 0.0);
        assert_eq!(fees.delivery_fee(5000.0, "Dhaka", DeliveryTime::Standard), 0.0);
        assert_eq!(fees.delivery_fee(1999.99, "Dhaka", DeliveryTime::Standard), 60.0);
    }

    #[test]
    fn test_fee_is_deterministic() {
        let fees = FeeSchedule::default();
        let a = fees.delivery_fee(750.5, "Khulna", DeliveryTime::Express);
        let b = fees.delivery_fee(750.5, "Khulna", DeliveryTime::Express);
        assert_eq!(a, b);
    }
}
