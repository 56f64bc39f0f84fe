//! 配送装载量计算 (dispatch loadout)
//!
//! 纯计算模块：批次总重 vs 车辆载重、站点数 vs 车辆站点上限。
//! 查询由 repository 层完成，这里只做算术和判定，方便单测。

use rust_decimal::prelude::*;
use thiserror::Error;

use shared::models::{OrderItem, RunLoadout, Vehicle};

/// Capacity violation
#[derive(Debug, Error, PartialEq)]
pub enum CapacityError {
    #[error("Load {load_kg:.2} kg exceeds vehicle capacity {max_load_kg:.2} kg")]
    OverWeight { load_kg: f64, max_load_kg: f64 },

    #[error("{stops} stops exceed vehicle limit of {max_stops}")]
    TooManyStops { stops: i64, max_stops: i64 },
}

/// Total cargo weight of one order (Σ qty × unit_weight_kg)
pub fn order_weight_kg(items: &[OrderItem]) -> f64 {
    let total: Decimal = items
        .iter()
        .map(|item| {
            Decimal::from(item.qty) * Decimal::from_f64(item.unit_weight_kg).unwrap_or(Decimal::ZERO)
        })
        .sum();
    total
        .round_dp_with_strategy(3, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or(0.0)
}

/// a + b in kg, 3-dp rounded (avoids f64 artifacts at the capacity boundary)
pub fn add_weight_kg(a: f64, b: f64) -> f64 {
    let total = Decimal::from_f64(a).unwrap_or(Decimal::ZERO)
        + Decimal::from_f64(b).unwrap_or(Decimal::ZERO);
    total
        .round_dp_with_strategy(3, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or(0.0)
}

/// Build the loadout summary for a run
pub fn loadout(vehicle: &Vehicle, total_weight_kg: f64, stops: i64) -> RunLoadout {
    RunLoadout {
        total_weight_kg,
        stops,
        max_load_kg: vehicle.max_load_kg,
        max_stops: vehicle.max_stops,
    }
}

/// Reject when the loadout exceeds the vehicle's capacity.
///
/// Checked when an order is assigned and re-checked at dispatch time.
pub fn check_capacity(loadout: &RunLoadout) -> Result<(), CapacityError> {
    if loadout.total_weight_kg > loadout.max_load_kg {
        return Err(CapacityError::OverWeight {
            load_kg: loadout.total_weight_kg,
            max_load_kg: loadout.max_load_kg,
        });
    }
    if loadout.stops > loadout.max_stops {
        return Err(CapacityError::TooManyStops {
            stops: loadout.stops,
            max_stops: loadout.max_stops,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(qty: i64, unit_weight_kg: f64) -> OrderItem {
        OrderItem {
            id: 0,
            order_id: 0,
            product_id: 0,
            name: "test".into(),
            qty,
            unit_price: 0.0,
            unit_weight_kg,
            line_subtotal: 0.0,
            discount: 0.0,
            surcharge: 0.0,
            line_total: 0.0,
        }
    }

    fn truck() -> Vehicle {
        Vehicle {
            id: 1,
            name: "Truck".into(),
            plate_no: "ABC-123".into(),
            max_load_kg: 100.0,
            max_stops: 3,
            is_active: true,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn weight_sums_per_line() {
        let items = vec![item(2, 11.0), item(1, 2.5)];
        assert_eq!(order_weight_kg(&items), 24.5);
    }

    #[test]
    fn weight_ignores_weightless_items() {
        let items = vec![item(10, 0.0)];
        assert_eq!(order_weight_kg(&items), 0.0);
    }

    #[test]
    fn capacity_ok_at_exact_limit() {
        let l = loadout(&truck(), 100.0, 3);
        assert!(check_capacity(&l).is_ok());
    }

    #[test]
    fn capacity_rejects_overweight() {
        let l = loadout(&truck(), 100.01, 1);
        assert_eq!(
            check_capacity(&l),
            Err(CapacityError::OverWeight {
                load_kg: 100.01,
                max_load_kg: 100.0
            })
        );
    }

    #[test]
    fn capacity_rejects_too_many_stops() {
        let l = loadout(&truck(), 10.0, 4);
        assert_eq!(
            check_capacity(&l),
            Err(CapacityError::TooManyStops {
                stops: 4,
                max_stops: 3
            })
        );
    }
}
