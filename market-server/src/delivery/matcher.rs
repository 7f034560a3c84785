//! Delivery matcher
//!
//! Pure candidate scoring: great-circle distance from each active runner's
//! base to the delivery point, fee and ETA estimation, ranking. No state is
//! touched, so the preview is idempotent by construction.

use crate::db::models::ActiveRunner;
use crate::orders::money::{round2, to_decimal, to_f64};
use serde::Serialize;
use std::cmp::Ordering;

/// Mean Earth radius in km (haversine)
const EARTH_RADIUS_KM: f64 = 6371.0;

/// ETA model: 10 minutes of pickup overhead plus 6 minutes per km
const ETA_BASE_MINUTES: i64 = 10;
const ETA_MINUTES_PER_KM: f64 = 6.0;

/// A delivery coordinate
#[derive(Debug, Clone, Copy)]
pub struct DeliveryPoint {
    pub lat: f64,
    pub lng: f64,
}

/// A ranked runner candidate for a delivery
#[derive(Debug, Clone, Serialize)]
pub struct RunnerCandidate {
    pub runner_id: i64,
    pub name: String,
    pub rating: f64,
    pub distance_km: f64,
    pub estimated_fee: f64,
    pub eta_minutes: i64,
}

/// Great-circle distance between two coordinates, in km
pub fn haversine_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

/// Delivery fee: base + distance × per-km rate, never below the minimum
pub fn delivery_fee(distance_km: f64, price_base: f64, price_per_km: f64, min_fee: f64) -> f64 {
    let fee = to_decimal(price_base) + to_decimal(distance_km) * to_decimal(price_per_km);
    to_f64(fee.max(to_decimal(min_fee)))
}

/// Rank active runners against a delivery point
///
/// Runners without a base location are skipped, runners beyond their own
/// service radius are dropped, survivors are sorted by distance ascending
/// with rating descending as the tie-break.
pub fn rank_candidates(runners: &[ActiveRunner], point: DeliveryPoint) -> Vec<RunnerCandidate> {
    let mut candidates: Vec<RunnerCandidate> = runners
        .iter()
        .filter_map(|runner| {
            let (base_lat, base_lng) = match (runner.base_lat, runner.base_lng) {
                (Some(lat), Some(lng)) => (lat, lng),
                _ => return None,
            };

            let distance = haversine_km(base_lat, base_lng, point.lat, point.lng);
            if distance > runner.max_distance_km {
                return None;
            }

            Some(RunnerCandidate {
                runner_id: runner.user_id,
                name: runner.name.clone(),
                rating: runner.rating_avg,
                distance_km: round2(distance),
                estimated_fee: delivery_fee(
                    distance,
                    runner.price_base,
                    runner.price_per_km,
                    runner.min_fee,
                ),
                eta_minutes: (distance * ETA_MINUTES_PER_KM).ceil() as i64 + ETA_BASE_MINUTES,
            })
        })
        .collect();

    candidates.sort_by(|a, b| {
        a.distance_km
            .partial_cmp(&b.distance_km)
            .unwrap_or(Ordering::Equal)
            .then(
                b.rating
                    .partial_cmp(&a.rating)
                    .unwrap_or(Ordering::Equal),
            )
    });

    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runner(
        user_id: i64,
        base: Option<(f64, f64)>,
        rating: f64,
        max_distance_km: f64,
    ) -> ActiveRunner {
        ActiveRunner {
            user_id,
            name: format!("runner-{user_id}"),
            base_lat: base.map(|b| b.0),
            base_lng: base.map(|b| b.1),
            price_base: 1.5,
            price_per_km: 0.4,
            min_fee: 2.0,
            max_distance_km,
            rating_avg: rating,
        }
    }

    // Madrid: Sol → Retiro, roughly 1.66 km apart
    const BASE: (f64, f64) = (40.4168, -3.7038);
    const DELIVERY: DeliveryPoint = DeliveryPoint {
        lat: 40.4065,
        lng: -3.6896,
    };

    #[test]
    fn test_haversine_known_distance() {
        let d = haversine_km(BASE.0, BASE.1, DELIVERY.lat, DELIVERY.lng);
        assert!((1.6..1.72).contains(&d), "unexpected distance {d}");
        // zero distance for identical points
        assert_eq!(haversine_km(BASE.0, BASE.1, BASE.0, BASE.1), 0.0);
    }

    #[test]
    fn test_fee_above_minimum() {
        // 1.5 + 1.66 × 0.4 = 2.16, above the 2.0 floor
        let candidates = rank_candidates(&[runner(1, Some(BASE), 4.5, 10.0)], DELIVERY);
        assert_eq!(candidates.len(), 1);
        let c = &candidates[0];
        assert_eq!(c.distance_km, 1.66);
        assert_eq!(c.estimated_fee, 2.16);
        assert_eq!(c.eta_minutes, 20); // ceil(1.66 × 6) + 10
    }

    #[test]
    fn test_fee_clamped_to_minimum() {
        // 50 m away: 1.5 + ~0.02 < 2.0 → min fee wins
        let near = DeliveryPoint {
            lat: BASE.0 + 0.0004,
            lng: BASE.1,
        };
        let candidates = rank_candidates(&[runner(1, Some(BASE), 4.5, 10.0)], near);
        assert_eq!(candidates[0].estimated_fee, 2.0);
    }

    #[test]
    fn test_out_of_radius_dropped() {
        let candidates = rank_candidates(&[runner(1, Some(BASE), 4.5, 1.0)], DELIVERY);
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_no_location_skipped() {
        let candidates = rank_candidates(&[runner(1, None, 4.5, 10.0)], DELIVERY);
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_sorted_by_distance_then_rating() {
        let far = (40.4400, -3.7300); // a few km out
        let runners = vec![
            runner(1, Some(far), 5.0, 20.0),
            runner(2, Some(BASE), 3.0, 20.0),
            runner(3, Some(BASE), 4.8, 20.0),
        ];
        let candidates = rank_candidates(&runners, DELIVERY);
        assert_eq!(candidates.len(), 3);
        // same distance → higher rating first; farther runner last
        assert_eq!(candidates[0].runner_id, 3);
        assert_eq!(candidates[1].runner_id, 2);
        assert_eq!(candidates[2].runner_id, 1);
    }

    #[test]
    fn test_preview_is_deterministic() {
        let runners = vec![
            runner(1, Some(BASE), 4.5, 10.0),
            runner(2, Some((40.43, -3.70)), 4.9, 10.0),
        ];
        let first = rank_candidates(&runners, DELIVERY);
        let second = rank_candidates(&runners, DELIVERY);
        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.runner_id, b.runner_id);
            assert_eq!(a.distance_km, b.distance_km);
            assert_eq!(a.estimated_fee, b.estimated_fee);
            assert_eq!(a.eta_minutes, b.eta_minutes);
        }
    }
}
