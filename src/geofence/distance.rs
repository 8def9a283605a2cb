use crate::models::Coordinates;

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance in kilometres (haversine).
pub fn haversine_km(a: Coordinates, b: Coordinates) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

#[cfg(test)]
mod tests {
    use super::*;

    const ANCHOR: Coordinates = Coordinates {
        latitude: 28.5562,
        longitude: 77.1000,
    };

    #[test]
    fn distance_is_symmetric() {
        let points = [
            Coordinates::new(28.5845, 77.2058),
            Coordinates::new(19.0896, 72.8656),
            Coordinates::new(-33.9399, 151.1753),
            Coordinates::new(0.0, 0.0),
        ];
        for p in points {
            let there = haversine_km(ANCHOR, p);
            let back = haversine_km(p, ANCHOR);
            assert!((there - back).abs() < 1e-9, "{there} vs {back}");
        }
    }

    #[test]
    fn same_point_is_zero() {
        assert_eq!(haversine_km(ANCHOR, ANCHOR), 0.0);
    }

    #[test]
    fn latitude_offset_matches_arc_length() {
        let moved = Coordinates::new(ANCHOR.latitude + 0.018, ANCHOR.longitude);
        let d = haversine_km(ANCHOR, moved);
        // 0.018° of arc on a 6371 km sphere.
        assert!((d - 2.00152).abs() < 1e-4, "{d}");
    }

    #[test]
    fn delhi_to_mumbai_is_about_1150_km() {
        let bom = Coordinates::new(19.0896, 72.8656);
        let d = haversine_km(ANCHOR, bom);
        assert!((1130.0..1160.0).contains(&d), "{d}");
    }
}
