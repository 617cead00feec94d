use crate::entities::MAX_TRAVEL_SPEED_KMH;

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance on a spherical Earth, in kilometers.
pub fn haversine_distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

/// Minutes needed to cover `distance_km` at the urban speed ceiling.
pub fn minimum_travel_minutes(distance_km: f64) -> f64 {
    minimum_travel_minutes_at(distance_km, MAX_TRAVEL_SPEED_KMH)
}

pub fn minimum_travel_minutes_at(distance_km: f64, max_speed_kmh: f64) -> f64 {
    distance_km / max_speed_kmh * 60.0
}
