/// A WGS84 coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Option<Self> {
        ((-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng))
            .then_some(Self { lat, lng })
    }

    /// Well-known text, longitude first.
    pub fn to_wkt(self) -> String {
        format!("POINT({} {})", self.lng, self.lat)
    }

    /// Parse `POINT(<lng> <lat>)` as stored in the database.
    pub fn from_wkt(wkt: &str) -> Option<Self> {
        let inner = wkt
            .trim()
            .strip_prefix("POINT(")
            .or_else(|| wkt.trim().strip_prefix("POINT ("))?
            .strip_suffix(')')?;
        let mut parts = inner.split_whitespace();
        let lng = parts.next()?.parse().ok()?;
        let lat = parts.next()?.parse().ok()?;
        if parts.next().is_some() {
            return None;
        }
        Self::new(lat, lng)
    }
}

/// Parse user input into a point.
///
/// Accepts `"lat,lng"`, `"lat: x, lng: y"`, `"latitude: x, longitude: y"`
/// and WKT. Out-of-range coordinates are rejected.
pub fn parse_location(input: &str) -> Option<GeoPoint> {
    let input = input.trim();
    if input.to_ascii_uppercase().starts_with("POINT") {
        return GeoPoint::from_wkt(&input.to_ascii_uppercase());
    }

    let mut numbers = input
        .split(',')
        .map(|part| strip_label(part.trim()))
        .map(|part| part.parse::<f64>());
    let lat = numbers.next()?.ok()?;
    let lng = numbers.next()?.ok()?;
    if numbers.next().is_some() {
        return None;
    }
    GeoPoint::new(lat, lng)
}

fn strip_label(part: &str) -> &str {
    match part.split_once(':') {
        Some((label, value))
            if matches!(
                label.trim().to_ascii_lowercase().as_str(),
                "lat" | "lng" | "latitude" | "longitude"
            ) =>
        {
            value.trim()
        }
        _ => part,
    }
}
