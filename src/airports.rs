//! Airports the app knows about, used to pick the user's home airport at
//! registration and as destination choices in the survey.

use serde::Serialize;

use crate::{geofence::haversine_km, models::Coordinates};

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Airport {
    pub code: &'static str,
    pub name: &'static str,
    pub latitude: f64,
    pub longitude: f64,
}

impl Airport {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}

/// Registration candidates, with coordinates.
pub const REGISTRATION_AIRPORTS: [Airport; 2] = [
    Airport {
        code: "DEL",
        name: "Indira Gandhi International Airport",
        latitude: 28.5562,
        longitude: 77.1,
    },
    Airport {
        code: "BOM",
        name: "Chhatrapati Shivaji Maharaj International Airport",
        latitude: 28.5845,
        longitude: 77.2058,
    },
];

/// Destination choices offered on the survey form, as (code, display name).
pub const DESTINATIONS: [(&str, &str); 29] = [
    ("AMD", "Ahmedabad – Sardar Vallabhbhai Patel International Airport"),
    ("ATQ", "Amritsar – Sri Guru Ram Dass Jee International Airport"),
    ("BLR", "Bengaluru – Kempegowda International Airport"),
    ("BHO", "Bhopal – Raja Bhoj Airport"),
    ("BBI", "Bhubaneswar – Biju Patnaik International Airport"),
    ("IXC", "Chandigarh International Airport"),
    ("MAA", "Chennai International Airport"),
    ("COK", "Cochin International Airport"),
    ("CJB", "Coimbatore International Airport"),
    ("DEL", "Delhi – Indira Gandhi International Airport"),
    ("GOI", "Goa – Dabolim Airport"),
    ("GAU", "Guwahati – Lokpriya Gopinath Bordoloi International Airport"),
    ("HYD", "Hyderabad – Rajiv Gandhi International Airport"),
    ("JAI", "Jaipur International Airport"),
    ("CCU", "Kolkata – Netaji Subhas Chandra Bose International Airport"),
    ("LKO", "Lucknow – Chaudhary Charan Singh International Airport"),
    ("BOM", "Mumbai – Chhatrapati Shivaji Maharaj International Airport"),
    ("NAG", "Nagpur – Dr. Babasaheb Ambedkar International Airport"),
    ("PAT", "Patna – Jay Prakash Narayan Airport"),
    ("PNQ", "Pune International Airport"),
    ("RPR", "Raipur – Swami Vivekananda Airport"),
    ("IXR", "Ranchi – Birsa Munda Airport"),
    ("SXR", "Srinagar International Airport"),
    ("TRV", "Thiruvananthapuram International Airport"),
    ("TRZ", "Tiruchirappalli International Airport"),
    ("UDR", "Udaipur – Maharana Pratap Airport"),
    ("VNS", "Varanasi – Lal Bahadur Shastri International Airport"),
    ("VGA", "Vijayawada International Airport"),
    ("VTZ", "Visakhapatnam International Airport"),
];

/// Closest registration airport to `position`. Ties keep the earlier entry.
pub fn nearest_airport(position: Coordinates) -> &'static Airport {
    let mut nearest = &REGISTRATION_AIRPORTS[0];
    let mut shortest = haversine_km(position, nearest.coordinates());
    for airport in &REGISTRATION_AIRPORTS[1..] {
        let d = haversine_km(position, airport.coordinates());
        if d < shortest {
            shortest = d;
            nearest = airport;
        }
    }
    nearest
}

pub fn find_airport(code: &str) -> Option<&'static Airport> {
    REGISTRATION_AIRPORTS.iter().find(|a| a.code == code)
}

/// Destinations sorted by display name, as the form lists them.
pub fn sorted_destinations() -> Vec<(&'static str, &'static str)> {
    let mut list = DESTINATIONS.to_vec();
    list.sort_by(|a, b| a.1.cmp(b.1));
    list
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_the_closest_airport() {
        assert_eq!(nearest_airport(Coordinates::new(28.56, 77.10)).code, "DEL");
        assert_eq!(nearest_airport(Coordinates::new(28.58, 77.21)).code, "BOM");
    }

    #[test]
    fn lookup_by_code() {
        assert_eq!(
            find_airport("DEL").map(|a| a.name),
            Some("Indira Gandhi International Airport")
        );
        assert!(find_airport("XXX").is_none());
    }

    #[test]
    fn destinations_are_sorted_by_name() {
        let list = sorted_destinations();
        assert_eq!(list.len(), DESTINATIONS.len());
        assert!(list.windows(2).all(|w| w[0].1 <= w[1].1));
    }
}
