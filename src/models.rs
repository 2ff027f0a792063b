// Defines data structures for API request and response bodies,
// using Serde for JSON serialization and deserialization.

use serde::{Deserialize, Serialize};

// Response body for the GET /json demo endpoint. The values are fixed;
// the endpoint exists to demonstrate JSON serialization.
#[derive(Serialize, Debug)]
pub struct Person {
    pub age: u32,
    pub name: &'static str,
    pub sex: bool,
}

// Query parameters for GET /view.
#[derive(Deserialize, Debug)]
pub struct ViewQuery {
    // Image identifier, i.e. the filename the image was uploaded under.
    pub id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_person_serializes_to_flat_object() {
        let person = Person {
            age: 12,
            name: "Afra",
            sex: true,
        };
        let json = serde_json::to_value(&person).unwrap();
        assert_eq!(json, serde_json::json!({"age": 12, "name": "Afra", "sex": true}));
    }

    #[test]
    fn test_view_query_deserializes_id() {
        let query: ViewQuery =
            serde_json::from_value(serde_json::json!({"id": "photo.png"})).unwrap();
        assert_eq!(query.id, "photo.png");
    }
}
