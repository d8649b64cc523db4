//! game-vault/crates/domains/src/lib.rs
//!
//! Domain models, the error taxonomy and the port traits shared by every
//! other crate in the portal. Nothing in here performs I/O.

pub mod errors;
pub mod models;
pub mod ports;

// Re-exporting for easier access in other crates
pub use errors::*;
pub use models::*;
pub use ports::*;

#[cfg(test)]
mod tests {
    use super::models::*;

    #[test]
    fn test_request_deserializes_from_api_shape() {
        let raw = serde_json::json!({
            "_id": "65f0c1",
            "title": "Hollow Knight",
            "platform": "PC",
            "steamLink": "https://store.steampowered.com/app/367520",
            "status": "pending",
            "votes": 4,
            "voters": [{ "user": "u1" }, { "user": { "_id": "u2" } }],
            "createdAt": "2025-03-01T10:00:00Z"
        });

        let request: GameRequest = serde_json::from_value(raw).unwrap();
        assert_eq!(request.id, "65f0c1");
        assert_eq!(request.status, RequestStatus::Pending);
        assert_eq!(request.platform(), Some(Platform::Pc));
        assert!(request.has_voter("u2"));
        assert!(!request.has_voter("u3"));
    }
}
