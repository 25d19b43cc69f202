//! Group lifecycle events.

use crate::event::Event;
use crate::projection::GroupProjection;
use serde::{Deserialize, Serialize};

/// Published when a group is created or updated, carrying the full
/// current projection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupUpserted {
    pub projection: GroupProjection,
}

impl Event for GroupUpserted {
    const TOPIC: &'static str = "identra.identity.group.upserted";
    const EVENT_TYPE: &'static str = "identra.identity.group.upserted";
}

/// Published when a group is deleted. Carries only the identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupDeleted {
    pub group_id: String,
}

impl Event for GroupDeleted {
    const TOPIC: &'static str = "identra.identity.group.deleted";
    const EVENT_TYPE: &'static str = "identra.identity.group.deleted";
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn upserted_round_trip() {
        let event = GroupUpserted {
            projection: GroupProjection {
                id: "GRP1".to_string(),
                tenant_id: Uuid::new_v4(),
                name: "Auditors".to_string(),
                created_at: Utc::now(),
                updated_at: Utc::now(),
                revision: 2,
                members: vec!["jane.doe".to_string()],
                grants: Vec::new(),
            },
        };

        let json = serde_json::to_string(&event).unwrap();
        let restored: GroupUpserted = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.projection.name, "Auditors");
    }

    #[test]
    fn topics() {
        assert_eq!(GroupUpserted::TOPIC, "identra.identity.group.upserted");
        assert_eq!(GroupDeleted::TOPIC, "identra.identity.group.deleted");
    }
}
