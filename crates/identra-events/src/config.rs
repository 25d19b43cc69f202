//! Kafka producer configuration.

use crate::error::EventError;

/// Connection settings for the Kafka cluster.
#[derive(Debug, Clone)]
pub struct KafkaConfig {
    /// Comma-separated broker list.
    pub bootstrap_servers: String,
    /// Client identifier reported to the brokers.
    pub client_id: String,
}

impl KafkaConfig {
    /// Read the configuration from the environment.
    ///
    /// `KAFKA_BOOTSTRAP_SERVERS` is required; `KAFKA_CLIENT_ID` defaults
    /// to `identra`.
    pub fn from_env() -> Result<Self, EventError> {
        let bootstrap_servers =
            std::env::var("KAFKA_BOOTSTRAP_SERVERS").map_err(|_| EventError::ConfigMissing {
                var: "KAFKA_BOOTSTRAP_SERVERS".to_string(),
            })?;
        let client_id =
            std::env::var("KAFKA_CLIENT_ID").unwrap_or_else(|_| "identra".to_string());

        Ok(Self {
            bootstrap_servers,
            client_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_construction() {
        let config = KafkaConfig {
            bootstrap_servers: "localhost:9092".to_string(),
            client_id: "test".to_string(),
        };
        assert_eq!(config.bootstrap_servers, "localhost:9092");
    }
}
