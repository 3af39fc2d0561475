//! Canned topic-structure suggestions.
//!
//! The real generator is an external service.  For development and tests the
//! mock peer answers from this small catalogue instead: the request text is
//! matched (case-insensitively) against a few keywords and the corresponding
//! hand-written suggestion is returned.
//!
//! | Keyword       | Topic                          | Partitions | RF |
//! |---------------|--------------------------------|------------|----|
//! | `sensor`      | `sensor.data.raw`              | 12         | 3  |
//! | `transaction` | `finance.transactions.incoming`| 32         | 3  |
//! | (anything)    | `default.application.events`   | 3          | 2  |

use std::collections::BTreeMap;

use thiserror::Error;

use super::topics::{Explained, TopicStructure, TopicSuggestion};

/// Errors returned by [`suggest_structure`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    /// The request text was empty or whitespace only.
    #[error("Empty request")]
    EmptyRequest,
}

const WEEK_MS: &str = "604800000";
const THIRTY_DAYS_MS: &str = "2592000000";

/// Picks a suggestion for the free-text `text`.
///
/// `sensor` is checked before `transaction`, so a description mentioning both
/// gets the sensor layout.
pub fn suggest_structure(text: &str) -> Result<TopicStructure, CatalogError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(CatalogError::EmptyRequest);
    }

    let lowered = trimmed.to_lowercase();
    let topic = if lowered.contains("sensor") {
        sensor_topic()
    } else if lowered.contains("transaction") {
        transaction_topic()
    } else {
        default_topic()
    };

    Ok(TopicStructure {
        topics: vec![topic],
    })
}

fn configs(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn sensor_topic() -> TopicSuggestion {
    TopicSuggestion {
        name: Explained::new(
            "sensor.data.raw".to_string(),
            "Topic name follows the pattern: source.dataType.state for clear organization",
        ),
        partitions: Explained::new(
            12,
            "High partitioning (12) for sensor data ensures scalability and throughput for potentially millions of sensor events per minute",
        ),
        replication_factor: Explained::new(
            3,
            "Replication factor of 3 provides high availability and fault tolerance for critical sensor data",
        ),
        configs: configs(&[
            ("retention.ms", WEEK_MS),
            ("cleanup.policy", "delete"),
            ("min.insync.replicas", "2"),
            ("compression.type", "lz4"),
        ]),
    }
}

fn transaction_topic() -> TopicSuggestion {
    TopicSuggestion {
        name: Explained::new(
            "finance.transactions.incoming".to_string(),
            "Domain-based naming for financial transaction data",
        ),
        partitions: Explained::new(
            32,
            "High partition count (32) enables parallel processing of high-volume financial transactions",
        ),
        replication_factor: Explained::new(
            3,
            "Triple replication ensures financial data is never lost even with multiple broker failures",
        ),
        configs: configs(&[
            ("retention.ms", THIRTY_DAYS_MS),
            ("cleanup.policy", "compact"),
            ("min.insync.replicas", "2"),
            ("unclean.leader.election.enable", "false"),
        ]),
    }
}

fn default_topic() -> TopicSuggestion {
    TopicSuggestion {
        name: Explained::new(
            "default.application.events".to_string(),
            "Generic topic name for application events",
        ),
        partitions: Explained::new(
            3,
            "Standard partition count (3) provides a balance of parallelism and resource usage",
        ),
        replication_factor: Explained::new(
            2,
            "Replication factor of 2 provides fault tolerance while conserving storage",
        ),
        configs: configs(&[("retention.ms", WEEK_MS), ("cleanup.policy", "delete")]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_request_is_rejected() {
        assert_eq!(suggest_structure(""), Err(CatalogError::EmptyRequest));
        assert_eq!(suggest_structure("   \n\t"), Err(CatalogError::EmptyRequest));
    }

    #[test]
    fn test_empty_request_message_matches_peer_error_text() {
        assert_eq!(CatalogError::EmptyRequest.to_string(), "Empty request");
    }

    #[test]
    fn test_sensor_keyword_is_case_insensitive() {
        let s = suggest_structure("Stream of SENSOR readings from factories").unwrap();

        let topic = &s.topics[0];
        assert_eq!(topic.name.value, "sensor.data.raw");
        assert_eq!(topic.partitions.value, 12);
        assert_eq!(topic.replication_factor.value, 3);
        assert_eq!(topic.configs["compression.type"], "lz4");
    }

    #[test]
    fn test_transaction_keyword_selects_compacted_finance_topic() {
        let s = suggest_structure("card transaction events").unwrap();

        let topic = &s.topics[0];
        assert_eq!(topic.name.value, "finance.transactions.incoming");
        assert_eq!(topic.partitions.value, 32);
        assert_eq!(topic.configs["cleanup.policy"], "compact");
        assert_eq!(topic.configs["unclean.leader.election.enable"], "false");
    }

    #[test]
    fn test_sensor_wins_over_transaction() {
        let s = suggest_structure("sensor transaction").unwrap();
        assert_eq!(s.topics[0].name.value, "sensor.data.raw");
    }

    #[test]
    fn test_unmatched_text_gets_default_topic() {
        let s = suggest_structure("user clicks").unwrap();

        let topic = &s.topics[0];
        assert_eq!(topic.name.value, "default.application.events");
        assert_eq!(topic.partitions.value, 3);
        assert_eq!(topic.replication_factor.value, 2);
        assert_eq!(topic.configs.len(), 2);
    }
}
