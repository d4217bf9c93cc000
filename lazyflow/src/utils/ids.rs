//! Pipeline identifiers.

use uuid::Uuid;

/// Generates a time-ordered pipeline id (UUID v7).
///
/// Forks get fresh ids, so sorting ids of one family recovers the order
/// in which the pipelines were created.
#[must_use]
pub fn generate_pipeline_id() -> Uuid {
    Uuid::now_v7()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_id_is_v7() {
        assert_eq!(generate_pipeline_id().get_version_num(), 7);
    }

    #[test]
    fn test_pipeline_ids_are_unique() {
        assert_ne!(generate_pipeline_id(), generate_pipeline_id());
    }
}
