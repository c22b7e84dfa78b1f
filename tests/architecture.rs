//! Architecture checks
//!
//! Collaborators and caches are shared across tasks, so they must stay
//! thread-safe and object-safe.

#[cfg(test)]
mod architecture_tests {
    use lab_quality::collaborators::{Api60fCorrector, EquipmentSource, RecordStore, VerificationTypeSource};

    #[test]
    fn test_collaborators_are_thread_safe() {
        fn assert_send_sync<T: Send + Sync>() {}

        assert_send_sync::<lab_quality::collaborators::InMemoryRecordStore>();
        assert_send_sync::<lab_quality::collaborators::HttpApi60fCorrector>();
        assert_send_sync::<lab_quality::catalog::VerificationCatalog<lab_quality::collaborators::InMemoryRecordStore>>();
        assert_send_sync::<lab_quality::QualityEvaluator>();
        assert_send_sync::<lab_quality::Equipment>();
    }

    #[test]
    fn test_traits_are_object_safe() {
        fn assert_dyn<T: ?Sized>() {}

        assert_dyn::<dyn EquipmentSource>();
        assert_dyn::<dyn VerificationTypeSource>();
        assert_dyn::<dyn Api60fCorrector>();
        assert_dyn::<dyn RecordStore>();
    }
}
