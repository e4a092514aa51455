use clinic_schedule_core::directory::{DirectoryGateway, HospitalRecord};
use clinic_schedule_core::mock::MockDirectory;
use mockall::predicate;

#[tokio::test]
async fn test_mock_directory_answers_through_trait_object() {
    let mut directory = MockDirectory::new();
    directory
        .expect_resolve_hospital()
        .with(predicate::eq(1), predicate::always())
        .returning(|_, _| {
            Ok(Some(HospitalRecord {
                id: Some(1),
                name: Some("City".to_string()),
                rooms: vec!["101".to_string()],
            }))
        });
    directory
        .expect_resolve_doctor()
        .returning(|_, _| Ok(None));

    let gateway: &dyn DirectoryGateway = &directory;

    let hospital = gateway.resolve_hospital(1, "token").await.unwrap().unwrap();
    assert!(hospital.has_room("101"));
    assert!(gateway.resolve_doctor(9, "token").await.unwrap().is_none());
}
