use async_trait::async_trait;
use mockall::mock;

use crate::directory::{DirectoryGateway, DoctorRecord, HospitalRecord, TokenInfo};
use crate::errors::ScheduleResult;

// Mock directory gateway for testing
mock! {
    pub Directory {}

    #[async_trait]
    impl DirectoryGateway for Directory {
        async fn resolve_doctor(
            &self,
            doctor_id: i64,
            token: &str,
        ) -> ScheduleResult<Option<DoctorRecord>>;

        async fn resolve_hospital(
            &self,
            hospital_id: i64,
            token: &str,
        ) -> ScheduleResult<Option<HospitalRecord>>;

        async fn introspect_token(&self, token: &str) -> ScheduleResult<Option<TokenInfo>>;
    }
}
