use crate::core::context::ServiceContext;
use crate::domain::model::{DataTable, SqlParam, SqlType};
use crate::utils::error::Result;
use crate::utils::validation::{require_id, require_text};

/// 下拉選單用的參考資料
pub struct ReferenceService {
    ctx: ServiceContext,
}

impl ReferenceService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    pub async fn get_reference_list(&self, category: &str) -> Result<DataTable> {
        require_text("category", category)?;
        let mut table = self
            .ctx
            .get_data_table(
                "prc_ReferenceListGet",
                vec![SqlParam::input("@Category", category.trim())],
            )
            .await?;
        table.name = category.trim().to_string();
        Ok(table)
    }

    /// county_code 空白時不限縣市
    pub async fn get_providers(&self, service_code: &str, county_code: Option<&str>) -> Result<DataTable> {
        require_text("service_code", service_code)?;
        let county = county_code.map(str::trim).filter(|c| !c.is_empty());
        self.ctx
            .get_data_table(
                "prc_ReferenceProviderGet",
                vec![
                    SqlParam::input("@ServiceCode", service_code.trim()),
                    SqlParam::input("@CountyCode", county),
                ],
            )
            .await
    }

    pub async fn get_workers(&self, office_id: i64, active_only: bool) -> Result<DataTable> {
        require_id("office_id", office_id)?;
        self.ctx
            .get_data_table(
                "prc_ReferenceWorkerGet",
                vec![
                    SqlParam::input("@OfficeId", office_id),
                    SqlParam::input("@ActiveOnly", active_only),
                ],
            )
            .await
    }

    pub async fn get_reference_value(&self, category: &str, key: &str) -> Result<Option<String>> {
        require_text("category", category)?;
        require_text("key", key)?;
        let output = self
            .ctx
            .execute_non_query(
                "prc_ReferenceValueGet",
                vec![
                    SqlParam::input("@Category", category.trim()),
                    SqlParam::input("@Key", key.trim()),
                    SqlParam::output("@Value", SqlType::NVarChar(Some(255))),
                ],
            )
            .await?;
        Ok(output.text("@Value"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_support::*;
    use crate::domain::model::{ProcedureOutput, SqlValue};
    use crate::domain::ports::MockDataAccess;
    use crate::utils::error::CaseError;

    #[tokio::test]
    async fn test_reference_list_is_named_by_category() {
        let mut data = MockDataAccess::new();
        data.expect_get_data_table()
            .withf(|procedure, params| {
                procedure == "prc_ReferenceListGet" && has(params, "@Category", "LivingArrangement")
            })
            .times(1)
            .returning(|_, _| {
                Ok(DataTable::new("", vec!["Code".into(), "Description".into()])
                    .with_row(vec!["01".into(), "Own home".into()]))
            });

        let service = ReferenceService::new(context(data, no_exceptions()));
        let table = service.get_reference_list(" LivingArrangement ").await.unwrap();
        assert_eq!(table.name, "LivingArrangement");
        assert_eq!(table.len(), 1);
    }

    #[tokio::test]
    async fn test_reference_list_db_error() {
        let mut data = MockDataAccess::new();
        data.expect_get_data_table()
            .times(1)
            .returning(|p, _| Err(db_error(p)));

        let service = ReferenceService::new(context(data, expect_web_exception_once()));
        assert!(service.get_reference_list("LivingArrangement").await.is_err());
    }

    #[tokio::test]
    async fn test_providers_blank_county_is_null() {
        let mut data = MockDataAccess::new();
        data.expect_get_data_table()
            .withf(|procedure, params| {
                procedure == "prc_ReferenceProviderGet"
                    && has(params, "@ServiceCode", "HMK")
                    && has(params, "@CountyCode", SqlValue::Null)
            })
            .times(1)
            .returning(|_, _| Ok(DataTable::default()));

        let service = ReferenceService::new(context(data, no_exceptions()));
        assert!(service.get_providers("HMK", Some("  ")).await.is_ok());
    }

    #[tokio::test]
    async fn test_providers_db_error() {
        let mut data = MockDataAccess::new();
        data.expect_get_data_table()
            .times(1)
            .returning(|p, _| Err(db_error(p)));

        let service = ReferenceService::new(context(data, expect_web_exception_once()));
        assert!(service.get_providers("HMK", Some("027")).await.is_err());
    }

    #[tokio::test]
    async fn test_workers() {
        let mut data = MockDataAccess::new();
        data.expect_get_data_table()
            .withf(|procedure, params| {
                procedure == "prc_ReferenceWorkerGet"
                    && has(params, "@OfficeId", 12i64)
                    && has(params, "@ActiveOnly", true)
            })
            .times(1)
            .returning(|_, _| Ok(DataTable::default()));

        let service = ReferenceService::new(context(data, no_exceptions()));
        assert!(service.get_workers(12, true).await.is_ok());
    }

    #[tokio::test]
    async fn test_workers_db_error() {
        let mut data = MockDataAccess::new();
        data.expect_get_data_table()
            .times(1)
            .returning(|p, _| Err(db_error(p)));

        let service = ReferenceService::new(context(data, expect_web_exception_once()));
        assert!(service.get_workers(12, false).await.is_err());
    }

    #[tokio::test]
    async fn test_reference_value() {
        let mut data = MockDataAccess::new();
        data.expect_execute_non_query()
            .withf(|procedure, params| {
                procedure == "prc_ReferenceValueGet" && has(params, "@Key", "MaxUnits")
            })
            .times(1)
            .returning(|_, _| Ok(ProcedureOutput::default().with_output("@Value", "480")));

        let service = ReferenceService::new(context(data, no_exceptions()));
        assert_eq!(
            service.get_reference_value("Limits", "MaxUnits").await.unwrap(),
            Some("480".to_string())
        );
    }

    #[tokio::test]
    async fn test_reference_value_missing() {
        let mut data = MockDataAccess::new();
        data.expect_execute_non_query()
            .times(1)
            .returning(|_, _| Ok(ProcedureOutput::default().with_output("@Value", SqlValue::Null)));

        let service = ReferenceService::new(context(data, no_exceptions()));
        assert!(service.get_reference_value("Limits", "Unknown").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_reference_value_db_error() {
        let mut data = MockDataAccess::new();
        data.expect_execute_non_query()
            .times(1)
            .returning(|p, _| Err(db_error(p)));

        let service = ReferenceService::new(context(data, expect_web_exception_once()));
        assert!(service.get_reference_value("Limits", "MaxUnits").await.is_err());
    }

    #[tokio::test]
    async fn test_reference_value_requires_key() {
        let service = ReferenceService::new(context(MockDataAccess::new(), no_exceptions()));
        assert!(matches!(
            service.get_reference_value("Limits", " ").await,
            Err(CaseError::Validation { .. })
        ));
    }
}
