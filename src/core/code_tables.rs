use crate::core::context::{split_delimited, ServiceContext};
use crate::domain::model::{DataSet, DataTable, SqlParam, SqlType};
use crate::utils::error::{CaseError, Result};
use crate::utils::validation::require_text;

const TABLE_PROCEDURE: &str = "prc_CodeTableGet";

pub struct CodeTables {
    ctx: ServiceContext,
}

impl CodeTables {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    pub async fn get_code_table(&self, table_name: &str) -> Result<DataTable> {
        require_text("table_name", table_name)?;
        let mut table = self
            .ctx
            .get_data_table(
                TABLE_PROCEDURE,
                vec![SqlParam::input("@TableName", table_name.trim())],
            )
            .await?;
        table.name = table_name.trim().to_string();
        Ok(table)
    }

    /// "A|B|C" 每個代碼表各呼叫一次，結果依輸入順序放進 DataSet
    pub async fn get_code_tables(&self, table_names: &str) -> Result<DataSet> {
        let names = split_delimited(table_names);
        if names.is_empty() {
            return Err(CaseError::validation(
                "table_names",
                "at least one code table name is required",
            ));
        }

        let mut data_set = DataSet::default();
        for name in names {
            data_set.tables.push(self.get_code_table(name).await?);
        }
        Ok(data_set)
    }

    pub async fn get_code_description(&self, table_name: &str, code: &str) -> Result<Option<String>> {
        require_text("table_name", table_name)?;
        require_text("code", code)?;

        let output = self
            .ctx
            .execute_non_query(
                "prc_CodeDescriptionGet",
                vec![
                    SqlParam::input("@TableName", table_name.trim()),
                    SqlParam::input("@Code", code.trim()),
                    SqlParam::output("@Description", SqlType::NVarChar(Some(255))),
                ],
            )
            .await?;
        Ok(output.text("@Description"))
    }
}
