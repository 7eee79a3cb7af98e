use crate::domain::model::{DataTable, ParamDirection, ProcedureOutput, SqlParam};
use crate::domain::ports::CommandBatch;
use crate::utils::error::{CaseError, Result};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,127}$").unwrap());
static PARAMETER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^@[A-Za-z_][A-Za-z0-9_]{0,127}$").unwrap());

const RETURN_VALUE: &str = "@__return_value";

/// 將 `schema.procedure` 或 `procedure` 轉成加上中括號的名稱
fn quoted_procedure(default_schema: &str, procedure: &str) -> Result<String> {
    let (schema, name) = match procedure.split_once('.') {
        Some((schema, name)) => (schema, name),
        None => (default_schema, procedure),
    };

    if !IDENTIFIER.is_match(schema) || !IDENTIFIER.is_match(name) {
        return Err(CaseError::InvalidProcedureName {
            name: procedure.to_string(),
        });
    }

    Ok(format!("[{}].[{}]", schema, name))
}

/// 組出呼叫預存程序的批次。
///
/// 參數值一律以 `@P1..@Pn` 綁定；名稱只有在通過識別字檢查後才會寫進 SQL。
/// 輸出參數宣告成區域變數，最後一個 SELECT 依序帶回回傳值與所有輸出參數。
pub fn build_procedure_batch(
    default_schema: &str,
    procedure: &str,
    params: &[SqlParam],
) -> Result<CommandBatch> {
    let target = quoted_procedure(default_schema, procedure)?;

    let mut seen = HashSet::new();
    let mut declarations = vec![format!("DECLARE {} INT;", RETURN_VALUE)];
    let mut arguments = Vec::with_capacity(params.len());
    let mut bindings = Vec::new();
    let mut selected = vec![format!("{} AS [__return_value]", RETURN_VALUE)];
    let mut output_names = Vec::new();

    for param in params {
        if !PARAMETER.is_match(&param.name) || !seen.insert(param.name.to_ascii_lowercase()) {
            return Err(CaseError::InvalidParameterName {
                name: param.name.clone(),
            });
        }

        match param.direction {
            ParamDirection::Input => {
                bindings.push(param.value.clone());
                arguments.push(format!("{} = @P{}", param.name, bindings.len()));
            }
            ParamDirection::Output | ParamDirection::InputOutput => {
                let local = format!("@__out{}", output_names.len() + 1);
                if param.direction == ParamDirection::InputOutput {
                    bindings.push(param.value.clone());
                    declarations.push(format!(
                        "DECLARE {} {} = @P{};",
                        local,
                        param.sql_type.declaration(),
                        bindings.len()
                    ));
                } else {
                    declarations.push(format!(
                        "DECLARE {} {};",
                        local,
                        param.sql_type.declaration()
                    ));
                }
                arguments.push(format!("{} = {} OUTPUT", param.name, local));
                selected.push(format!("{} AS [{}]", local, &param.name[1..]));
                output_names.push(param.name.clone());
            }
        }
    }

    let exec = if arguments.is_empty() {
        format!("EXEC {} = {};", RETURN_VALUE, target)
    } else {
        format!("EXEC {} = {} {};", RETURN_VALUE, target, arguments.join(", "))
    };

    let sql = format!(
        "SET NOCOUNT ON;\n{}\n{}\nSELECT {};",
        declarations.join("\n"),
        exec,
        selected.join(", ")
    );

    Ok(CommandBatch {
        procedure: procedure.to_string(),
        sql,
        bindings,
        output_names,
    })
}

/// 拆出最後一個結果集 (輸出參數)，其餘為程序本身的資料
pub fn split_results(
    batch: &CommandBatch,
    mut result_sets: Vec<DataTable>,
) -> Result<(Vec<DataTable>, ProcedureOutput)> {
    let trailing = result_sets.pop().ok_or_else(|| {
        CaseError::database(&batch.procedure, "batch returned no output result set")
    })?;

    let row = trailing.rows.first().ok_or_else(|| {
        CaseError::database(&batch.procedure, "output result set has no row")
    })?;

    if row.len() != batch.output_names.len() + 1 {
        return Err(CaseError::database(
            &batch.procedure,
            format!(
                "expected {} output columns, got {}",
                batch.output_names.len() + 1,
                row.len()
            ),
        ));
    }

    let mut output = ProcedureOutput::default();
    if let Some(rv) = row[0].as_i64() {
        output.return_value = i32::try_from(rv).ok();
    }
    for (name, value) in batch.output_names.iter().zip(row[1..].iter()) {
        output = output.with_output(name, value.clone());
    }

    Ok((result_sets, output))
}
