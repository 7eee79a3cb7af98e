use crate::domain::model::{DataTable, SqlValue};
use crate::domain::ports::{CommandBatch, DbConnection, DbConnector};
use crate::utils::error::{CaseError, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use futures::TryStreamExt;
use rust_decimal::Decimal;
use tiberius::numeric::Numeric;
use tiberius::xml::XmlData;
use tiberius::{Client, ColumnType, Config, Query, QueryItem, Row};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

/// SQL Server 連線工廠 (tiberius)
pub struct TiberiusConnector {
    config: Config,
}

impl TiberiusConnector {
    pub fn from_ado_string(connection_string: &str) -> Result<Self> {
        let config = Config::from_ado_string(connection_string).map_err(|e| {
            CaseError::InvalidConfigValueError {
                field: "database.connection_string".to_string(),
                value: "<redacted>".to_string(),
                reason: e.to_string(),
            }
        })?;
        Ok(Self { config })
    }
}

#[async_trait]
impl DbConnector for TiberiusConnector {
    async fn open(&self) -> Result<Box<dyn DbConnection>> {
        let tcp = TcpStream::connect(self.config.get_addr())
            .await
            .map_err(|e| CaseError::Connection {
                message: e.to_string(),
            })?;
        tcp.set_nodelay(true)?;

        let client = Client::connect(self.config.clone(), tcp.compat_write())
            .await
            .map_err(|e| CaseError::Connection {
                message: e.to_string(),
            })?;

        Ok(Box::new(TiberiusConnection {
            client: Some(client),
        }))
    }
}

pub struct TiberiusConnection {
    client: Option<Client<Compat<TcpStream>>>,
}

#[async_trait]
impl DbConnection for TiberiusConnection {
    async fn execute(&mut self, batch: &CommandBatch) -> Result<Vec<DataTable>> {
        let client = self.client.as_mut().ok_or_else(|| CaseError::Connection {
            message: "connection already closed".to_string(),
        })?;

        let mut query = Query::new(batch.sql.clone());
        for value in &batch.bindings {
            bind_value(&mut query, value);
        }

        let mut stream = query.query(client).await?;
        let mut tables: Vec<DataTable> = Vec::new();

        while let Some(item) = stream.try_next().await? {
            match item {
                QueryItem::Metadata(meta) => {
                    for column in meta.columns() {
                        if matches!(column.column_type(), ColumnType::Udt | ColumnType::SSVariant) {
                            tracing::warn!(
                                procedure = %batch.procedure,
                                column = column.name(),
                                "⚠️ Column type {:?} is not readable, values will be NULL",
                                column.column_type()
                            );
                        }
                    }
                    let columns = meta.columns().iter().map(|c| c.name().to_string()).collect();
                    tables.push(DataTable::new("", columns));
                }
                QueryItem::Row(row) => {
                    let values = row_values(&batch.procedure, &row)?;
                    match tables.last_mut() {
                        Some(table) => table.rows.push(values),
                        None => {
                            return Err(CaseError::database(
                                &batch.procedure,
                                "row received before result metadata",
                            ))
                        }
                    }
                }
            }
        }

        Ok(tables)
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(client) = self.client.take() {
            client.close().await?;
        }
        Ok(())
    }
}

fn bind_value(query: &mut Query<'_>, value: &SqlValue) {
    match value {
        SqlValue::Null => query.bind(Option::<String>::None),
        SqlValue::Bit(b) => query.bind(*b),
        SqlValue::Int(v) => query.bind(*v),
        SqlValue::Float(v) => query.bind(*v),
        SqlValue::Decimal(d) => {
            let scale = u8::try_from(d.scale()).unwrap_or(u8::MAX);
            query.bind(Numeric::new_with_scale(d.mantissa(), scale))
        }
        SqlValue::Date(d) => query.bind(*d),
        SqlValue::DateTime(dt) => query.bind(*dt),
        SqlValue::Text(s) => query.bind(s.clone()),
    }
}

fn row_values(procedure: &str, row: &Row) -> Result<Vec<SqlValue>> {
    row.columns()
        .iter()
        .enumerate()
        .map(|(idx, column)| {
            column_value(row, idx, column.column_type()).map_err(|e| {
                CaseError::database(
                    procedure,
                    format!("failed to read column {} ({}): {}", idx, column.name(), e),
                )
            })
        })
        .collect()
}

fn column_value(row: &Row, idx: usize, column_type: ColumnType) -> Result<SqlValue> {
    let value: SqlValue = match column_type {
        ColumnType::Null => SqlValue::Null,
        ColumnType::Bit | ColumnType::Bitn => row.try_get::<bool, _>(idx)?.into(),
        ColumnType::Int1 => row.try_get::<u8, _>(idx)?.map(i64::from).into(),
        ColumnType::Int2 => row.try_get::<i16, _>(idx)?.map(i64::from).into(),
        ColumnType::Int4 => row.try_get::<i32, _>(idx)?.map(i64::from).into(),
        ColumnType::Int8 => row.try_get::<i64, _>(idx)?.into(),
        ColumnType::Intn => int_value(row, idx)?.into(),
        ColumnType::Float4 => row.try_get::<f32, _>(idx)?.map(f64::from).into(),
        ColumnType::Float8 | ColumnType::Floatn => float_value(row, idx)?.into(),
        // MONEY 只有四位小數，轉回 Decimal 避免浮點誤差
        ColumnType::Money | ColumnType::Money4 => float_value(row, idx)?
            .and_then(|f| Decimal::try_from(f).ok())
            .map(|d| d.round_dp(4))
            .into(),
        ColumnType::Decimaln | ColumnType::Numericn => row
            .try_get::<Numeric, _>(idx)?
            .map(|n| Decimal::from_i128_with_scale(n.value(), u32::from(n.scale())))
            .into(),
        ColumnType::Daten => row.try_get::<NaiveDate, _>(idx)?.into(),
        ColumnType::Timen => row
            .try_get::<NaiveTime, _>(idx)?
            .map(|t| t.to_string())
            .into(),
        ColumnType::Datetime
        | ColumnType::Datetime4
        | ColumnType::Datetimen
        | ColumnType::Datetime2 => row.try_get::<NaiveDateTime, _>(idx)?.into(),
        ColumnType::DatetimeOffsetn => row
            .try_get::<chrono::DateTime<chrono::Utc>, _>(idx)?
            .map(|dt| dt.naive_utc())
            .into(),
        ColumnType::Guid => row
            .try_get::<tiberius::Uuid, _>(idx)?
            .map(|u| u.to_string())
            .into(),
        ColumnType::BigVarChar
        | ColumnType::BigChar
        | ColumnType::NVarchar
        | ColumnType::NChar
        | ColumnType::Text
        | ColumnType::NText => row.try_get::<&str, _>(idx)?.map(str::to_string).into(),
        ColumnType::Xml => row
            .try_get::<&XmlData, _>(idx)?
            .map(|xml| xml.clone().into_string())
            .into(),
        ColumnType::BigBinary | ColumnType::BigVarBin | ColumnType::Image => row
            .try_get::<&[u8], _>(idx)?
            .map(SqlValue::binary)
            .unwrap_or(SqlValue::Null),
        // Udt、SSVariant：收到中繼資料時已警告
        _ => SqlValue::Null,
    };
    Ok(value)
}

// Intn 的實際寬度只能從資料本身得知
fn int_value(row: &Row, idx: usize) -> Result<Option<i64>> {
    if let Ok(v) = row.try_get::<i32, _>(idx) {
        return Ok(v.map(i64::from));
    }
    if let Ok(v) = row.try_get::<i64, _>(idx) {
        return Ok(v);
    }
    if let Ok(v) = row.try_get::<i16, _>(idx) {
        return Ok(v.map(i64::from));
    }
    Ok(row.try_get::<u8, _>(idx)?.map(i64::from))
}

fn float_value(row: &Row, idx: usize) -> Result<Option<f64>> {
    if let Ok(v) = row.try_get::<f64, _>(idx) {
        return Ok(v);
    }
    Ok(row.try_get::<f32, _>(idx)?.map(f64::from))
}
