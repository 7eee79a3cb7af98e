use crate::utils::error::{CaseError, Result};
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// 預存程序參數與結果欄位的值
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlValue {
    Null,
    Bit(bool),
    Int(i64),
    Float(f64),
    Decimal(Decimal),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Text(String),
}

impl SqlValue {
    /// 二進位欄位 (binary/varbinary/rowversion) 以 0x 開頭的十六進位文字表示
    pub fn binary(bytes: &[u8]) -> Self {
        let mut text = String::with_capacity(2 + bytes.len() * 2);
        text.push_str("0x");
        for byte in bytes {
            text.push_str(&format!("{:02X}", byte));
        }
        SqlValue::Text(text)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SqlValue::Int(v) => Some(*v),
            SqlValue::Bit(b) => Some(i64::from(*b)),
            SqlValue::Decimal(d) if d.fract().is_zero() => d.to_i64(),
            SqlValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SqlValue::Bit(b) => Some(*b),
            SqlValue::Int(v) => Some(*v != 0),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            SqlValue::Decimal(d) => Some(*d),
            SqlValue::Int(v) => Some(Decimal::from(*v)),
            SqlValue::Float(f) => Decimal::try_from(*f).ok(),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            SqlValue::Date(d) => Some(*d),
            SqlValue::DateTime(dt) => Some(dt.date()),
            _ => None,
        }
    }

    /// 文字表示；NULL 會回傳 None
    pub fn to_text(&self) -> Option<String> {
        match self {
            SqlValue::Null => None,
            SqlValue::Text(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// 依值推斷宣告型別
    pub fn inferred_type(&self) -> SqlType {
        match self {
            SqlValue::Null | SqlValue::Text(_) => SqlType::NVarChar(None),
            SqlValue::Bit(_) => SqlType::Bit,
            SqlValue::Int(_) => SqlType::BigInt,
            SqlValue::Float(_) => SqlType::Float,
            SqlValue::Decimal(_) => SqlType::Decimal {
                precision: 19,
                scale: 4,
            },
            SqlValue::Date(_) => SqlType::Date,
            SqlValue::DateTime(_) => SqlType::DateTime,
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => Ok(()),
            SqlValue::Bit(b) => write!(f, "{}", u8::from(*b)),
            SqlValue::Int(v) => write!(f, "{}", v),
            SqlValue::Float(v) => write!(f, "{}", v),
            SqlValue::Decimal(d) => write!(f, "{}", d),
            SqlValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            SqlValue::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
            SqlValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Int(v)
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        SqlValue::Int(i64::from(v))
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bit(v)
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        SqlValue::Float(v)
    }
}

impl From<Decimal> for SqlValue {
    fn from(v: Decimal) -> Self {
        SqlValue::Decimal(v)
    }
}

impl From<NaiveDate> for SqlValue {
    fn from(v: NaiveDate) -> Self {
        SqlValue::Date(v)
    }
}

impl From<NaiveDateTime> for SqlValue {
    fn from(v: NaiveDateTime) -> Self {
        SqlValue::DateTime(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(SqlValue::Null)
    }
}

/// 輸出參數需要的 T-SQL 宣告型別
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Int,
    BigInt,
    Bit,
    Decimal { precision: u8, scale: u8 },
    Money,
    Float,
    Date,
    DateTime,
    /// None 代表 NVARCHAR(MAX)
    NVarChar(Option<u16>),
}

impl SqlType {
    pub fn declaration(&self) -> String {
        match self {
            SqlType::Int => "INT".to_string(),
            SqlType::BigInt => "BIGINT".to_string(),
            SqlType::Bit => "BIT".to_string(),
            SqlType::Decimal { precision, scale } => format!("DECIMAL({}, {})", precision, scale),
            SqlType::Money => "MONEY".to_string(),
            SqlType::Float => "FLOAT".to_string(),
            SqlType::Date => "DATE".to_string(),
            SqlType::DateTime => "DATETIME2".to_string(),
            SqlType::NVarChar(Some(len)) => format!("NVARCHAR({})", len),
            SqlType::NVarChar(None) => "NVARCHAR(MAX)".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamDirection {
    Input,
    Output,
    InputOutput,
}

#[derive(Clone, PartialEq)]
pub struct SqlParam {
    pub name: String,
    pub value: SqlValue,
    pub sql_type: SqlType,
    pub direction: ParamDirection,
    pub sensitive: bool,
}

impl SqlParam {
    pub fn input(name: &str, value: impl Into<SqlValue>) -> Self {
        let value = value.into();
        Self {
            name: name.to_string(),
            sql_type: value.inferred_type(),
            value,
            direction: ParamDirection::Input,
            sensitive: false,
        }
    }

    pub fn output(name: &str, sql_type: SqlType) -> Self {
        Self {
            name: name.to_string(),
            value: SqlValue::Null,
            sql_type,
            direction: ParamDirection::Output,
            sensitive: false,
        }
    }

    pub fn input_output(name: &str, value: impl Into<SqlValue>, sql_type: SqlType) -> Self {
        Self {
            name: name.to_string(),
            value: value.into(),
            sql_type,
            direction: ParamDirection::InputOutput,
            sensitive: false,
        }
    }

    /// 標記為敏感值 (例如密碼)，Debug 輸出時遮蔽
    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }
}

impl fmt::Debug for SqlParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("SqlParam");
        s.field("name", &self.name);
        if self.sensitive {
            s.field("value", &"***");
        } else {
            s.field("value", &self.value);
        }
        s.field("direction", &self.direction).finish()
    }
}

/// 在參數清單中依名稱找值 (不分大小寫)
pub fn param_value<'a>(params: &'a [SqlParam], name: &str) -> Option<&'a SqlValue> {
    params
        .iter()
        .find(|p| p.name.eq_ignore_ascii_case(name))
        .map(|p| &p.value)
}

/// 預存程序執行後的輸出參數與回傳值
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProcedureOutput {
    pub values: HashMap<String, SqlValue>,
    pub return_value: Option<i32>,
}

impl ProcedureOutput {
    pub fn with_output(mut self, name: &str, value: impl Into<SqlValue>) -> Self {
        self.values.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_return_value(mut self, value: i32) -> Self {
        self.return_value = Some(value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&SqlValue> {
        self.values
            .get(&name.to_ascii_lowercase())
            .filter(|v| !v.is_null())
    }

    pub fn text(&self, name: &str) -> Option<String> {
        self.get(name).and_then(SqlValue::to_text)
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(SqlValue::as_i64)
    }

    pub fn bit(&self, name: &str) -> bool {
        self.get(name).and_then(SqlValue::as_bool).unwrap_or(false)
    }

    pub fn date(&self, name: &str) -> Option<NaiveDate> {
        self.get(name).and_then(SqlValue::as_date)
    }

    pub fn decimal(&self, name: &str) -> Option<Decimal> {
        self.get(name).and_then(SqlValue::as_decimal)
    }

    pub fn require_text(&self, procedure: &str, name: &str) -> Result<String> {
        self.text(name).ok_or_else(|| missing(procedure, name))
    }
}

fn missing(procedure: &str, name: &str) -> CaseError {
    CaseError::MissingOutput {
        procedure: procedure.to_string(),
        parameter: name.to_string(),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DataTable {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<SqlValue>>,
}

impl DataTable {
    pub fn new(name: &str, columns: Vec<String>) -> Self {
        Self {
            name: name.to_string(),
            columns,
            rows: Vec::new(),
        }
    }

    pub fn with_row(mut self, row: Vec<SqlValue>) -> Self {
        self.rows.push(row);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(column))
    }

    pub fn value(&self, row: usize, column: &str) -> Option<&SqlValue> {
        let idx = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(idx))
    }

    /// 將資料列轉成 JSON 物件陣列
    pub fn to_records(&self) -> Vec<serde_json::Map<String, serde_json::Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .zip(row.iter())
                    .map(|(c, v)| {
                        let json = serde_json::to_value(v).unwrap_or(serde_json::Value::Null);
                        (c.clone(), json)
                    })
                    .collect()
            })
            .collect()
    }

    pub fn write_csv<W: std::io::Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(&self.columns)?;
        for row in &self.rows {
            csv_writer.write_record(row.iter().map(|v| v.to_string()))?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DataSet {
    pub tables: Vec<DataTable>,
}

impl DataSet {
    pub fn table(&self, name: &str) -> Option<&DataTable> {
        self.tables.iter().find(|t| t.name.eq_ignore_ascii_case(name))
    }
}

/// 日期區間；end 為 None 代表沒有結束日
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: Option<NaiveDate>,
}

impl DateWindow {
    /// end 晚於指定日期 (開放區間視為較晚)
    pub fn ends_after(&self, date: NaiveDate) -> bool {
        self.end.map_or(true, |end| end > date)
    }
}
