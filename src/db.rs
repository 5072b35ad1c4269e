//! Runs the compiled SQL against a live MySQL server.
//!
//! This is the only module that knows what database the rows come from; the
//! rest of the crate deals in [`Row`]s and [`Value`]s. An empty result set is
//! a normal, successful outcome here; whether to call that "no results" is
//! the caller's business.
use crate::engine::{Row, Value};
use crate::markfile::DbConfig;
use log::info;
use mysql::prelude::Queryable;
use mysql::{OptsBuilder, Pool};

pub struct DbConnection {
    pool: Pool,
}

impl DbConnection {
    pub fn connect(config: &DbConfig, password: &str) -> Result<DbConnection, crate::Error> {
        let opts = OptsBuilder::new()
            .ip_or_hostname(Some(config.host.as_str()))
            .tcp_port(config.port)
            .user(Some(config.user.as_str()))
            .pass(Some(password))
            .db_name(Some(config.name.as_str()));

        let pool = Pool::new(opts)?;

        Ok(DbConnection { pool })
    }

    pub fn execute(&self, sql: &str) -> Result<Vec<Row>, crate::Error> {
        let mut conn = self.pool.get_conn()?;

        let result = conn.query_iter(sql)?;

        let mut rows = Vec::new();
        for row in result {
            let row = row?;
            let columns = row.columns();

            let mut record = Row::new();
            for (idx, column) in columns.iter().enumerate() {
                let value = row.as_ref(idx).cloned().unwrap_or(mysql::Value::NULL);
                record.insert(column.name_str().into_owned(), convert(value));
            }

            rows.push(record);
        }

        info!("query returned {} rows", rows.len());

        Ok(rows)
    }
}

fn convert(value: mysql::Value) -> Value {
    use mysql::Value as Sql;

    match value {
        Sql::NULL => Value::Null,
        Sql::Int(number) => Value::Integer(number),
        Sql::UInt(number) => Value::Integer(number as i64),
        Sql::Float(number) => Value::Float(number as f64),
        Sql::Double(number) => Value::Float(number),
        Sql::Bytes(bytes) => Value::Text(String::from_utf8_lossy(&bytes).into_owned()),
        Sql::Date(year, month, day, 0, 0, 0, 0) => {
            Value::Text(format!("{year:04}-{month:02}-{day:02}"))
        }
        Sql::Date(year, month, day, hour, minute, second, _) => Value::Text(format!(
            "{year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second:02}"
        )),
        Sql::Time(negative, days, hours, minutes, seconds, _) => {
            let sign = if negative { "-" } else { "" };
            let hours = u32::from(hours) + days * 24;
            Value::Text(format!("{sign}{hours:02}:{minutes:02}:{seconds:02}"))
        }
    }
}
