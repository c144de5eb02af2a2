//! PostgreSQL connection helper.

use diesel::{Connection, PgConnection, RunQueryDsl, sql_query};
use secrecy::ExposeSecret;

use crate::config::DbConfig;
use crate::errors::EtlError;

/// Session name shown in `pg_stat_activity` for both ETL runs.
const APPLICATION_NAME: &str = "ETL - DETER CMask Task";

/// Builds the libpq keyword/value connection string. The quoted password
/// escapes backslashes before single quotes, per libpq quoting rules.
fn conninfo(db: &DbConfig) -> String {
    format!(
        "host={} port={} dbname={} user={} password='{}'",
        db.host,
        db.port,
        db.database,
        db.user,
        db.password
            .expose_secret()
            .replace('\\', "\\\\")
            .replace('\'', "\\'")
    )
}

/// Opens a PostgreSQL connection and tags the session with the ETL
/// application name.
pub fn connect(db: &DbConfig) -> Result<PgConnection, EtlError> {
    let mut conn = PgConnection::establish(&conninfo(db))?;
    sql_query(format!("SET application_name = '{APPLICATION_NAME}';")).execute(&mut conn)?;
    Ok(conn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn db(password: &str) -> DbConfig {
        DbConfig {
            host: "localhost".to_string(),
            port: 5432,
            database: "deter".to_string(),
            user: "etl".to_string(),
            password: SecretString::new(password.to_string().into()),
        }
    }

    #[test]
    fn plain_password_round_trips() {
        assert_eq!(
            conninfo(&db("secret")),
            "host=localhost port=5432 dbname=deter user=etl password='secret'"
        );
    }

    #[test]
    fn quotes_and_backslashes_are_escaped() {
        // backslashes must be doubled before quote escaping, otherwise a
        // trailing backslash swallows the closing quote
        assert_eq!(
            conninfo(&db(r"p\")),
            r"host=localhost port=5432 dbname=deter user=etl password='p\\'"
        );
        assert_eq!(
            conninfo(&db("it's")),
            r"host=localhost port=5432 dbname=deter user=etl password='it\'s'"
        );
        assert_eq!(
            conninfo(&db(r"a\'b")),
            r"host=localhost port=5432 dbname=deter user=etl password='a\\\'b'"
        );
    }
}
