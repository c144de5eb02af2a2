//! Run configuration resolved once at startup.
//!
//! Both binaries build an [`EtlConfig`] before any component is constructed;
//! components receive resolved values and never touch the environment
//! themselves. The jobs run from a scheduler with one env file per biome,
//! which is why the surface is environment-driven:
//!
//! - `TARGET_BIOME` (required) — biome name, also the data subdirectory
//! - `DATA_DIR` (required) — root directory for downloaded data
//! - `BASE_URL` (default `http://www.dpi.inpe.br/catalog/tmp`)
//! - `PGHOST`, `PGDB`, `PGUSER`, `PGPASSWORD` (required), `PGPORT` (default 5432)
//! - `FORCE_YEAR_MONTH` (`YYYY-MM-DD`, optional) — force a target month
//! - `EVERY_DAY` (`yes`/`no`) — bypass the closed-month recency check
//! - `CATALOG_TABLE` (default `cloud.deter_current`)
//! - `ZONAL_TABLE` (default `cloud.monthly_cloud_mun_table`)

use std::path::PathBuf;

use chrono::NaiveDate;
use secrecy::SecretString;
use shared_utils::env::{get_env_flag, get_env_var, get_env_var_or};
use tracing::warn;

use crate::errors::EtlError;

const DEFAULT_BASE_URL: &str = "http://www.dpi.inpe.br/catalog/tmp";
const DEFAULT_CATALOG_TABLE: &str = "cloud.deter_current";
const DEFAULT_ZONAL_TABLE: &str = "cloud.monthly_cloud_mun_table";

/// Database connection parameters.
#[derive(Debug)]
pub struct DbConfig {
    /// Host name or IP of the PostgreSQL server.
    pub host: String,
    /// TCP port, default 5432.
    pub port: u16,
    /// Database name.
    pub database: String,
    /// Role name.
    pub user: String,
    /// Role password; kept out of Debug output.
    pub password: SecretString,
}

/// Fully resolved configuration for one acquisition or zonal run.
#[derive(Debug)]
pub struct EtlConfig {
    /// Biome name, e.g. `amazonia` or `cerrado`.
    pub biome: String,
    /// Root directory for downloaded data; the biome subdirectory lives here.
    pub data_dir: PathBuf,
    /// Base URL of the remote CMASK catalog.
    pub base_url: String,
    /// Database connection parameters.
    pub db: DbConfig,
    /// Optional forced target month (first day of month).
    pub force_month: Option<NaiveDate>,
    /// Bypass the closed-month recency check and proceed on every run.
    pub every_day: bool,
    /// Alert catalog table, `schema.table`.
    pub catalog_table: String,
    /// Municipality zonal table, `schema.table`.
    pub zonal_table: String,
}

impl EtlConfig {
    /// Resolves the configuration from the environment and validates it.
    pub fn from_env() -> Result<Self, EtlError> {
        let biome = get_env_var("TARGET_BIOME")?;
        if biome.trim().is_empty() {
            return Err(EtlError::Config("TARGET_BIOME is empty".to_string()));
        }

        let force_month = match std::env::var("FORCE_YEAR_MONTH") {
            Ok(raw) if !raw.trim().is_empty() && raw.trim() != "no" => {
                match NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d") {
                    Ok(d) => Some(d),
                    Err(e) => {
                        // a bad value downgrades to "not forced", it never aborts
                        warn!(value = %raw, error = %e, "FORCE_YEAR_MONTH is invalid, ignoring");
                        None
                    }
                }
            }
            _ => None,
        };

        // a forced month always wins over the daily bypass
        let every_day = force_month.is_none() && get_env_flag("EVERY_DAY");

        let catalog_table = get_env_var_or("CATALOG_TABLE", DEFAULT_CATALOG_TABLE);
        let zonal_table = get_env_var_or("ZONAL_TABLE", DEFAULT_ZONAL_TABLE);
        validate_table_ident(&catalog_table)?;
        validate_table_ident(&zonal_table)?;

        let port = get_env_var_or("PGPORT", "5432")
            .parse::<u16>()
            .map_err(|_| EtlError::Config("PGPORT is not a valid port number".to_string()))?;

        Ok(EtlConfig {
            biome: biome.trim().to_string(),
            data_dir: PathBuf::from(get_env_var("DATA_DIR")?),
            base_url: get_env_var_or("BASE_URL", DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            db: DbConfig {
                host: get_env_var("PGHOST")?,
                port,
                database: get_env_var("PGDB")?,
                user: get_env_var("PGUSER")?,
                password: SecretString::new(get_env_var("PGPASSWORD")?.into()),
            },
            force_month,
            every_day,
            catalog_table,
            zonal_table,
        })
    }

    /// Per-biome data directory, `{data_dir}/{biome}`.
    pub fn biome_dir(&self) -> PathBuf {
        self.data_dir.join(&self.biome)
    }

    /// Creates the per-biome data directory if it does not exist yet.
    pub fn ensure_biome_dir(&self) -> Result<PathBuf, EtlError> {
        let dir = self.biome_dir();
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }
}

/// Validates a `schema.table` identifier before it is spliced into SQL.
///
/// Table names come from configuration, not from user input, but they still
/// cannot go through bind parameters, so only lowercase alphanumerics and
/// underscores with a single dot separator are accepted.
pub fn validate_table_ident(name: &str) -> Result<(), EtlError> {
    let mut parts = name.split('.');
    let ok = matches!(
        (parts.next(), parts.next(), parts.next()),
        (Some(schema), Some(table), None)
            if is_ident(schema) && is_ident(table)
    );
    if ok {
        Ok(())
    } else {
        Err(EtlError::Config(format!(
            "invalid table name (expected schema.table): {name}"
        )))
    }
}

fn is_ident(s: &str) -> bool {
    !s.is_empty()
        && s.chars().next().is_some_and(|c| c.is_ascii_lowercase() || c == '_')
        && s.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn set_required_vars() {
        unsafe {
            std::env::set_var("TARGET_BIOME", "amazonia");
            std::env::set_var("DATA_DIR", "/tmp/cmask-data");
            std::env::set_var("PGHOST", "localhost");
            std::env::set_var("PGDB", "deter");
            std::env::set_var("PGUSER", "etl");
            std::env::set_var("PGPASSWORD", "secret");
            std::env::remove_var("PGPORT");
            std::env::remove_var("BASE_URL");
            std::env::remove_var("FORCE_YEAR_MONTH");
            std::env::remove_var("EVERY_DAY");
            std::env::remove_var("CATALOG_TABLE");
            std::env::remove_var("ZONAL_TABLE");
        }
    }

    #[test]
    #[serial]
    fn defaults_apply() {
        set_required_vars();
        let cfg = EtlConfig::from_env().unwrap();
        assert_eq!(cfg.db.port, 5432);
        assert_eq!(cfg.base_url, DEFAULT_BASE_URL);
        assert_eq!(cfg.catalog_table, "cloud.deter_current");
        assert_eq!(cfg.zonal_table, "cloud.monthly_cloud_mun_table");
        assert!(cfg.force_month.is_none());
        assert!(!cfg.every_day);
        assert_eq!(cfg.biome_dir(), PathBuf::from("/tmp/cmask-data/amazonia"));
    }

    #[test]
    #[serial]
    fn invalid_force_month_downgrades_to_unset() {
        set_required_vars();
        unsafe {
            std::env::set_var("FORCE_YEAR_MONTH", "2023-13-99");
            std::env::set_var("EVERY_DAY", "yes");
        }
        let cfg = EtlConfig::from_env().unwrap();
        assert!(cfg.force_month.is_none());
        // the bypass survives because the forced month was dropped
        assert!(cfg.every_day);
    }

    #[test]
    #[serial]
    fn force_month_suppresses_every_day() {
        set_required_vars();
        unsafe {
            std::env::set_var("FORCE_YEAR_MONTH", "2023-05-01");
            std::env::set_var("EVERY_DAY", "yes");
        }
        let cfg = EtlConfig::from_env().unwrap();
        assert_eq!(
            cfg.force_month,
            Some(NaiveDate::from_ymd_opt(2023, 5, 1).unwrap())
        );
        assert!(!cfg.every_day);
    }

    #[test]
    #[serial]
    fn missing_biome_is_a_config_error() {
        set_required_vars();
        unsafe { std::env::remove_var("TARGET_BIOME") };
        assert!(matches!(EtlConfig::from_env(), Err(EtlError::Config(_))));
    }

    #[test]
    fn table_ident_validation() {
        assert!(validate_table_ident("cloud.deter_current").is_ok());
        assert!(validate_table_ident("cloud.monthly_cloud_mun_table_cerrado").is_ok());
        assert!(validate_table_ident("deter_current").is_err());
        assert!(validate_table_ident("cloud.deter;drop").is_err());
        assert!(validate_table_ident("Cloud.Deter").is_err());
        assert!(validate_table_ident("a.b.c").is_err());
    }
}
