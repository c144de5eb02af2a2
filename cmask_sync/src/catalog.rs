//! Queries against the DETER alert catalog table.
//!
//! One row per distinct `(satellite, path_row, view_date)` scene observation.
//! The table name is per-biome configuration, validated by
//! [`crate::config::validate_table_ident`] before it reaches this module.

use chrono::NaiveDate;
use diesel::QueryableByName;
use diesel::prelude::*;
use diesel::sql_query;
use diesel::sql_types::{Date, Text};

use crate::errors::EtlError;
use crate::satellite::Satellite;

/// One scene observation published in the target month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogRecord {
    /// Satellite that produced the scene.
    pub satellite: Satellite,
    /// Path/row grid cell of the scene, e.g. `157_103`.
    pub path_row: String,
    /// Acquisition date of the scene.
    pub view_date: NaiveDate,
}

#[derive(QueryableByName)]
struct SceneRow {
    #[diesel(sql_type = Text)]
    satellite: String,
    #[diesel(sql_type = Text)]
    path_row: String,
    #[diesel(sql_type = Date)]
    view_date: NaiveDate,
}

#[derive(QueryableByName)]
struct MonthRow {
    #[diesel(sql_type = diesel::sql_types::Nullable<Date>)]
    month: Option<NaiveDate>,
}

fn scene_sql(table: &str) -> String {
    format!(
        "SELECT satellite, path_row, view_date FROM {table} \
         WHERE publish_month = $1 AND satellite = $2 \
         GROUP BY satellite, path_row, view_date ORDER BY view_date ASC"
    )
}

fn max_month_sql(table: &str) -> String {
    format!("SELECT MAX(publish_month) AS month FROM {table}")
}

fn closed_month_sql(table: &str) -> String {
    format!(
        "SELECT MAX(publish_month) AS month FROM ( \
           SELECT publish_month, MAX(view_date) AS last_view \
           FROM {table} GROUP BY publish_month \
         ) months \
         WHERE last_view <= $1::date - INTERVAL '1 day'"
    )
}

/// Loads the scene observations of `satellite` published under
/// `publish_month`, ordered by acquisition date.
pub fn scene_records(
    conn: &mut PgConnection,
    table: &str,
    satellite: Satellite,
    publish_month: NaiveDate,
) -> Result<Vec<CatalogRecord>, EtlError> {
    let rows: Vec<SceneRow> = sql_query(scene_sql(table))
        .bind::<Date, _>(publish_month)
        .bind::<Text, _>(satellite.db_code())
        .load(conn)?;

    rows.into_iter()
        .map(|r| {
            let satellite = r.satellite.parse::<Satellite>()?;
            Ok(CatalogRecord {
                satellite,
                path_row: r.path_row,
                view_date: r.view_date,
            })
        })
        .collect()
}

/// Latest publish month present in the catalog, if any rows exist.
pub fn max_publish_month(
    conn: &mut PgConnection,
    table: &str,
) -> Result<Option<NaiveDate>, EtlError> {
    let row: MonthRow = sql_query(max_month_sql(table)).get_result(conn)?;
    Ok(row.month)
}

/// Latest *closed* publish month: the most recent publish month whose
/// observations are all dated on/before one day prior to the overall maximum
/// publish month, i.e. the month boundary has fully elapsed.
///
/// Returns `None` on an empty catalog.
pub fn last_closed_month(
    conn: &mut PgConnection,
    table: &str,
) -> Result<Option<NaiveDate>, EtlError> {
    let Some(max_month) = max_publish_month(conn, table)? else {
        return Ok(None);
    };
    let row: MonthRow = sql_query(closed_month_sql(table))
        .bind::<Date, _>(max_month)
        .get_result(conn)?;
    Ok(row.month)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = "cloud.deter_current";

    #[test]
    fn scene_query_groups_and_orders_by_view_date() {
        let sql = scene_sql(TABLE);
        assert!(sql.starts_with("SELECT satellite, path_row, view_date FROM cloud.deter_current"));
        assert!(sql.contains("publish_month = $1"));
        assert!(sql.contains("satellite = $2"));
        assert!(sql.contains("GROUP BY satellite, path_row, view_date"));
        assert!(sql.ends_with("ORDER BY view_date ASC"));
    }

    #[test]
    fn closed_month_query_compares_against_the_bound_maximum() {
        // the closed-month check takes the catalog maximum from
        // max_publish_month as a parameter instead of re-deriving it
        let sql = closed_month_sql(TABLE);
        assert!(sql.contains("MAX(view_date) AS last_view"));
        assert!(sql.contains("GROUP BY publish_month"));
        assert!(sql.contains("last_view <= $1::date - INTERVAL '1 day'"));
        assert_eq!(max_month_sql(TABLE), format!("SELECT MAX(publish_month) AS month FROM {TABLE}"));
    }
}
