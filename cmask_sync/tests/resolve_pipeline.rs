//! Listing parse → catalog match → URL resolution, end to end on canned
//! directory-index HTML.

use chrono::NaiveDate;
use cmask_sync::catalog::CatalogRecord;
use cmask_sync::listing::parse_directory_listing;
use cmask_sync::resolve::resolve_all;
use cmask_sync::satellite::Satellite;

const BASE: &str = "http://www.dpi.inpe.br/catalog/tmp";

const CBERS4A_INDEX: &str = r#"<html><body>
    <a href="?C=N;O=D">Name</a>
    <a href="?C=M;O=A">Last modified</a>
    <a href="?C=S;O=A">Size</a>
    <a href="?C=D;O=A">Description</a>
    <a href="/catalog/tmp/CBERS4A/">Parent Directory</a>
    <a href="CBERS_4A_WFI_RAW_2023_05_04.13_00_00_ETC2/">CBERS_4A_WFI_RAW_2023_05_04.13_00_00_ETC2/</a>
    <a href="CBERS_4A_WFI_RAW_2023_05_09.13_20_00_ETC2/">CBERS_4A_WFI_RAW_2023_05_09.13_20_00_ETC2/</a>
    <a href="/catalog/tmp/">root</a>
    </body></html>"#;

#[test]
fn listed_subpaths_resolve_to_download_urls() {
    let subpaths = parse_directory_listing(CBERS4A_INDEX);
    assert_eq!(subpaths.len(), 2);

    let records = vec![
        CatalogRecord {
            satellite: Satellite::Cbers4a,
            path_row: "207_133".to_string(),
            view_date: NaiveDate::from_ymd_opt(2023, 5, 4).unwrap(),
        },
        // published in the month but with no listed directory
        CatalogRecord {
            satellite: Satellite::Cbers4a,
            path_row: "210_140".to_string(),
            view_date: NaiveDate::from_ymd_opt(2023, 5, 21).unwrap(),
        },
    ];

    let items = resolve_all(BASE, &records, &subpaths);
    assert_eq!(items.len(), 1);
    assert_eq!(
        items[0].tif_name,
        "CBERS_4A_WFI_20230504_207_133_L4_CMASK_GRID_SURFACE.tif"
    );
    assert_eq!(
        items[0].url,
        concat!(
            "http://www.dpi.inpe.br/catalog/tmp/CBERS4A/2023_05/",
            "CBERS_4A_WFI_RAW_2023_05_04.13_00_00_ETC2/207_133_0/4_BC_UTM_WGS84/",
            "CBERS_4A_WFI_20230504_207_133_L4_CMASK_GRID_SURFACE.tif"
        )
    );
}
