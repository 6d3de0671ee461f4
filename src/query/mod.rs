//! Q3C query text for cone searches and cross-matches.
//!
//! Only catalog identifiers are spliced into the SQL; they come from
//! validated descriptors. Positions, radii and the join tolerance stay as
//! `%(name)s` placeholders and are bound at execution time.

use crate::db::QueryParams;
use crate::domain::{CONE_TOLERANCE_DEG, ClusterRecord, PrimaryCatalog, ReferenceCatalog};

/// Bound parameters shared by a cluster's cone search and cross-matches.
pub fn cluster_params(cluster: &ClusterRecord) -> QueryParams {
    let mut params = QueryParams::new();
    params
        .set("cluster_ra", cluster.ra)
        .set("cluster_dec", cluster.dec)
        .set("radius", cluster.radius)
        .set("cone", CONE_TOLERANCE_DEG);
    params
}

/// All primary-catalog rows within `radius` of the cluster center.
pub fn cone_search_sql(primary: &PrimaryCatalog) -> String {
    format!(
        "SELECT *\n\
         FROM {table}\n\
         WHERE q3c_radial_query(ra, dec, %(cluster_ra)s, %(cluster_dec)s, %(radius)s)",
        table = primary.table
    )
}

/// The cone search joined against `reference` within the cone tolerance.
pub fn cross_match_sql(primary: &PrimaryCatalog, reference: &ReferenceCatalog) -> String {
    let alias = primary.alias;
    let short = reference.short_name();
    format!(
        "WITH {alias} AS (\n\
         {cone}\n\
         )\n\
         SELECT * FROM {alias}, {table} AS {short}\n\
         WHERE q3c_join(\n\
         {alias}.ra, {alias}.dec,\n\
         {short}.ra, {short}.{dec},\n\
         %(cone)s)",
        cone = cone_search_sql(primary),
        table = reference.table(),
        dec = reference.dec_column(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::bind_named;
    use crate::domain::TGAS;

    fn hyades() -> ClusterRecord {
        ClusterRecord {
            name: "Hyades".into(),
            ra: 67.0,
            dec: 16.0,
            radius: 5.0,
            count: 100.0,
        }
    }

    #[test]
    fn cone_search_binds_cluster_position() {
        let bound = bind_named(&cone_search_sql(&TGAS), &cluster_params(&hyades())).unwrap();
        assert!(bound.sql.contains("FROM gaia_dr1.tgas_source"));
        assert!(bound.sql.contains("q3c_radial_query(ra, dec, $1, $2, $3)"));
        assert_eq!(bound.values, vec![67.0, 16.0, 5.0]);
        assert!(!bound.sql.contains("67"));
    }

    #[test]
    fn cone_tolerance_does_not_follow_radius() {
        let mut wide = hyades();
        wide.radius = 20.0;
        assert_eq!(cluster_params(&wide).get("cone"), Some(1.0 / 3600.0));
        assert_eq!(cluster_params(&hyades()).get("cone"), Some(1.0 / 3600.0));
    }

    #[test]
    fn cross_match_uses_per_catalog_dec_column() {
        let refs = ReferenceCatalog::defaults();

        let apass = cross_match_sql(&TGAS, &refs[0]);
        assert!(apass.contains("FROM tgas, apassdr9.main AS apassdr9"));
        assert!(apass.contains("apassdr9.ra, apassdr9.dec,"));

        let twomass = cross_match_sql(&TGAS, &refs[1]);
        assert!(twomass.contains("twomass.ra, twomass.decl,"));

        let unwise = cross_match_sql(&TGAS, &refs[2]);
        assert!(unwise.contains("unwise.ra, unwise.dec,"));
    }

    #[test]
    fn cross_match_binds_all_four_parameters() {
        let twomass = ReferenceCatalog::new("twomass.psc", "decl").unwrap();
        let bound = bind_named(&cross_match_sql(&TGAS, &twomass), &cluster_params(&hyades())).unwrap();

        assert!(bound.sql.starts_with("WITH tgas AS ("));
        assert!(bound.sql.contains("q3c_radial_query(ra, dec, $1, $2, $3)"));
        assert!(bound.sql.contains("tgas.ra, tgas.dec,"));
        assert!(bound.sql.ends_with("$4)"));
        assert_eq!(bound.names, vec!["cluster_ra", "cluster_dec", "radius", "cone"]);
        assert_eq!(bound.values, vec![67.0, 16.0, 5.0, 1.0 / 3600.0]);
    }
}
