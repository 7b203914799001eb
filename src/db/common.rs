use crate::{
    db::error::{DbError, DbResult},
    models::IdentitySource,
};

/// Parse an identity source column, returning a DbError on unknown values
pub fn parse_source(s: &str) -> DbResult<IdentitySource> {
    s.parse()
        .map_err(|e| DbError::Internal(format!("Invalid identity source in database: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_source() {
        assert_eq!(parse_source("vlt_affiliate").unwrap(), IdentitySource::VltAffiliate);
        assert!(matches!(parse_source("oidc"), Err(DbError::Internal(_))));
    }
}
