//! MySQL syntax details needed to render error-row inserts.

use crate::error::EncodingError;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, Default)]
pub struct MySql;

impl MySql {
    /// Wraps an identifier in backticks, doubling any embedded backtick.
    pub fn quote_identifier(&self, ident: &str) -> Result<String, EncodingError> {
        if ident.trim().is_empty() || ident.contains('\0') {
            return Err(EncodingError::InvalidIdentifier(ident.to_string()));
        }
        Ok(format!("`{}`", ident.replace('`', "``")))
    }

    /// Quotes `table` or `schema.table`.
    pub fn quote_table(&self, table: &str) -> Result<String, EncodingError> {
        match table.split_once('.') {
            Some((schema, name)) => Ok(format!(
                "{}.{}",
                self.quote_identifier(schema)?,
                self.quote_identifier(name)?
            )),
            None => self.quote_identifier(table),
        }
    }

    /// `DATETIME(6)` literal body.
    pub fn format_timestamp(&self, ts: &DateTime<Utc>) -> String {
        ts.naive_utc().format("%Y-%m-%d %H:%M:%S%.6f").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_quote_identifier() {
        let d = MySql;
        assert_eq!(d.quote_identifier("error_log").unwrap(), "`error_log`");
        assert_eq!(d.quote_identifier("we`ird").unwrap(), "`we``ird`");
        assert!(matches!(
            d.quote_identifier(""),
            Err(EncodingError::InvalidIdentifier(_))
        ));
    }

    #[test]
    fn test_quote_qualified_table() {
        let d = MySql;
        assert_eq!(d.quote_table("ops.error_log").unwrap(), "`ops`.`error_log`");
        assert!(d.quote_table("ops.").is_err());
    }

    #[test]
    fn test_format_timestamp() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(MySql.format_timestamp(&ts), "2024-03-09 14:05:07.000000");
    }
}
