use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Where rejected rows are written: one table in one relational database.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SinkTarget {
    pub host: String,
    pub port: u16,
    pub user: String,
    #[serde(default)]
    pub password: String,
    pub database: String,
    pub table: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TargetIssue {
    #[error("host must not be empty")]
    EmptyHost,

    #[error("port must be non-zero")]
    ZeroPort,

    #[error("user must not be empty")]
    EmptyUser,

    #[error("database must not be empty")]
    EmptyDatabase,

    #[error("table must not be empty")]
    EmptyTable,

    /// A blank or NUL-carrying part in `table` or `schema.table`.
    #[error("table '{0}' is not a valid identifier")]
    InvalidTable(String),
}

impl SinkTarget {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        user: impl Into<String>,
        password: impl Into<String>,
        database: impl Into<String>,
        table: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            user: user.into(),
            password: password.into(),
            database: database.into(),
            table: table.into(),
        }
    }

    /// Checks every field that a connection attempt depends on.
    pub fn validate(&self) -> Result<(), TargetIssue> {
        if self.host.trim().is_empty() {
            return Err(TargetIssue::EmptyHost);
        }
        if self.port == 0 {
            return Err(TargetIssue::ZeroPort);
        }
        if self.user.trim().is_empty() {
            return Err(TargetIssue::EmptyUser);
        }
        if self.database.trim().is_empty() {
            return Err(TargetIssue::EmptyDatabase);
        }
        if self.table.trim().is_empty() {
            return Err(TargetIssue::EmptyTable);
        }

        let parts = match self.table.split_once('.') {
            Some((schema, name)) => vec![schema, name],
            None => vec![self.table.as_str()],
        };
        if parts
            .iter()
            .any(|part| part.trim().is_empty() || part.contains('\0'))
        {
            return Err(TargetIssue::InvalidTable(self.table.clone()));
        }
        Ok(())
    }

    /// `database.table`, for log lines.
    pub fn qualified_table(&self) -> String {
        format!("{}.{}", self.database, self.table)
    }
}

// Hand-written so the password never reaches a log line.
impl fmt::Debug for SinkTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinkTarget")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"***")
            .field("database", &self.database)
            .field("table", &self.table)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> SinkTarget {
        SinkTarget::new("localhost", 3306, "loader", "s3cret", "load_errors", "error_log")
    }

    #[test]
    fn test_validate_accepts_complete_target() {
        assert_eq!(target().validate(), Ok(()));
    }

    #[test]
    fn test_validate_reports_first_issue() {
        let mut t = target();
        t.port = 0;
        assert_eq!(t.validate(), Err(TargetIssue::ZeroPort));

        let mut t = target();
        t.table = "  ".to_string();
        assert_eq!(t.validate(), Err(TargetIssue::EmptyTable));
    }

    #[test]
    fn test_validate_rejects_unrenderable_table() {
        for table in ["ops.", ".error_log", "ops. ", "error\0log"] {
            let mut t = target();
            t.table = table.to_string();
            assert_eq!(
                t.validate(),
                Err(TargetIssue::InvalidTable(table.to_string())),
                "table {table:?}"
            );
        }

        let mut t = target();
        t.table = "ops.error_log".to_string();
        assert_eq!(t.validate(), Ok(()));
        assert_eq!(
            TargetIssue::InvalidTable("ops.".into()).to_string(),
            "table 'ops.' is not a valid identifier"
        );
    }

    #[test]
    fn test_debug_hides_password() {
        let rendered = format!("{:?}", target());
        assert!(!rendered.contains("s3cret"));
        assert!(rendered.contains("error_log"));
    }

    #[test]
    fn test_password_defaults_to_empty() {
        let json = r#"{"host":"db","port":3306,"user":"u","database":"d","table":"t"}"#;
        let t: SinkTarget = serde_json::from_str(json).unwrap();
        assert_eq!(t.password, "");
        assert_eq!(t.qualified_table(), "d.t");
    }
}
