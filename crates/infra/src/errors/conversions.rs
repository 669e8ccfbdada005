//! Conversions from external infrastructure errors into domain errors.

use calarm_domain::CalarmError;
use r2d2::Error as PoolError;
use rrule::RRuleError;
use rusqlite::Error as SqlError;
use tokio::task::JoinError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub CalarmError);

impl From<InfraError> for CalarmError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<CalarmError> for InfraError {
    fn from(value: CalarmError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoCalarmError {
    fn into_calarm(self) -> CalarmError;
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → CalarmError */
/* -------------------------------------------------------------------------- */

impl IntoCalarmError for SqlError {
    fn into_calarm(self) -> CalarmError {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        match self {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match (err.code, err.extended_code) {
                    (ErrorCode::DatabaseBusy, _) => CalarmError::Database("database is busy".into()),
                    (ErrorCode::DatabaseLocked, _) => {
                        CalarmError::Database("database is locked".into())
                    }
                    (ErrorCode::ConstraintViolation, 1555 | 2067) => {
                        CalarmError::Database("unique constraint violation".into())
                    }
                    (ErrorCode::ReadOnly, _) => {
                        CalarmError::Database("database is read-only".into())
                    }
                    _ => CalarmError::Database(format!(
                        "sqlite failure {:?} (code {}): {}",
                        err.code, err.extended_code, message
                    )),
                }
            }
            RE::QueryReturnedNoRows => CalarmError::NotFound("no rows returned by query".into()),
            RE::FromSqlConversionFailure(_, _, cause) => {
                CalarmError::Database(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, name, ty) => {
                CalarmError::Database(format!("invalid column type for {name}: {ty}"))
            }
            RE::Utf8Error(_) => CalarmError::Database("invalid UTF-8 returned from sqlite".into()),
            RE::InvalidParameterName(parameter_name) => {
                CalarmError::Database(format!("invalid parameter name: {parameter_name}"))
            }
            RE::InvalidPath(path) => CalarmError::Database(format!(
                "invalid database path: {}",
                path.to_string_lossy()
            )),
            RE::InvalidQuery => CalarmError::Database("invalid SQL query".into()),
            other => CalarmError::Database(other.to_string()),
        }
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        InfraError(value.into_calarm())
    }
}

/* -------------------------------------------------------------------------- */
/* r2d2::Error → CalarmError */
/* -------------------------------------------------------------------------- */

impl IntoCalarmError for PoolError {
    fn into_calarm(self) -> CalarmError {
        CalarmError::Database(format!("connection pool error: {self}"))
    }
}

impl From<PoolError> for InfraError {
    fn from(value: PoolError) -> Self {
        InfraError(value.into_calarm())
    }
}

/* -------------------------------------------------------------------------- */
/* tokio::task::JoinError → CalarmError */
/* -------------------------------------------------------------------------- */

impl IntoCalarmError for JoinError {
    fn into_calarm(self) -> CalarmError {
        if self.is_cancelled() {
            CalarmError::Internal("blocking database task was cancelled".into())
        } else {
            CalarmError::Internal(format!("blocking database task panicked: {self}"))
        }
    }
}

impl From<JoinError> for InfraError {
    fn from(value: JoinError) -> Self {
        InfraError(value.into_calarm())
    }
}

/* -------------------------------------------------------------------------- */
/* rrule::RRuleError → CalarmError */
/* -------------------------------------------------------------------------- */

impl IntoCalarmError for RRuleError {
    fn into_calarm(self) -> CalarmError {
        CalarmError::Recurrence(self.to_string())
    }
}

impl From<RRuleError> for InfraError {
    fn from(value: RRuleError) -> Self {
        InfraError(value.into_calarm())
    }
}
