use connectors::error::{DbError, SourceError};
use engine_core::retry::RetryDisposition;
use tokio_postgres::{Error as PgError, error::SqlState};

pub fn classify_source_error(err: &SourceError) -> RetryDisposition {
    if err.is_transient() {
        RetryDisposition::Retry
    } else {
        RetryDisposition::Stop
    }
}

pub fn classify_db_error(err: &DbError) -> RetryDisposition {
    match err {
        DbError::Io(_) => RetryDisposition::Retry,
        DbError::Sql(pg_err) => classify_pg_error(pg_err),
        DbError::Reconnect(_) => RetryDisposition::Retry,
        DbError::Write(_) => RetryDisposition::Stop,
        DbError::TableNotFound(_) => RetryDisposition::Stop,
        DbError::QueryBuildError(_) => RetryDisposition::Stop,
        DbError::Unknown(_) => RetryDisposition::Stop,
    }
}

fn classify_pg_error(err: &PgError) -> RetryDisposition {
    if err.is_closed() {
        return RetryDisposition::Retry;
    }

    if let Some(code) = err.code()
        && is_retryable_pg_code(code)
    {
        return RetryDisposition::Retry;
    }

    RetryDisposition::Stop
}

fn is_retryable_pg_code(code: &SqlState) -> bool {
    matches!(
        *code,
        SqlState::T_R_SERIALIZATION_FAILURE
            | SqlState::T_R_DEADLOCK_DETECTED
            | SqlState::LOCK_NOT_AVAILABLE
            | SqlState::TOO_MANY_CONNECTIONS
            | SqlState::ADMIN_SHUTDOWN
            | SqlState::CRASH_SHUTDOWN
            | SqlState::CANNOT_CONNECT_NOW
            | SqlState::CONNECTION_FAILURE
            | SqlState::CONNECTION_DOES_NOT_EXIST
            | SqlState::SQLCLIENT_UNABLE_TO_ESTABLISH_SQLCONNECTION
            | SqlState::SQLSERVER_REJECTED_ESTABLISHMENT_OF_SQLCONNECTION
            | SqlState::CONNECTION_EXCEPTION
            | SqlState::QUERY_CANCELED
            | SqlState::OPERATOR_INTERVENTION
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_errors() {
        let timeout = SourceError::Timeout { url: "u".into() };
        let status = SourceError::Status { url: "u".into(), status: 503 };
        let decode = SourceError::Decode { url: "u".into(), message: "bad json".into() };

        assert_eq!(classify_source_error(&timeout), RetryDisposition::Retry);
        assert_eq!(classify_source_error(&status), RetryDisposition::Retry);
        assert_eq!(classify_source_error(&decode), RetryDisposition::Stop);
    }

    #[test]
    fn db_errors() {
        let io = DbError::Io(std::io::Error::other("reset"));
        assert_eq!(classify_db_error(&io), RetryDisposition::Retry);
        let reconnect = DbError::Reconnect(connectors::error::ConnectorError::InvalidUrl("x".into()));
        assert_eq!(classify_db_error(&reconnect), RetryDisposition::Retry);
        assert_eq!(
            classify_db_error(&DbError::QueryBuildError("x".into())),
            RetryDisposition::Stop
        );
    }
}
