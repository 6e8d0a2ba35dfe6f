use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Io,
    Parse,
    NotFound,
    InvalidArgument,
    InvalidState,
    Internal,
    Corruption,
    /// Data source dropped the connection; the fetch can be resumed.
    Disconnected,
    /// Data source rejected the request; retrying will not help.
    Source,
    Precondition,
    Worker,
}

#[derive(Debug)]
pub struct Error {
    pub kind: ErrorKind,
    pub context: String,
}

impl Error {
    pub fn new(kind: ErrorKind, context: String) -> Self {
        Error { kind, context }
    }

    pub fn disconnected(context: impl Into<String>) -> Self {
        Error::new(ErrorKind::Disconnected, context.into())
    }

    pub fn is_transient(&self) -> bool {
        self.kind == ErrorKind::Disconnected
    }

    /// Prepend `what` to the context, keeping the kind.
    pub fn within(self, what: &str) -> Self {
        Error {
            kind: self.kind,
            context: format!("{}: {}", what, self.context),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.context)
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error {
            kind: ErrorKind::Io,
            context: err.to_string(),
        }
    }
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Error {
            kind: ErrorKind::Parse,
            context: err.to_string(),
        }
    }
}

impl From<fst::Error> for Error {
    fn from(err: fst::Error) -> Self {
        Error {
            kind: ErrorKind::Internal,
            context: format!("FST error: {}", err),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error {
            kind: ErrorKind::Parse,
            context: err.to_string(),
        }
    }
}

impl From<lz4_flex::block::DecompressError> for Error {
    fn from(err: lz4_flex::block::DecompressError) -> Self {
        Error {
            kind: ErrorKind::Corruption,
            context: format!("LZ4 error: {}", err),
        }
    }
}

// MySQL error numbers for a server that went away mid-session.
const ER_SERVER_SHUTDOWN: u16 = 1053;
const CR_SERVER_GONE_ERROR: u16 = 2006;
const CR_SERVER_LOST: u16 = 2013;

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        let kind = match &err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Protocol(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => ErrorKind::Disconnected,
            sqlx::Error::Database(db) => {
                match db.try_downcast_ref::<sqlx::mysql::MySqlDatabaseError>().map(|e| e.number()) {
                    Some(ER_SERVER_SHUTDOWN | CR_SERVER_GONE_ERROR | CR_SERVER_LOST) => {
                        ErrorKind::Disconnected
                    }
                    _ => ErrorKind::Source,
                }
            }
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => ErrorKind::Parse,
            _ => ErrorKind::Source,
        };
        Error {
            kind,
            context: format!("SQL error: {}", err),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_decode() {
            ErrorKind::Parse
        } else if err.is_status() {
            ErrorKind::Source
        } else {
            ErrorKind::Disconnected
        };
        Error {
            kind,
            context: format!("SPARQL error: {}", err),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_timeouts_are_transient() {
        let err: Error = sqlx::Error::PoolTimedOut.into();
        assert!(err.is_transient());

        let err: Error = sqlx::Error::RowNotFound.into();
        assert_eq!(err.kind, ErrorKind::Source);
        assert!(!err.is_transient());
    }

    #[test]
    fn io_errors_are_not_transient() {
        let err: Error = std::io::Error::new(std::io::ErrorKind::Other, "disk full").into();
        assert_eq!(err.kind, ErrorKind::Io);
        assert!(!err.is_transient());
        assert_eq!(err.within("shard 3").context, "shard 3: disk full");
    }
}
