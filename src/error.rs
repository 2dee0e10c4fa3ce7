use sea_orm::DbErr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("Sign in to continue")]
    AuthRequired,

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Only the owner can change this listing")]
    NotOwner,

    #[error("Forbidden")]
    Forbidden,

    #[error("Not Found")]
    NotFound,

    #[error("{0} is out of stock")]
    OutOfStock(String),

    #[error("A {0} submission is already in progress")]
    SubmissionPending(&'static str),

    #[error("Request cancelled")]
    Cancelled,

    #[error("Bad Request {0}")]
    BadRequest(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("ORM error")]
    OrmError(#[source] DbErr),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// True when the collaborator could not be reached at all.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, AppError::ServiceUnavailable(_))
    }

    /// Message surfaced to the UI action that triggered the failure.
    pub fn user_message(&self) -> String {
        match self {
            AppError::OrmError(_) | AppError::Internal(_) => {
                "Something went wrong, please try again".to_string()
            }
            AppError::ServiceUnavailable(_) => {
                "The marketplace is unreachable right now, please try again".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        match err {
            DbErr::ConnectionAcquire(e) => AppError::ServiceUnavailable(e.to_string()),
            DbErr::Conn(e) => AppError::ServiceUnavailable(e.to_string()),
            DbErr::RecordNotFound(_) | DbErr::RecordNotUpdated => AppError::NotFound,
            other => AppError::OrmError(other),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
