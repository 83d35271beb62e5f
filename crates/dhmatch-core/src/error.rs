use thiserror::Error;

#[derive(Error, Debug)]
pub enum MatchError {
    #[error("Invalid input shape: {0}")]
    InvalidInputShape(String),

    #[error("Singular Hessian at peak ({di}, {dj})")]
    SingularHessian { di: i64, dj: i64 },

    #[error("Root finder did not converge after {iterations} iterations")]
    SolverDidNotConverge { iterations: usize },

    #[error("Empty batch")]
    EmptyBatch,
}

pub type Result<T> = std::result::Result<T, MatchError>;
