use thiserror::Error;

#[derive(Debug, Error)]
pub enum StatsError {
    #[error("jump-length histogram needs at least one bin")]
    NoBins,

    #[error("jump-length histogram needs at least one hop with non-zero length")]
    NoHops,
}

pub type StatsResult<T> = Result<T, StatsError>;
