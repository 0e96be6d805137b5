use thiserror::Error;

/// Failure of the layered layout capability. Data problems never end up here;
/// they are recovered and recorded as anomalies instead.
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("layered layout engine failed: {0}")]
    Engine(String),
    #[error("layered layout task did not complete: {0}")]
    EngineTask(String),
}
