/// Integration tests for the monitoring pipeline covering CSV ingestion,
/// every model adapter end to end, scoring, status and report output.

mod helpers;
mod models;
mod pipeline;
mod reports;
