// Library interface for dailybrief modules
// This allows tests and the diagnostic binaries to import modules

pub mod collector;
pub mod ingestion;
pub mod llm;
pub mod model;
pub mod output;
pub mod report;
pub mod run;
pub mod scraping;
