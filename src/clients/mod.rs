pub mod google_calendar;
pub mod openai_client;
pub mod slack_client;

pub type ClientError = Box<dyn std::error::Error + Send + Sync>;
