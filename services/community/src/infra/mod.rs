pub mod db;
pub mod jobs;
pub mod luma;
pub mod mailer;
