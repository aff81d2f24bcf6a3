pub mod class_channels;
pub mod content;
pub mod directory;
pub mod exam_logs;
pub mod learner_logs;
pub mod lessons;
pub mod offline_reports;
