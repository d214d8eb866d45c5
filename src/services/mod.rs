pub mod calendar_service;
pub mod conflict_service;
pub mod schedule_utils;
