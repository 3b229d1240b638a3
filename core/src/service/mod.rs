pub mod dto;
pub mod report;
