pub mod file_commands;
pub mod organize_commands;
