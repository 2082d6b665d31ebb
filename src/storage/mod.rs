pub mod migrations;
pub mod reader;
pub mod sqlite;
pub mod writer;
