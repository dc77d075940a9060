//! Concrete adapter implementations for ports.

pub mod cached_data_port;
pub mod csv_adapter;
pub mod csv_table_adapter;
pub mod file_config_adapter;
pub mod score_file_adapter;
