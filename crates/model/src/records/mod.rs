pub mod error_record;
