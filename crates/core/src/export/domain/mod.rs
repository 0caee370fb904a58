pub mod capture_writer;
