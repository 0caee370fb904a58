pub mod png_capture_writer;
