// src/services.rs
pub mod extract;
pub mod judge;
pub mod sniff;

pub use extract::{extract_code, to_greyscale_png, TesseractExtractor, TextExtractor};
pub use judge::{classify, ExecutionReport, JudgeClient};
pub use sniff::{detect_language, Language};
