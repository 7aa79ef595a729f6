pub mod extractor;
pub mod vocabulary;
