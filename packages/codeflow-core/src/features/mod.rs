pub mod assembly;
pub mod chunking;
pub mod detection;
pub mod extraction;
pub mod llm;
pub mod parsing;
pub mod prompting;
pub mod rendering;
