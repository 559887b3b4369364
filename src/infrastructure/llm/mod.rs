pub mod keyword;
pub mod openai;
pub mod prompt;

pub use keyword::KeywordIntentParser;
pub use openai::OpenAiIntentParser;
