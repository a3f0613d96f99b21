pub mod llm_service;
pub mod question_parser;
pub mod question_source;

pub use llm_service::LlmService;
pub use question_parser::parse_question_response;
pub use question_source::QuestionSource;
