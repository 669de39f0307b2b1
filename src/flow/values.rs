//! Example input values for generated steps. Deliberately fixed: generated
//! tests are scaffolding, not oracle data.

use crate::element::element_model::PageElement;

pub const EMAIL: &str = "test@example.com";
pub const PASSWORD: &str = "Password123!";
pub const PHONE: &str = "555-0123";
pub const NUMBER: &str = "42";
pub const DATE: &str = "2024-01-01";
pub const PERSON_NAME: &str = "Test User";
pub const GENERIC: &str = "test value";

pub const LOGIN_EMAIL: &str = "user@example.com";
pub const LOGIN_PASSWORD: &str = "password123";
pub const SEARCH_QUERY: &str = "test query";
pub const FORM_TEXT: &str = "Test Value";
pub const FORM_MESSAGE: &str = "Test message";
pub const SELECT_OPTION: &str = "option1";

/// Value for an extracted input, sniffed from its `type` and `name`.
pub fn mock_value(input: &PageElement) -> &'static str {
    let input_type = input
        .attribute("type")
        .map(str::to_lowercase)
        .unwrap_or_else(|| "text".to_string());
    let name = input.attribute("name").unwrap_or_default().to_lowercase();

    if input_type == "email" || name.contains("email") {
        EMAIL
    } else if input_type == "password" || name.contains("password") {
        PASSWORD
    } else if input_type == "tel" || name.contains("phone") {
        PHONE
    } else if input_type == "number" {
        NUMBER
    } else if input_type == "date" {
        DATE
    } else if name.contains("name") {
        PERSON_NAME
    } else {
        GENERIC
    }
}
