pub mod extractor;
pub mod google;
pub mod jwt;
pub mod password;
pub mod recaptcha;
pub mod tokens;
