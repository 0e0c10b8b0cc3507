/// Request validation shared by the community and profile handlers.
///
/// Every text field is trimmed before its length is checked, and the
/// trimmed value is what gets stored.
use crate::errors::AppError;
use crate::models::{CommunityPostRequest, FeedbackRequest, ProfileRequest, TranslationRequest};
use phonenumber::country::Id as CountryId;
use phonenumber::Mode;
use regex::Regex;
use std::sync::OnceLock;

fn email_regex() -> &'static Regex {
    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    // RFC 5322 simplified: local@domain.tld
    EMAIL_REGEX.get_or_init(|| {
        Regex::new(
            r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)+$",
        )
        .expect("email regex is valid")
    })
}

/// Validate email address
///
/// Checks for:
/// - Basic email format (contains @ and a dotted domain)
/// - Minimum length requirements
pub fn is_valid_email(email: &str) -> bool {
    if email.len() < 5 || !email.contains('@') || !email.contains('.') {
        return false;
    }

    if !email_regex().is_match(email) {
        tracing::warn!("Invalid email format: {}", email);
        return false;
    }

    true
}

/// Validate and normalize an Indian phone number to E.164 (+919876543210).
///
/// Numbers with an explicit country code are accepted as long as they are
/// valid for that country.
pub fn validate_phone(raw: &str) -> Result<String, String> {
    if raw.trim().is_empty() || raw.len() < 8 {
        return Err("Phone too short".to_string());
    }

    match phonenumber::parse(Some(CountryId::IN), raw) {
        Ok(number) => {
            if phonenumber::is_valid(&number) {
                let formatted = number.format().mode(Mode::E164).to_string();
                tracing::debug!("Valid phone: {} -> {}", raw, formatted);
                Ok(formatted)
            } else {
                tracing::warn!("Invalid phone number: {}", raw);
                Err("Invalid phone number".to_string())
            }
        }
        Err(e) => {
            tracing::warn!("Failed to parse phone '{}': {:?}", raw, e);
            Err(format!("Parse error: {:?}", e))
        }
    }
}

/// Trims `value` and checks its length in characters.
pub fn clean_text(field: &str, value: &str, min: usize, max: usize) -> Result<String, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(format!("{} cannot be empty or just whitespace", field));
    }

    let len = trimmed.chars().count();
    if len < min || len > max {
        return Err(format!(
            "{} must be between {} and {} characters",
            field, min, max
        ));
    }

    Ok(trimmed.to_string())
}

/// Language codes are at least two characters and stored lower-case.
pub fn clean_language(field: &str, value: &str) -> Result<String, String> {
    let trimmed = value.trim();
    if trimmed.chars().count() < 2 {
        return Err(format!("{} code must be at least 2 characters", field));
    }
    Ok(trimmed.to_lowercase())
}

pub fn validate_feedback(req: FeedbackRequest) -> Result<FeedbackRequest, AppError> {
    let email = req.email.trim().to_lowercase();
    if !is_valid_email(&email) {
        return Err(AppError::BadRequest("A valid email address is required".to_string()));
    }

    Ok(FeedbackRequest {
        name: clean_text("Name", &req.name, 1, 100).map_err(AppError::BadRequest)?,
        email,
        message: clean_text("Message", &req.message, 10, 2000).map_err(AppError::BadRequest)?,
        language: clean_language("Language", &req.language).map_err(AppError::BadRequest)?,
    })
}

pub fn validate_post(req: CommunityPostRequest) -> Result<CommunityPostRequest, AppError> {
    Ok(CommunityPostRequest {
        author: clean_text("Author name", &req.author, 1, 100).map_err(AppError::BadRequest)?,
        title: clean_text("Title", &req.title, 5, 200).map_err(AppError::BadRequest)?,
        content: clean_text("Content", &req.content, 20, 5000).map_err(AppError::BadRequest)?,
        language: clean_language("Language", &req.language).map_err(AppError::BadRequest)?,
    })
}

pub fn validate_translation(req: TranslationRequest) -> Result<TranslationRequest, AppError> {
    let source_language = match req.source_language.trim() {
        "" => "auto".to_string(),
        other => other.to_lowercase(),
    };

    Ok(TranslationRequest {
        text: clean_text("Text", &req.text, 1, 5000).map_err(AppError::BadRequest)?,
        target_language: clean_language("Target language", &req.target_language)
            .map_err(AppError::BadRequest)?,
        source_language,
    })
}

pub fn validate_profile(req: ProfileRequest) -> Result<ProfileRequest, AppError> {
    let user_id = clean_text("User id", &req.user_id, 1, 128).map_err(AppError::BadRequest)?;
    let email = req.email.trim().to_lowercase();
    if !is_valid_email(&email) {
        return Err(AppError::BadRequest("A valid email address is required".to_string()));
    }

    let phone = if req.phone.trim().is_empty() {
        String::new()
    } else {
        validate_phone(&req.phone).map_err(AppError::BadRequest)?
    };

    let preferred_language = if req.preferred_language.trim().is_empty() {
        "en".to_string()
    } else {
        clean_language("Preferred language", &req.preferred_language)
            .map_err(AppError::BadRequest)?
    };

    Ok(ProfileRequest {
        user_id,
        name: clean_text("Name", &req.name, 1, 100).map_err(AppError::BadRequest)?,
        email,
        phone,
        location: req.location.trim().to_string(),
        farm_size: req.farm_size.trim().to_string(),
        farm_type: req.farm_type.trim().to_string(),
        preferred_language,
    })
}
