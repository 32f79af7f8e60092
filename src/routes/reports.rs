//! Symptom report submission (multipart form) and listing.

use std::borrow::Cow;

use axum::{
    extract::{Multipart, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, info};
use validator::{Validate, ValidationError};

use super::AppState;
use crate::error::{AppError, Result};
use crate::models::{NewSymptomReport, SymptomReport};
use crate::regions;

// ---

const DEFAULT_REPORTS: u32 = 10;
const MAX_REPORTS: u32 = 200;
const GENDERS: [&str; 3] = ["Male", "Female", "Other"];

pub fn router() -> Router<AppState> {
    Router::new().route("/api/reports", get(list).post(submit))
}

/// Fields of the symptom report form after multipart decoding.
#[derive(Debug, Default, Validate)]
#[validate(schema(function = "validate_region"))]
pub struct SymptomReportForm {
    // ---
    #[validate(length(max = 100))]
    pub name: Option<String>,
    #[validate(range(min = 0, max = 150))]
    pub age: Option<i32>,
    #[validate(custom(function = "validate_gender"))]
    pub gender: String,
    #[validate(length(max = 15))]
    pub contact: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub village: String,
    #[validate(length(min = 1, max = 100))]
    pub state: String,
    #[validate(length(min = 1, max = 100))]
    pub district: String,
    #[validate(length(min = 1, message = "symptoms are required"))]
    pub symptoms: String,
    #[validate(length(max = 100))]
    pub disease: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub water_source: String,
    pub image_name: Option<String>,
    pub remarks: Option<String>,
}

fn validate_gender(gender: &str) -> std::result::Result<(), ValidationError> {
    if GENDERS.contains(&gender) {
        return Ok(());
    }
    Err(ValidationError::new("gender")
        .with_message(Cow::from("gender must be one of Male, Female, Other")))
}

fn validate_region(form: &SymptomReportForm) -> std::result::Result<(), ValidationError> {
    // ---
    if regions::is_known_district(&form.state, &form.district) {
        return Ok(());
    }
    Err(ValidationError::new("region").with_message(Cow::from(format!(
        "'{}' is not a district of '{}'",
        form.district, form.state
    ))))
}

impl SymptomReportForm {
    pub fn into_new_report(self) -> NewSymptomReport {
        NewSymptomReport {
            name: self.name,
            age: self.age,
            gender: self.gender,
            contact: self.contact,
            village: self.village,
            state: self.state,
            district: self.district,
            symptoms: self.symptoms,
            disease: self.disease,
            water_source: self.water_source,
            image_name: self.image_name,
            remarks: self.remarks,
            reported_at: Utc::now(),
        }
    }
}

/// Blank optional inputs are treated as absent.
fn optional(text: String) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

async fn read_form(mut multipart: Multipart) -> Result<SymptomReportForm> {
    // ---
    let mut form = SymptomReportForm {
        water_source: "Other".to_string(),
        ..SymptomReportForm::default()
    };

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        debug!("Failed to read multipart field: {}", e);
        AppError::Validation(format!("Failed to read multipart data: {}", e))
    })? {
        let field_name = field.name().unwrap_or("").to_string();

        if field_name == "image" {
            let file_name = field.file_name().map(str::to_string);
            let data = field.bytes().await.map_err(|e| {
                AppError::Validation(format!("Failed to read image data: {}", e))
            })?;
            // Browsers send an empty part when no file was chosen.
            if !data.is_empty() {
                debug!("Received image attachment ({} bytes)", data.len());
                form.image_name = file_name.and_then(optional);
            }
            continue;
        }

        let text = field.text().await.map_err(|e| {
            AppError::Validation(format!("Failed to read field '{}': {}", field_name, e))
        })?;

        match field_name.as_str() {
            "name" => form.name = optional(text),
            "age" => {
                form.age = optional(text)
                    .map(|v| {
                        v.parse::<i32>().map_err(|_| {
                            AppError::Validation(format!("age: '{}' is not a number", v))
                        })
                    })
                    .transpose()?
            }
            "gender" => form.gender = text.trim().to_string(),
            "contact" => form.contact = optional(text),
            "village" => form.village = text.trim().to_string(),
            "state" => form.state = text.trim().to_string(),
            "district" => form.district = text.trim().to_string(),
            "symptoms" => form.symptoms = text.trim().to_string(),
            "disease" => form.disease = optional(text),
            "water_source" => {
                if let Some(source) = optional(text) {
                    form.water_source = source;
                }
            }
            "remarks" => form.remarks = optional(text),
            _ => debug!("Ignoring unknown field: {}", field_name),
        }
    }

    Ok(form)
}

/// `POST /api/reports`: validate and store a symptom report.
async fn submit(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<SymptomReport>)> {
    // ---
    let form = read_form(multipart).await?;
    form.validate()?;

    let report = state.store.insert_report(form.into_new_report()).await?;
    info!(village = %report.village, district = %report.district, "symptom report stored");
    Ok((StatusCode::CREATED, Json(report)))
}

#[derive(Debug, Deserialize)]
struct ReportsQuery {
    limit: Option<u32>,
}

/// `GET /api/reports`: most recent reports first.
async fn list(
    State(state): State<AppState>,
    Query(params): Query<ReportsQuery>,
) -> Result<Json<Vec<SymptomReport>>> {
    // ---
    let limit = params.limit.unwrap_or(DEFAULT_REPORTS).clamp(1, MAX_REPORTS);
    Ok(Json(state.store.recent_reports(limit).await?))
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    fn valid_form() -> SymptomReportForm {
        SymptomReportForm {
            name: Some("Test User".to_string()),
            age: Some(25),
            gender: "Male".to_string(),
            contact: Some("9876543210".to_string()),
            village: "DemoVillage".to_string(),
            state: "Assam".to_string(),
            district: "Kamrup".to_string(),
            symptoms: "Fever, Dehydration".to_string(),
            disease: Some("Diarrhea".to_string()),
            water_source: "Other".to_string(),
            image_name: None,
            remarks: None,
        }
    }

    #[test]
    fn test_valid_form_passes() {
        // ---
        assert!(valid_form().validate().is_ok());
    }

    #[test]
    fn test_district_must_match_state() {
        // ---
        let form = SymptomReportForm {
            district: "Tura".to_string(),
            ..valid_form()
        };
        let err = form.validate().unwrap_err();
        assert!(err.to_string().contains("'Tura' is not a district of 'Assam'"));
    }

    #[test]
    fn test_field_rules() {
        // ---
        let bad_gender = SymptomReportForm {
            gender: "unknown".to_string(),
            ..valid_form()
        };
        assert!(bad_gender.validate().is_err());

        let long_contact = SymptomReportForm {
            contact: Some("1".repeat(16)),
            ..valid_form()
        };
        assert!(long_contact.validate().is_err());

        let no_symptoms = SymptomReportForm {
            symptoms: String::new(),
            ..valid_form()
        };
        assert!(no_symptoms.validate().is_err());

        let too_old = SymptomReportForm {
            age: Some(151),
            ..valid_form()
        };
        assert!(too_old.validate().is_err());
    }

    #[test]
    fn test_optional_trims_and_drops_blank() {
        // ---
        assert_eq!(optional("  x ".to_string()), Some("x".to_string()));
        assert_eq!(optional("   ".to_string()), None);
    }
}
