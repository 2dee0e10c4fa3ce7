use serde::{Deserialize, Serialize};

use crate::dto::{optional_text, require_text};
use crate::enums::{Location, Role, SPECIALTY_OPTIONS};
use crate::error::{AppError, AppResult};

pub const MIN_PASSWORD_LEN: usize = 6;
pub const MIN_SPECIALTIES: usize = 2;

/// Registration form values.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProfileDraft {
    pub name: String,
    pub email: String,
    pub role: Role,
    pub phone: Option<String>,
    pub location: String,
    pub experience_years: Option<i64>,
    #[serde(default)]
    pub specialties: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewProfile {
    pub name: String,
    pub email: String,
    pub role: Role,
    pub phone: Option<String>,
    pub location: Location,
    pub electrician: Option<ElectricianDetails>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElectricianDetails {
    pub experience_years: u32,
    pub specialties: Vec<String>,
}

impl ProfileDraft {
    pub fn validate(&self, password: &str) -> AppResult<NewProfile> {
        let name = require_text("name", &self.name)?;
        let email = normalize_email(&self.email)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::Validation(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        let location = require_text("location", &self.location)?.parse::<Location>()?;

        let electrician = match self.role {
            Role::Electrician => {
                let experience_years = match self.experience_years {
                    Some(years) if years >= 1 => u32::try_from(years).map_err(|_| {
                        AppError::Validation("years of experience is too large".into())
                    })?,
                    _ => {
                        return Err(AppError::Validation(
                            "electricians need at least 1 year of experience".into(),
                        ));
                    }
                };
                let mut specialties: Vec<String> = Vec::new();
                for specialty in self.specialties.iter().map(|s| s.trim()) {
                    if specialty.is_empty() {
                        continue;
                    }
                    if !SPECIALTY_OPTIONS.contains(&specialty) {
                        return Err(AppError::Validation(format!(
                            "unknown specialty `{specialty}`"
                        )));
                    }
                    if !specialties.iter().any(|s| s == specialty) {
                        specialties.push(specialty.to_string());
                    }
                }
                if specialties.len() < MIN_SPECIALTIES {
                    return Err(AppError::Validation(format!(
                        "electricians must pick at least {MIN_SPECIALTIES} specialties"
                    )));
                }
                Some(ElectricianDetails {
                    experience_years,
                    specialties,
                })
            }
            Role::Customer | Role::Seller => None,
        };

        Ok(NewProfile {
            name,
            email,
            role: self.role,
            phone: optional_text(self.phone.as_deref()),
            location,
            electrician,
        })
    }
}

/// Editable profile fields. Email and role are fixed.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProfilePatch {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileChanges {
    pub name: Option<String>,
    /// `Some(None)` clears the phone number.
    pub phone: Option<Option<String>>,
    pub location: Option<Location>,
}

impl ProfilePatch {
    pub fn validate(&self) -> AppResult<ProfileChanges> {
        Ok(ProfileChanges {
            name: self
                .name
                .as_deref()
                .map(|n| require_text("name", n))
                .transpose()?,
            phone: self.phone.as_deref().map(|p| optional_text(Some(p))),
            location: self
                .location
                .as_deref()
                .map(|l| l.trim().parse())
                .transpose()?,
        })
    }
}

pub fn normalize_email(email: &str) -> AppResult<String> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
        _ => Err(AppError::Validation("a valid email address is required".into())),
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub exp: usize,
}
