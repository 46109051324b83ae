use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
pub enum Rank {
    #[serde(rename = "Professor")]
    #[sqlx(rename = "Professor")]
    Professor,
    #[serde(rename = "Associate Professor")]
    #[sqlx(rename = "Associate Professor")]
    AssociateProfessor,
    #[serde(rename = "Assistant Professor")]
    #[sqlx(rename = "Assistant Professor")]
    AssistantProfessor,
}

impl Rank {
    /// Review order: professors first.
    pub fn priority(self) -> u8 {
        match self {
            Rank::Professor => 1,
            Rank::AssociateProfessor => 2,
            Rank::AssistantProfessor => 3,
        }
    }

    pub fn is_senior(self) -> bool {
        matches!(self, Rank::Professor | Rank::AssociateProfessor)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Faculty {
    pub staff_id: String,
    pub name: String,
    pub rank: Rank,
    pub is_senior: bool,
    pub max_load_clh: f64,
    pub current_load_clh: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFacultyRequest {
    /// Identity issued by the auth provider. Generated when absent.
    #[serde(default)]
    pub staff_id: Option<String>,
    pub name: String,
    pub rank: Rank,
    #[serde(default = "default_max_load")]
    pub max_load_clh: f64,
    #[serde(default)]
    pub current_load_clh: f64,
}

fn default_max_load() -> f64 {
    14.0
}

impl NewFacultyRequest {
    pub fn check(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("faculty name must not be empty".to_string());
        }
        if self.max_load_clh < 0.0 || self.current_load_clh < 0.0 {
            return Err("load values must not be negative".to_string());
        }
        if self.current_load_clh > self.max_load_clh {
            return Err(format!(
                "baseline load {} exceeds ceiling {}",
                self.current_load_clh, self.max_load_clh
            ));
        }
        Ok(())
    }
}
