// src/models/teacher.rs

use serde::Deserialize;
use validator::Validate;

use crate::models::attempt::ClassFilter;

/// DTO for the teacher key check. `city` and `school` narrow the result.
#[derive(Debug, Deserialize, Validate)]
pub struct VerifyKeyRequest {
    #[validate(required, length(min = 1, max = 256))]
    pub key: Option<String>,
    pub city: Option<String>,
    pub school: Option<String>,
}

impl VerifyKeyRequest {
    pub fn filter(&self) -> ClassFilter {
        ClassFilter {
            city: self.city.clone(),
            school: self.school.clone(),
        }
    }
}
