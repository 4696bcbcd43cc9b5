use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use serde_json::Value;
use uuid::Uuid;

use crate::domain::errors::DomainError;

/// Star rating between 1 and 5 inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RatingValue(u8);

impl RatingValue {
    pub const MIN: i64 = 1;
    pub const MAX: i64 = 5;

    /// # Example
    /// ```
    /// use store_ratings_api::domain::rating::RatingValue;
    ///
    /// assert_eq!(RatingValue::new(4).unwrap().get(), 4);
    /// assert!(RatingValue::new(6).is_err());
    /// ```
    pub fn new(value: i64) -> Result<Self, DomainError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(Self::invalid())
        }
    }

    /// Parses a raw JSON value, accepting only integral numbers
    ///
    /// `4.0` counts as an integer; `4.5`, strings, booleans and null do not.
    pub fn from_json(value: &Value) -> Result<Self, DomainError> {
        let Value::Number(number) = value else {
            return Err(Self::invalid());
        };
        if let Some(int) = number.as_i64() {
            return Self::new(int);
        }
        match number.as_f64() {
            Some(float) if float.fract() == 0.0 && float.abs() <= i64::MAX as f64 => {
                Self::new(float as i64)
            }
            _ => Err(Self::invalid()),
        }
    }

    pub fn get(&self) -> i32 {
        i32::from(self.0)
    }

    fn invalid() -> DomainError {
        DomainError::validation("rating must be an integer between 1 and 5")
    }
}

impl Serialize for RatingValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.0)
    }
}

/// One user's rating of one store; unique per (user_id, store_id)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Rating {
    pub id: Uuid,
    pub user_id: Uuid,
    pub store_id: Uuid,
    pub rating: RatingValue,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Rating {
    pub fn new(user_id: Uuid, store_id: Uuid, rating: RatingValue) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            store_id,
            rating,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Identity of the user who left a rating, as shown to store owners
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rater {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// Rating row joined with its author
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingWithRater {
    pub id: Uuid,
    pub rating: RatingValue,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user: Rater,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_one_through_five() {
        for v in 1..=5 {
            assert_eq!(RatingValue::new(v).unwrap().get(), v as i32);
        }
    }

    #[test]
    fn rejects_out_of_range() {
        assert!(RatingValue::new(0).is_err());
        assert!(RatingValue::new(6).is_err());
        assert!(RatingValue::new(-1).is_err());
    }

    #[test]
    fn json_integers_only() {
        assert_eq!(RatingValue::from_json(&json!(3)).unwrap().get(), 3);
        assert_eq!(RatingValue::from_json(&json!(5.0)).unwrap().get(), 5);
        assert!(RatingValue::from_json(&json!(4.5)).is_err());
        assert!(RatingValue::from_json(&json!("4")).is_err());
        assert!(RatingValue::from_json(&json!(null)).is_err());
        assert!(RatingValue::from_json(&json!(true)).is_err());
        assert!(RatingValue::from_json(&json!(6)).is_err());
    }

    #[test]
    fn serializes_as_number() {
        let value = RatingValue::new(4).unwrap();
        assert_eq!(serde_json::to_value(value).unwrap(), json!(4));
    }
}
