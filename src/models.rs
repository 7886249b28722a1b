// ABOUTME: Core domain models for users, bikes and rentals
// ABOUTME: Each record declares its column binding table for the generic row mapper
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::database::mapper::{ColumnBinding, FieldSetter, TableRecord};

/// A registered rider or administrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Database identifier.
    pub id: i64,
    /// Email address, unique across live accounts.
    pub email: String,
    /// Bcrypt hash of the password. Never serialized in responses.
    #[serde(skip_serializing)]
    pub hashed_password: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Soft-delete flag; deleted accounts cannot log in.
    pub deleted: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Default for User {
    fn default() -> Self {
        Self {
            id: 0,
            email: String::new(),
            hashed_password: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            deleted: false,
            created_at: DateTime::UNIX_EPOCH,
            updated_at: DateTime::UNIX_EPOCH,
        }
    }
}

impl TableRecord for User {
    const TABLE: &'static str = "users";

    fn bindings() -> &'static [ColumnBinding<Self>] {
        static BINDINGS: &[ColumnBinding<User>] = &[
            ColumnBinding {
                field: "Id",
                nullable: false,
                setter: FieldSetter::Integer(|u, v| u.id = v),
            },
            ColumnBinding {
                field: "Email",
                nullable: false,
                setter: FieldSetter::Text(|u, v| u.email = v),
            },
            ColumnBinding {
                field: "HashedPassword",
                nullable: false,
                setter: FieldSetter::Text(|u, v| u.hashed_password = v),
            },
            ColumnBinding {
                field: "FirstName",
                nullable: false,
                setter: FieldSetter::Text(|u, v| u.first_name = v),
            },
            ColumnBinding {
                field: "LastName",
                nullable: false,
                setter: FieldSetter::Text(|u, v| u.last_name = v),
            },
            ColumnBinding {
                field: "Deleted",
                nullable: false,
                setter: FieldSetter::Bool(|u, v| u.deleted = v),
            },
            ColumnBinding {
                field: "CreatedAt",
                nullable: false,
                setter: FieldSetter::Timestamp(|u, v| u.created_at = v),
            },
            ColumnBinding {
                field: "UpdatedAt",
                nullable: false,
                setter: FieldSetter::Timestamp(|u, v| u.updated_at = v),
            },
        ];
        BINDINGS
    }
}

/// A bicycle in the fleet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bike {
    /// Database identifier.
    pub id: i64,
    /// Whether the bike can currently be rented.
    pub is_available: bool,
    /// Current latitude in degrees.
    pub latitude: f64,
    /// Current longitude in degrees.
    pub longitude: f64,
    /// Rental price per whole minute.
    pub cost_per_minute: f64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Default for Bike {
    fn default() -> Self {
        Self {
            id: 0,
            is_available: false,
            latitude: 0.0,
            longitude: 0.0,
            cost_per_minute: 0.0,
            created_at: DateTime::UNIX_EPOCH,
            updated_at: DateTime::UNIX_EPOCH,
        }
    }
}

impl TableRecord for Bike {
    const TABLE: &'static str = "bikes";

    fn bindings() -> &'static [ColumnBinding<Self>] {
        static BINDINGS: &[ColumnBinding<Bike>] = &[
            ColumnBinding {
                field: "Id",
                nullable: false,
                setter: FieldSetter::Integer(|b, v| b.id = v),
            },
            ColumnBinding {
                field: "IsAvailable",
                nullable: false,
                setter: FieldSetter::Bool(|b, v| b.is_available = v),
            },
            ColumnBinding {
                field: "Latitude",
                nullable: false,
                setter: FieldSetter::Float(|b, v| b.latitude = v),
            },
            ColumnBinding {
                field: "Longitude",
                nullable: false,
                setter: FieldSetter::Float(|b, v| b.longitude = v),
            },
            ColumnBinding {
                field: "CostPerMinute",
                nullable: false,
                setter: FieldSetter::Float(|b, v| b.cost_per_minute = v),
            },
            ColumnBinding {
                field: "CreatedAt",
                nullable: false,
                setter: FieldSetter::Timestamp(|b, v| b.created_at = v),
            },
            ColumnBinding {
                field: "UpdatedAt",
                nullable: false,
                setter: FieldSetter::Timestamp(|b, v| b.updated_at = v),
            },
        ];
        BINDINGS
    }
}

/// Lifecycle state of a rental.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RentalStatus {
    /// Rental is in progress.
    #[default]
    Running,
    /// Rental has been closed out.
    Ended,
}

impl RentalStatus {
    /// Storage representation of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Ended => "ended",
        }
    }
}

impl fmt::Display for RentalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RentalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(Self::Running),
            "ended" => Ok(Self::Ended),
            other => Err(format!("unknown rental status `{other}`")),
        }
    }
}

/// One rental of a bike by a user, running or ended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rental {
    /// Database identifier.
    pub id: i64,
    /// Renting user.
    pub user_id: i64,
    /// Rented bike.
    pub bike_id: i64,
    /// Lifecycle state.
    pub rental_status: RentalStatus,
    /// When the rental started.
    pub start_time: DateTime<Utc>,
    /// When the rental ended, if it has.
    pub end_time: Option<DateTime<Utc>>,
    /// Latitude where the rental started.
    pub start_latitude: f64,
    /// Longitude where the rental started.
    pub start_longitude: f64,
    /// Latitude where the rental ended, if it has.
    pub end_latitude: Option<f64>,
    /// Longitude where the rental ended, if it has.
    pub end_longitude: Option<f64>,
    /// Whole-minute duration, set when the rental ends.
    #[serde(rename = "duration")]
    pub duration_minutes: Option<i64>,
    /// Total cost, set when the rental ends.
    pub cost: Option<f64>,
}

impl Default for Rental {
    fn default() -> Self {
        Self {
            id: 0,
            user_id: 0,
            bike_id: 0,
            rental_status: RentalStatus::default(),
            start_time: DateTime::UNIX_EPOCH,
            end_time: None,
            start_latitude: 0.0,
            start_longitude: 0.0,
            end_latitude: None,
            end_longitude: None,
            duration_minutes: None,
            cost: None,
        }
    }
}

impl TableRecord for Rental {
    const TABLE: &'static str = "rentals";

    fn bindings() -> &'static [ColumnBinding<Self>] {
        static BINDINGS: &[ColumnBinding<Rental>] = &[
            ColumnBinding {
                field: "Id",
                nullable: false,
                setter: FieldSetter::Integer(|r, v| r.id = v),
            },
            ColumnBinding {
                field: "UserId",
                nullable: false,
                setter: FieldSetter::Integer(|r, v| r.user_id = v),
            },
            ColumnBinding {
                field: "BikeId",
                nullable: false,
                setter: FieldSetter::Integer(|r, v| r.bike_id = v),
            },
            ColumnBinding {
                field: "RentalStatus",
                nullable: false,
                // The schema CHECK constraint keeps stored values inside the
                // enum grammar; anything else keeps the default.
                setter: FieldSetter::Text(|r, v| {
                    if let Ok(status) = v.parse() {
                        r.rental_status = status;
                    }
                }),
            },
            ColumnBinding {
                field: "StartTime",
                nullable: false,
                setter: FieldSetter::Timestamp(|r, v| r.start_time = v),
            },
            ColumnBinding {
                field: "EndTime",
                nullable: true,
                setter: FieldSetter::Timestamp(|r, v| r.end_time = Some(v)),
            },
            ColumnBinding {
                field: "StartLatitude",
                nullable: false,
                setter: FieldSetter::Float(|r, v| r.start_latitude = v),
            },
            ColumnBinding {
                field: "StartLongitude",
                nullable: false,
                setter: FieldSetter::Float(|r, v| r.start_longitude = v),
            },
            ColumnBinding {
                field: "EndLatitude",
                nullable: true,
                setter: FieldSetter::Float(|r, v| r.end_latitude = Some(v)),
            },
            ColumnBinding {
                field: "EndLongitude",
                nullable: true,
                setter: FieldSetter::Float(|r, v| r.end_longitude = Some(v)),
            },
            ColumnBinding {
                field: "Duration",
                nullable: true,
                setter: FieldSetter::Integer(|r, v| r.duration_minutes = Some(v)),
            },
            ColumnBinding {
                field: "Cost",
                nullable: true,
                setter: FieldSetter::Float(|r, v| r.cost = Some(v)),
            },
        ];
        BINDINGS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::mapper::pascal_case;

    #[test]
    fn rental_status_round_trips_through_storage_form() {
        assert_eq!("running".parse::<RentalStatus>(), Ok(RentalStatus::Running));
        assert_eq!("ended".parse::<RentalStatus>(), Ok(RentalStatus::Ended));
        assert!("paused".parse::<RentalStatus>().is_err());
        assert_eq!(RentalStatus::Running.as_str(), "running");
    }

    #[test]
    fn user_is_serialized_without_password_hash() {
        let user = User {
            id: 1,
            email: "rider@example.com".into(),
            hashed_password: "$2b$12$secret".into(),
            ..User::default()
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret"));
        assert!(!json.contains("hashed_password"));
    }

    #[test]
    fn rental_duration_serializes_under_its_wire_name() {
        let rental = Rental {
            duration_minutes: Some(12),
            ..Rental::default()
        };
        let json = serde_json::to_string(&rental).unwrap();
        assert!(json.contains("\"duration\":12"));
        assert!(!json.contains("duration_minutes"));
    }

    #[test]
    fn binding_tables_cover_every_schema_column() {
        for column in [
            "id",
            "email",
            "hashed_password",
            "first_name",
            "last_name",
            "deleted",
            "created_at",
            "updated_at",
        ] {
            let field = pascal_case(column);
            assert!(
                User::bindings().iter().any(|b| b.field == field),
                "users column {column} has no binding"
            );
        }
        for column in [
            "id",
            "user_id",
            "bike_id",
            "rental_status",
            "start_time",
            "end_time",
            "start_latitude",
            "start_longitude",
            "end_latitude",
            "end_longitude",
            "duration",
            "cost",
        ] {
            let field = pascal_case(column);
            assert!(
                Rental::bindings().iter().any(|b| b.field == field),
                "rentals column {column} has no binding"
            );
        }
    }
}
