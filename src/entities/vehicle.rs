use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{invalid_input_error, Error};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: Uuid,
    pub user_id: Uuid,
    pub make: String,
    pub model: String,
    pub seats: i16,
    pub created_at: DateTime<Utc>,
}

impl Vehicle {
    pub fn new(user_id: Uuid, make: String, model: String, seats: i16) -> Result<Self, Error> {
        let make = make.trim().to_string();
        let model = model.trim().to_string();

        if make.is_empty() || model.is_empty() || seats < 1 {
            return Err(invalid_input_error());
        }

        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            make,
            model,
            seats,
            created_at: Utc::now(),
        })
    }
}

#[test]
fn vehicle_validation_test() {
    let owner = Uuid::new_v4();

    let vehicle = Vehicle::new(owner, " Mercedes ".into(), "Classe V".into(), 7).unwrap();
    assert_eq!(vehicle.make, "Mercedes");
    assert_eq!(vehicle.user_id, owner);

    assert!(Vehicle::new(owner, "".into(), "Classe E".into(), 4).is_err());
    assert!(Vehicle::new(owner, "Tesla".into(), "Model S".into(), 0).is_err());
}
