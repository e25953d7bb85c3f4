use oso::PolarClass;
use serde::{Deserialize, Serialize};

/// Resource standing for the marketplace itself, for actions that are not
/// scoped to a ride.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Platform;

impl PolarClass for Platform {
    fn get_polar_class_builder() -> oso::ClassBuilder<Platform> {
        oso::Class::builder().name("Platform")
    }

    fn get_polar_class() -> oso::Class {
        let builder = Platform::get_polar_class_builder();
        builder.build()
    }
}
