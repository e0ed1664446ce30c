#![deny(warnings)]

//! Film geometry: converting piece counts to web metres and planning
//! roll-film lengths under the roll weight limit.

pub mod pitch;
pub mod roll;

pub use pitch::{
    film_plan, pitch_mm, pouches_per_meter, secured_meters, theoretical_meters, FilmPlan, SkuFilm,
};
pub use roll::{
    calculate_roll_weight, distribute_length_evenly, minimum_roll_count, validate_roll_film_params,
};
