pub mod workout;

pub use workout::{Coords, IdGenerator, Workout, WorkoutId, WorkoutKind, WorkoutType};
