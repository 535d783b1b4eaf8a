pub mod events;
pub mod gifts;
pub mod guests;
pub mod messaging;
pub mod photos;
pub mod planning;
pub mod reminders;
pub mod users;
