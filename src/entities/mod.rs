pub mod prelude;

pub mod activities;
pub mod medication_reminders;
pub mod medications;
pub mod prescriptions;
