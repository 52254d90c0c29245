pub use super::activities::Entity as Activities;
pub use super::medication_reminders::Entity as MedicationReminders;
pub use super::medications::Entity as Medications;
pub use super::prescriptions::Entity as Prescriptions;
