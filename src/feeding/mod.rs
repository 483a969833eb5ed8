//! Feeding: ration sizing, schedule generation, the schedule store, and
//! adherence reporting.

pub mod adherence;
pub mod book;
pub mod ration;
pub mod schedule;
pub mod tier;

pub use adherence::{AdherenceReport, CageAdherence, weekly_adherence};
pub use book::{
    AutoGenerateReport, FeedingSchedule, FeedingSlot, ScheduleBook, ScheduleDraft,
    ScheduleFields, SlotDraft, UpcomingFeeding,
};
pub use schedule::{CalculationMethod, ScheduleSpec, generate_feeding_schedule};
pub use tier::FeedingFrequency;
